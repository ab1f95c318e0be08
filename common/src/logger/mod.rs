mod init;
mod spans;
mod trace_id;

pub use init::init_logger;
pub use spans::{annotate_span, child_span, root_span};
pub use trace_id::TraceId;
