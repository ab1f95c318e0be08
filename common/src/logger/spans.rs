use tracing::{Span, field};

use super::TraceId;

/// Create a root span for a transition / replan / startup job.
pub fn root_span(name: &'static str, trace_id: &TraceId) -> Span {
    tracing::info_span!(
        "root",
        name = %name,
        trace_id = %trace_id,
        action = field::Empty,
        categories = field::Empty
    )
}

/// Create a child span (inherits trace_id automatically)
pub fn child_span(name: &'static str) -> Span {
    tracing::info_span!("child", name = %name, action = field::Empty)
}

/// Records the flag direction and category count on the current span.
pub fn annotate_span(action: &str, categories: usize) {
    let span = Span::current();
    span.record("action", field::display(action));
    span.record("categories", categories);
}
