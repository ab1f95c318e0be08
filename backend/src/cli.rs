use catalog::{CategoryId, CategorySet};
use clap::{Parser, Subcommand};

use crate::settings::Configuration;

#[derive(Debug, Parser)]
#[clap(name = "purchase-window", version)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the scheduler until ctrl-c
    Serve,

    /// Replace the stored configuration and replan
    Configure {
        /// Window start, local store time (YYYY-MM-DDTHH:MM)
        #[clap(long)]
        start: Option<String>,

        /// Window end, local store time (YYYY-MM-DDTHH:MM)
        #[clap(long)]
        end: Option<String>,

        /// Category ids (comma-separated)
        #[clap(long, value_delimiter = ',')]
        categories: Vec<u64>,

        /// Enable the activity log
        #[clap(long)]
        logging: bool,
    },

    /// Make the configured categories purchasable now
    ActivateNow,

    /// Make the configured categories unpurchasable now
    DeactivateNow,

    /// Print the configuration, or one item's effective state
    Status {
        #[clap(long)]
        item: Option<u64>,
    },
}

/// Build the configuration a `configure` invocation describes.
pub fn configuration_from_args(
    start: Option<String>,
    end: Option<String>,
    categories: &[u64],
    logging: bool,
) -> Configuration {
    Configuration {
        start,
        end,
        categories: categories.iter().copied().map(CategoryId).collect::<CategorySet>(),
        logging_enabled: logging,
    }
}
