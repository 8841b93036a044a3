//! Command-line interface definitions for newsdesk.
//!
//! The pipeline is configured through the environment (see [`crate::config`]);
//! the CLI only carries operational overrides useful when running by hand.

use clap::Parser;

/// Command-line arguments for the newsdesk daemon.
///
/// # Examples
///
/// ```sh
/// # Run on the default 10-minute interval
/// newsdesk
///
/// # Single pass and exit (cron-friendly)
/// newsdesk --once
///
/// # Shorter interval, alternate store file
/// newsdesk --interval-secs 120 --store /var/lib/newsdesk/store.json
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Run a single pipeline pass and exit instead of looping on the timer
    #[arg(long)]
    pub once: bool,

    /// Seconds between scheduled runs
    #[arg(long, env = "NEWSDESK_INTERVAL_SECS", default_value_t = 600)]
    pub interval_secs: u64,

    /// Override the article store path
    #[arg(long, env = "NEWSDESK_STORE_PATH")]
    pub store: Option<String>,
}
