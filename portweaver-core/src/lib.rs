//! Core library for the portweaver port synchronizer
//!
//! This crate discovers the port forwarded by the VPN, compares it with the
//! BitTorrent client's listening port and reconciles the two on a schedule.

pub mod error;
pub mod types;

pub mod client;
pub mod config;
pub mod logging;
pub mod sync;
pub mod vpn;

use std::path::PathBuf;

/// Options for [`init_logging`]
#[derive(Debug, Clone, Default)]
pub struct LoggingOptions {
    /// Also append events to this file
    pub log_file: Option<PathBuf>,
    /// Include debug events
    pub verbose: bool,
}

/// Initialize logging infrastructure
///
/// Sets up tracing with systemd journal logging when running under systemd.
/// Otherwise logs to stderr. A configured log file receives every event in
/// addition to the primary sink.
pub fn init_logging(options: &LoggingOptions) -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::filter::LevelFilter;
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = if options.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    // Try to use systemd journal logging if available
    #[cfg(target_os = "linux")]
    {
        if std::env::var("JOURNAL_STREAM").is_ok() {
            let journal_layer = tracing_journald::layer()?;
            tracing_subscriber::registry()
                .with(journal_layer)
                .with(options.log_file.clone().map(logging::file_layer))
                .with(level)
                .try_init()?;
            return Ok(());
        }
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(options.log_file.clone().map(logging::file_layer))
        .with(level)
        .try_init()?;

    Ok(())
}
