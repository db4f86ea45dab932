//! portweaver - VPN forwarded port synchronizer
//!
//! Keeps qBittorrent's listening port equal to the port forwarded by the
//! VPN, restarting the client when the port changes.

use clap::{Parser, Subcommand};
use portweaver_core::config::toml_config::{get_config_path, log_path_for};
use portweaver_core::error::PortWeaverError;
use portweaver_core::{init_logging, LoggingOptions};
use std::path::PathBuf;

mod cli;
mod daemon;

#[derive(Parser)]
#[command(name = "portweaver", version)]
#[command(about = "Keep qBittorrent's listening port in sync with the VPN forwarded port")]
struct Cli {
    /// Configuration file (defaults to ~/.config/portweaver/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log debug details
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the synchronizer until interrupted
    Run {
        /// Detach from the terminal and run in the background
        #[arg(long)]
        daemon: bool,
    },
    /// Run a single reconciliation pass and print the outcome
    Check,
    /// Ask the running synchronizer to check the port now
    Trigger,
    /// Show the running synchronizer's update count and last outcome
    Status,
    /// Write the default configuration file
    InitConfig,
}

fn main() {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            let exit_code = match e {
                // Configuration errors (exit code 2)
                PortWeaverError::Config(_) | PortWeaverError::Toml(_) => 2,
                // Runtime errors (exit code 1)
                PortWeaverError::Client(_) | PortWeaverError::Daemon(_) | PortWeaverError::Io(_) => 1,
            };

            eprintln!("{}", e);
            std::process::exit(exit_code);
        }
    }
}

fn run(cli: Cli) -> Result<(), PortWeaverError> {
    let config_path = match cli.config {
        Some(path) => path,
        None => get_config_path()?,
    };
    let log_file = log_path_for(&config_path);

    let mut logging = LoggingOptions {
        log_file: None,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Run { daemon: detach } => {
            // Fork before logging and the async runtime start any threads
            let pid_file = daemon::process::get_default_pid_file();
            let _instance = if detach {
                daemon::process::DaemonProcess::start(pid_file)?
            } else {
                daemon::process::DaemonProcess::hold(pid_file)?
            };

            logging.log_file = Some(log_file.clone());
            start_logging(&logging);
            cli::run::run_service(config_path, log_file)
        }
        Commands::Check => {
            logging.log_file = Some(log_file.clone());
            start_logging(&logging);
            cli::check::run_check(config_path, log_file)
        }
        Commands::Trigger => {
            start_logging(&logging);
            cli::control::run_trigger()
        }
        Commands::Status => {
            start_logging(&logging);
            cli::control::run_status()
        }
        Commands::InitConfig => {
            start_logging(&logging);
            cli::config::run_init_config(&config_path)
        }
    }
}

fn start_logging(options: &LoggingOptions) {
    if let Err(e) = init_logging(options) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(2);
    }
}
