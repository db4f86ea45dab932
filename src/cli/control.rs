//! Commands that talk to a running synchronizer

use crate::daemon::ipc::{get_default_socket_path, IpcClient};
use colored::Colorize;
use portweaver_core::error::PortWeaverError;

/// Ask the running synchronizer to check the port now
pub fn run_trigger() -> Result<(), PortWeaverError> {
    IpcClient::new(get_default_socket_path()).trigger()?;
    println!("{}", "Port check requested".green());
    Ok(())
}

/// Print the running synchronizer's update count and last outcome
pub fn run_status() -> Result<(), PortWeaverError> {
    let status = IpcClient::new(get_default_socket_path()).status()?;

    println!("{} {}", "Port updates:".bold(), status.update_count);
    match status.last_outcome {
        Some(outcome) => println!("{} {}", "Last check:".bold(), outcome),
        None => println!("{} {}", "Last check:".bold(), "pending".dimmed()),
    }
    Ok(())
}
