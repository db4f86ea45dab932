//! Single foreground reconciliation pass

use crate::daemon::ipc::{get_default_socket_path, IpcClient};
use colored::Colorize;
use portweaver_core::error::{DaemonError, PortWeaverError};
use portweaver_core::sync::{PortSyncService, ReconciliationOutcome};
use std::path::PathBuf;

/// Run one pass now and print what it did
///
/// If a synchronizer is already running, the pass is handed to it instead so
/// two processes never drive the client at once.
pub fn run_check(config_path: PathBuf, log_file: PathBuf) -> Result<(), PortWeaverError> {
    if forward_trigger(get_default_socket_path())? {
        println!(
            "{} the running synchronizer will check the port now (see `portweaver status`)",
            "Forwarded:".bold()
        );
        return Ok(());
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let mut service = PortSyncService::new(config_path).with_log_file(log_file);
    let report = runtime.block_on(service.run_once());

    let summary = report.outcome.to_string();
    let line = match report.outcome {
        ReconciliationOutcome::NoChangeNeeded { .. } => summary.green(),
        ReconciliationOutcome::PortUpdated { .. }
        | ReconciliationOutcome::PortUpdatedAndRestarted { .. } => summary.yellow(),
        ReconciliationOutcome::Skipped(_) => summary.red(),
    };

    println!("{} {}", "Outcome:".bold(), line);
    println!(
        "Next scheduled check in {} seconds (config: {})",
        report.next_interval.as_secs(),
        service.config_path().display()
    );
    Ok(())
}

/// Trigger the running synchronizer, if any answers on the socket
fn forward_trigger(socket_path: PathBuf) -> Result<bool, PortWeaverError> {
    match IpcClient::new(socket_path).trigger() {
        Ok(()) => Ok(true),
        Err(PortWeaverError::Daemon(DaemonError::NotRunning { .. })) => Ok(false),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::daemon::ipc::IpcServer;
    use portweaver_core::sync::{PassReport, ReconcilePass, Scheduler};
    use std::time::Duration;
    use tempfile::tempdir;

    struct Idle;

    impl ReconcilePass for Idle {
        async fn run_pass(&mut self) -> PassReport {
            PassReport {
                outcome: ReconciliationOutcome::Skipped(
                    portweaver_core::error::SkipReason::ConnectivityUnavailable,
                ),
                next_interval: Duration::from_secs(3600),
            }
        }
    }

    #[test]
    fn test_no_running_instance_runs_locally() {
        let temp_dir = tempdir().unwrap();
        assert!(!forward_trigger(temp_dir.path().join("portweaver.sock")).unwrap());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_running_instance_receives_the_pass() {
        let temp_dir = tempdir().unwrap();
        let socket_path = temp_dir.path().join("portweaver.sock");

        let scheduler = Scheduler::new(Idle);
        let server = IpcServer::bind(socket_path.clone(), scheduler.handle()).unwrap();
        let server_task = tokio::spawn(server.run());

        let forwarded = tokio::task::spawn_blocking(move || forward_trigger(socket_path))
            .await
            .unwrap();
        assert!(forwarded.unwrap());

        server_task.abort();
    }
}
