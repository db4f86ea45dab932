//! Long-running synchronizer
//!
//! Runs the scheduler and the control socket until SIGINT or SIGTERM.

use crate::daemon::ipc::{get_default_socket_path, IpcServer};
use portweaver_core::error::PortWeaverError;
use portweaver_core::sync::{PortSyncService, Scheduler};
use std::path::PathBuf;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{info, warn};

/// Run the synchronizer in the foreground of the current process
pub fn run_service(config_path: PathBuf, log_file: PathBuf) -> Result<(), PortWeaverError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(serve(config_path, log_file))
}

async fn serve(config_path: PathBuf, log_file: PathBuf) -> Result<(), PortWeaverError> {
    info!(
        config = %config_path.display(),
        log_file = %log_file.display(),
        "Starting portweaver"
    );

    let service = PortSyncService::new(config_path).with_log_file(log_file);
    let scheduler = Scheduler::new(service);
    let handle = scheduler.handle();

    let server = IpcServer::bind(get_default_socket_path(), handle.clone())?;
    let socket_path = server.socket_path().to_path_buf();

    let server_task = tokio::spawn(server.run());
    let mut scheduler_task = tokio::spawn(scheduler.run());

    tokio::select! {
        _ = wait_for_shutdown_signal() => {
            info!("Shutdown requested, waiting for the current pass to finish");
            handle.shutdown();
            if let Err(e) = (&mut scheduler_task).await {
                warn!("Scheduler task failed: {}", e);
            }
        }
        result = &mut scheduler_task => {
            if let Err(e) = result {
                warn!("Scheduler task failed: {}", e);
            }
        }
    }

    server_task.abort();
    let _ = std::fs::remove_file(&socket_path);

    info!("portweaver stopped");
    Ok(())
}

/// Resolve on SIGINT or SIGTERM
async fn wait_for_shutdown_signal() {
    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = terminate.recv() => {}
            }
        }
        Err(e) => {
            warn!("Failed to listen for SIGTERM: {}", e);
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}
