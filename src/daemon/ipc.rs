//! Unix socket IPC for daemon communication
//!
//! Lets other portweaver invocations trigger a pass or read the status of a
//! running synchronizer. Each connection carries one JSON request followed
//! by one JSON response.

use std::io::{Read, Write};
use std::net::Shutdown;
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::time::Duration;

use portweaver_core::error::{DaemonError, PortWeaverError};
use portweaver_core::sync::SchedulerHandle;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixListener;
use tracing::{debug, info, warn};

/// Largest request the server reads from one connection
const MAX_REQUEST_BYTES: u64 = 64 * 1024;

/// How long a peer may take to send its request and half-close
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// IPC message types
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum IpcMessage {
    /// Request an immediate reconciliation pass
    TriggerRequest,
    /// The pass has been queued
    TriggerResponse,
    /// Request the current status
    StatusRequest,
    /// Current status of the synchronizer
    StatusResponse {
        update_count: u64,
        last_outcome: Option<String>,
    },
}

/// Status reported by a running synchronizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonStatus {
    pub update_count: u64,
    pub last_outcome: Option<String>,
}

/// IPC client for communicating with daemon
pub struct IpcClient {
    socket_path: PathBuf,
}

impl IpcClient {
    /// Create a new IPC client
    pub fn new(socket_path: PathBuf) -> Self {
        Self { socket_path }
    }

    /// Send a message and receive a response
    fn send_message(&self, message: &IpcMessage) -> Result<IpcMessage, PortWeaverError> {
        let mut stream =
            UnixStream::connect(&self.socket_path).map_err(|_| DaemonError::NotRunning {
                socket: self.socket_path.display().to_string(),
            })?;

        // Serialize and send message
        let message_data = serde_json::to_vec(message).map_err(|e| DaemonError::Ipc {
            reason: format!("Failed to serialize message: {}", e),
        })?;

        stream.write_all(&message_data).map_err(|e| DaemonError::Ipc {
            reason: format!("Failed to send message: {}", e),
        })?;

        // Signal end of request so the server can stop reading
        stream.shutdown(Shutdown::Write).map_err(|e| DaemonError::Ipc {
            reason: format!("Failed to finish message: {}", e),
        })?;

        // Read response
        let mut buffer = Vec::new();
        stream.read_to_end(&mut buffer).map_err(|e| DaemonError::Ipc {
            reason: format!("Failed to read response: {}", e),
        })?;

        let response: IpcMessage = serde_json::from_slice(&buffer).map_err(|e| DaemonError::Ipc {
            reason: format!("Failed to deserialize response: {}", e),
        })?;

        Ok(response)
    }

    /// Ask the daemon to run a pass now
    pub fn trigger(&self) -> Result<(), PortWeaverError> {
        match self.send_message(&IpcMessage::TriggerRequest)? {
            IpcMessage::TriggerResponse => Ok(()),
            _ => Err(DaemonError::Ipc {
                reason: "Unexpected response to trigger request".to_string(),
            }
            .into()),
        }
    }

    /// Get the daemon's update count and last outcome
    pub fn status(&self) -> Result<DaemonStatus, PortWeaverError> {
        match self.send_message(&IpcMessage::StatusRequest)? {
            IpcMessage::StatusResponse {
                update_count,
                last_outcome,
            } => Ok(DaemonStatus {
                update_count,
                last_outcome,
            }),
            _ => Err(DaemonError::Ipc {
                reason: "Unexpected response to status request".to_string(),
            }
            .into()),
        }
    }
}

/// IPC server for the daemon to listen for commands
pub struct IpcServer {
    listener: UnixListener,
    socket_path: PathBuf,
    handle: SchedulerHandle,
}

impl IpcServer {
    /// Bind the control socket, replacing a stale one
    ///
    /// Fails if another instance still answers on the socket. Must be called
    /// from within a tokio runtime.
    pub fn bind(socket_path: PathBuf, handle: SchedulerHandle) -> Result<Self, PortWeaverError> {
        if UnixStream::connect(&socket_path).is_ok() {
            return Err(DaemonError::SocketInUse {
                socket: socket_path.display().to_string(),
            }
            .into());
        }

        // Nobody is listening, so a leftover socket file is stale
        let _ = std::fs::remove_file(&socket_path);

        let listener = UnixListener::bind(&socket_path).map_err(|e| DaemonError::Ipc {
            reason: format!("Failed to bind IPC socket {}: {}", socket_path.display(), e),
        })?;

        info!("Listening for commands on {}", socket_path.display());
        Ok(Self {
            listener,
            socket_path,
            handle,
        })
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Accept connections until the task is dropped
    pub async fn run(self) {
        loop {
            match self.listener.accept().await {
                Ok((stream, _)) => {
                    let handle = self.handle.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, &handle).await {
                            warn!("IPC connection error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    warn!("IPC accept error: {}", e);
                    // Continue listening
                }
            }
        }
    }
}

/// Handle a single IPC connection
async fn handle_connection(
    mut stream: tokio::net::UnixStream,
    handle: &SchedulerHandle,
) -> Result<(), DaemonError> {
    let mut buffer = Vec::new();
    let mut limited = (&mut stream).take(MAX_REQUEST_BYTES + 1);
    let read = limited.read_to_end(&mut buffer);

    match tokio::time::timeout(REQUEST_TIMEOUT, read).await {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => {
            return Err(DaemonError::Ipc {
                reason: format!("Failed to read IPC message: {}", e),
            })
        }
        Err(_) => {
            return Err(DaemonError::Ipc {
                reason: "Timed out waiting for IPC message".to_string(),
            })
        }
    }

    if buffer.len() as u64 > MAX_REQUEST_BYTES {
        return Err(DaemonError::Ipc {
            reason: format!("IPC message exceeds {} bytes", MAX_REQUEST_BYTES),
        });
    }

    // Liveness checks connect and close without sending anything
    if buffer.is_empty() {
        debug!("IPC peer closed without a request");
        return Ok(());
    }

    let message: IpcMessage = serde_json::from_slice(&buffer).map_err(|e| DaemonError::Ipc {
        reason: format!("Failed to deserialize IPC message: {}", e),
    })?;

    let response = respond(message, handle)?;

    let response_data = serde_json::to_vec(&response).map_err(|e| DaemonError::Ipc {
        reason: format!("Failed to serialize response: {}", e),
    })?;

    stream
        .write_all(&response_data)
        .await
        .map_err(|e| DaemonError::Ipc {
            reason: format!("Failed to send response: {}", e),
        })?;

    stream.shutdown().await.map_err(|e| DaemonError::Ipc {
        reason: format!("Failed to flush response: {}", e),
    })
}

/// Answer one request against the scheduler
fn respond(message: IpcMessage, handle: &SchedulerHandle) -> Result<IpcMessage, DaemonError> {
    match message {
        IpcMessage::TriggerRequest => {
            debug!("Manual trigger requested over IPC");
            handle.trigger();
            Ok(IpcMessage::TriggerResponse)
        }
        IpcMessage::StatusRequest => Ok(IpcMessage::StatusResponse {
            update_count: handle.update_count(),
            last_outcome: handle.last_outcome().map(|outcome| outcome.to_string()),
        }),
        _ => Err(DaemonError::Ipc {
            reason: "Unknown IPC message type".to_string(),
        }),
    }
}

/// Get the default socket path
pub fn get_default_socket_path() -> PathBuf {
    // Use XDG_RUNTIME_DIR if available, otherwise /tmp
    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
        Path::new(&runtime_dir).join("portweaver.sock")
    } else {
        Path::new("/tmp").join(format!("portweaver-{}.sock", nix::unistd::getuid()))
    }
}
