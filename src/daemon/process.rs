//! Daemon process management
//!
//! Handles detaching from the terminal, PID file management and the
//! single-instance check.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use daemonize::Daemonize;
use tracing::info;

use portweaver_core::error::{DaemonError, PortWeaverError};

/// A detached portweaver process owning its PID file
///
/// The PID file is removed when the value is dropped.
pub struct DaemonProcess {
    pid_file: PathBuf,
}

impl DaemonProcess {
    fn new(pid_file: PathBuf) -> Self {
        Self { pid_file }
    }

    /// Detach the current process unless another instance is alive
    pub fn start(pid_file: PathBuf) -> Result<Self, PortWeaverError> {
        let daemon = Self::claim(pid_file)?;
        daemon.daemonize()?;
        Ok(daemon)
    }

    /// Record the current foreground process unless another instance is alive
    pub fn hold(pid_file: PathBuf) -> Result<Self, PortWeaverError> {
        let daemon = Self::claim(pid_file)?;
        daemon.write_pid()?;
        Ok(daemon)
    }

    fn claim(pid_file: PathBuf) -> Result<Self, DaemonError> {
        let daemon = Self::new(pid_file);

        if let Some(pid) = daemon.running_pid()? {
            // Do not let Drop remove the other instance's PID file
            std::mem::forget(daemon);
            return Err(DaemonError::AlreadyRunning { pid });
        }

        Ok(daemon)
    }

    fn write_pid(&self) -> Result<(), DaemonError> {
        if let Some(parent) = self.pid_file.parent() {
            fs::create_dir_all(parent).map_err(|e| DaemonError::PidFile {
                reason: format!("Failed to create PID file directory: {}", e),
            })?;
        }

        fs::write(&self.pid_file, format!("{}\n", process::id())).map_err(|e| {
            DaemonError::PidFile {
                reason: format!("Failed to write PID file: {}", e),
            }
        })
    }

    /// PID of a live process recorded in the PID file
    ///
    /// A PID file pointing at a dead process is stale and gets removed.
    fn running_pid(&self) -> Result<Option<i32>, DaemonError> {
        if !self.pid_file.exists() {
            return Ok(None);
        }

        let pid = read_pid(&self.pid_file)?;

        // Check if process is running
        match nix::unistd::getpgid(Some(nix::unistd::Pid::from_raw(pid))) {
            Ok(_) => Ok(Some(pid)),
            Err(nix::errno::Errno::ESRCH) => {
                // Process doesn't exist, clean up PID file
                let _ = fs::remove_file(&self.pid_file);
                Ok(None)
            }
            Err(e) => Err(DaemonError::PidFile {
                reason: format!("Failed to check process status: {}", e),
            }),
        }
    }

    /// Daemonize the current process
    fn daemonize(&self) -> Result<(), DaemonError> {
        // Ensure PID file directory exists
        if let Some(parent) = self.pid_file.parent() {
            fs::create_dir_all(parent).map_err(|e| DaemonError::PidFile {
                reason: format!("Failed to create PID file directory: {}", e),
            })?;
        }

        let working_directory =
            std::env::current_dir().map_err(|e| DaemonError::DaemonizeFailed {
                reason: format!("Failed to get current directory: {}", e),
            })?;

        let daemonize = Daemonize::new()
            .pid_file(&self.pid_file)
            .chown_pid_file(true)
            .working_directory(working_directory)
            .umask(0o027); // Restrictive permissions

        daemonize.start().map_err(|e| DaemonError::DaemonizeFailed {
            reason: e.to_string(),
        })?;

        info!("Successfully daemonized process, PID: {}", process::id());
        Ok(())
    }
}

impl Drop for DaemonProcess {
    fn drop(&mut self) {
        // Clean up PID file if it exists
        let _ = fs::remove_file(&self.pid_file);
    }
}

fn read_pid(pid_file: &Path) -> Result<i32, DaemonError> {
    let pid_content = fs::read_to_string(pid_file).map_err(|e| DaemonError::PidFile {
        reason: format!("Failed to read PID file: {}", e),
    })?;

    pid_content.trim().parse().map_err(|_| DaemonError::PidFile {
        reason: "Invalid PID in PID file".to_string(),
    })
}

/// Get the default PID file path
pub fn get_default_pid_file() -> PathBuf {
    // Use XDG_RUNTIME_DIR if available, otherwise /tmp
    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
        Path::new(&runtime_dir).join("portweaver.pid")
    } else {
        Path::new("/tmp").join(format!("portweaver-{}.pid", nix::unistd::getuid()))
    }
}
