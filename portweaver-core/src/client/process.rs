//! BitTorrent client process management
//!
//! Finds client processes by name, terminates them, and relaunches the
//! client executable.

use crate::error::ClientError;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Fixed waits used while restarting the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartTimings {
    /// Wait after killing, so the OS releases the listening socket
    pub kill_settle: Duration,
    /// Wait after launching, before checking liveness
    pub startup_settle: Duration,
}

impl Default for RestartTimings {
    fn default() -> Self {
        Self {
            kill_settle: Duration::from_secs(2),
            startup_settle: Duration::from_secs(1),
        }
    }
}

/// Client process identified by name, with the executable to relaunch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientProcess {
    name: String,
    exe_path: PathBuf,
    timings: RestartTimings,
}

impl ClientProcess {
    pub fn new(name: String, exe_path: PathBuf) -> Self {
        Self {
            name,
            exe_path,
            timings: RestartTimings::default(),
        }
    }

    /// Override the restart settle timings
    pub fn with_timings(mut self, timings: RestartTimings) -> Self {
        self.timings = timings;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// PIDs of all processes whose name is exactly the configured name
    ///
    /// Uses `pgrep -x`; no name or no match yields an empty list.
    pub async fn find_pids(&self) -> Vec<u32> {
        if self.name.is_empty() {
            return Vec::new();
        }

        let output = match Command::new("pgrep").arg("-x").arg(&self.name).output().await {
            Ok(output) => output,
            Err(e) => {
                warn!("Failed to search for {} processes: {}", self.name, e);
                return Vec::new();
            }
        };

        if !output.status.success() {
            // pgrep returns non-zero when nothing matches
            return Vec::new();
        }

        String::from_utf8_lossy(&output.stdout)
            .lines()
            .filter_map(|line| line.trim().parse().ok())
            .collect()
    }

    /// Whether at least one process with the configured name is alive
    pub async fn is_running(&self) -> bool {
        !self.find_pids().await.is_empty()
    }

    /// Send SIGKILL to every matching process
    ///
    /// Best effort: a failure on one PID is logged and the others are still
    /// killed. Returns the number of processes that are gone.
    pub async fn terminate_all(&self) -> usize {
        use nix::errno::Errno;
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        let pids = self.find_pids().await;
        let mut terminated = 0;

        for pid in pids {
            match kill(Pid::from_raw(pid as i32), Signal::SIGKILL) {
                Ok(()) => {
                    debug!("Sent SIGKILL to {} process {}", self.name, pid);
                    terminated += 1;
                }
                Err(Errno::ESRCH) => {
                    debug!("Process {} already terminated", pid);
                    terminated += 1;
                }
                Err(e) => {
                    warn!("Failed to kill {} process {}: {}", self.name, pid, e);
                }
            }
        }

        terminated
    }

    /// Resolve the executable, looking bare names up in PATH
    fn resolve_executable(&self) -> Result<PathBuf, ClientError> {
        if self.exe_path.as_os_str().is_empty() {
            return Err(ClientError::LaunchFailed {
                path: String::new(),
                reason: "no executable path configured".to_string(),
            });
        }

        let is_bare_name = self.exe_path.components().count() == 1 && !self.exe_path.is_absolute();
        if is_bare_name {
            return which::which(&self.exe_path).map_err(|e| ClientError::LaunchFailed {
                path: self.exe_path.display().to_string(),
                reason: e.to_string(),
            });
        }

        Ok(self.exe_path.clone())
    }

    /// Launch the client detached from our process group
    ///
    /// The working directory is the executable's own directory. The child is
    /// reaped in the background so it never lingers as a zombie.
    pub fn launch(&self) -> Result<u32, ClientError> {
        let exe = self.resolve_executable()?;
        let working_dir = exe
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let mut child = Command::new(&exe)
            .current_dir(&working_dir)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .process_group(0)
            .spawn()
            .map_err(|e| ClientError::LaunchFailed {
                path: exe.display().to_string(),
                reason: e.to_string(),
            })?;

        let pid = child.id().unwrap_or_default();
        tokio::spawn(async move {
            let _ = child.wait().await;
        });

        info!("Launched {} (PID {})", exe.display(), pid);
        Ok(pid)
    }

    /// Kill every client process, relaunch, and confirm liveness
    ///
    /// Success means "a process with the configured name is running after
    /// the settle time", not "the launched child is still alive".
    pub async fn restart(&self) -> Result<(), ClientError> {
        let terminated = self.terminate_all().await;
        debug!("Terminated {} {} process(es)", terminated, self.name);

        sleep(self.timings.kill_settle).await;

        self.launch()?;

        sleep(self.timings.startup_settle).await;

        if self.is_running().await {
            Ok(())
        } else {
            Err(ClientError::NotRunningAfterRestart {
                name: self.name.clone(),
            })
        }
    }
}
