//! Proton VPN port source
//!
//! Combines the adapter scan with a backward scan of the VPN client log.

use crate::config::VpnSettings;
use crate::types::ListenPort;
use crate::vpn::{InterfaceScanner, PortPairParser, PortSource};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tokio::task;
use tracing::{debug, warn};

/// Reads the forwarded port from the Proton VPN client log
pub struct ProtonPortSource {
    log_path: PathBuf,
    scanner: InterfaceScanner,
    parser: PortPairParser,
}

impl ProtonPortSource {
    pub fn new(log_path: PathBuf, scanner: InterfaceScanner) -> Self {
        Self {
            log_path,
            scanner,
            parser: PortPairParser::new(),
        }
    }

    /// Port source for the live system, built from VPN settings
    pub fn from_settings(settings: &VpnSettings) -> Self {
        Self::new(
            settings.log_path.clone(),
            InterfaceScanner::new(&settings.interface_token),
        )
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Read the whole log and return the latest forwarded port
    ///
    /// Blocking; the async [`PortSource`] calls run this on the blocking pool.
    pub fn read_forwarded_port(&self) -> std::io::Result<Option<ListenPort>> {
        read_latest_port(&self.log_path, &self.parser)
    }
}

/// The VPN client keeps appending to this file, so it is opened read-only
/// and read in one go; invalid UTF-8 is replaced rather than rejected.
fn read_latest_port(log_path: &Path, parser: &PortPairParser) -> std::io::Result<Option<ListenPort>> {
    let mut file = File::open(log_path)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;

    let contents = String::from_utf8_lossy(&bytes);
    Ok(parser.find_latest(&contents))
}

impl PortSource for ProtonPortSource {
    async fn is_connected(&self) -> bool {
        let scanner = self.scanner.clone();
        match task::spawn_blocking(move || scanner.status()).await {
            Ok(status) => status.is_connected(),
            Err(e) => {
                warn!("Adapter scan task failed: {}", e);
                false
            }
        }
    }

    async fn current_port(&self) -> Option<ListenPort> {
        if self.log_path.as_os_str().is_empty() {
            return None;
        }

        let log_path = self.log_path.clone();
        let parser = self.parser.clone();
        let result = task::spawn_blocking(move || read_latest_port(&log_path, &parser)).await;

        match result {
            Ok(Ok(port)) => port,
            Ok(Err(e)) => {
                debug!(path = %self.log_path.display(), "Cannot read VPN log: {}", e);
                None
            }
            Err(e) => {
                warn!("VPN log scan task failed: {}", e);
                None
            }
        }
    }
}
