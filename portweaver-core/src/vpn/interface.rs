//! Network adapter state via sysfs
//!
//! Reads `/sys/class/net/<iface>/{flags,operstate}` to decide whether the VPN
//! adapter is up. This is a snapshot taken on every call.

use crate::types::VpnStatus;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default sysfs directory listing network interfaces
const SYSFS_NET_ROOT: &str = "/sys/class/net";

/// State of one network adapter as reported by the kernel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterState {
    pub name: String,
    /// IFF_UP: the adapter was brought up administratively
    pub admin_up: bool,
    /// Carrier present (operstate `up`, or `unknown` with IFF_RUNNING for tun devices)
    pub oper_up: bool,
}

impl AdapterState {
    pub fn is_up(&self) -> bool {
        self.admin_up && self.oper_up
    }
}

/// Enumerates network adapters and matches them by name token
#[derive(Debug, Clone)]
pub struct InterfaceScanner {
    root: PathBuf,
    token: String,
}

impl InterfaceScanner {
    /// Scanner over the live `/sys/class/net`
    pub fn new(token: &str) -> Self {
        Self::with_root(SYSFS_NET_ROOT, token)
    }

    /// Scanner over an arbitrary sysfs-like directory
    pub fn with_root<P: AsRef<Path>>(root: P, token: &str) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            token: token.to_lowercase(),
        }
    }

    /// All adapters whose name contains the token, case-insensitively
    pub fn matching_adapters(&self) -> Vec<AdapterState> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(root = %self.root.display(), "Cannot enumerate network adapters: {}", e);
                return Vec::new();
            }
        };

        entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name.to_lowercase().contains(&self.token))
            .map(|name| self.read_adapter(name))
            .collect()
    }

    /// Connected iff any matching adapter is up
    pub fn status(&self) -> VpnStatus {
        let adapters = self.matching_adapters();
        debug!(token = %self.token, adapters = ?adapters, "Scanned VPN adapters");
        VpnStatus::from(adapters.iter().any(AdapterState::is_up))
    }

    fn read_adapter(&self, name: String) -> AdapterState {
        let dir = self.root.join(&name);

        let flags = std::fs::read_to_string(dir.join("flags"))
            .ok()
            .and_then(|raw| parse_flags(&raw))
            .unwrap_or(0);
        let operstate = std::fs::read_to_string(dir.join("operstate"))
            .map(|raw| raw.trim().to_lowercase())
            .unwrap_or_default();

        let running = (flags & libc::IFF_RUNNING as u32) != 0;
        let oper_up = operstate == "up" || (operstate == "unknown" && running);

        AdapterState {
            name,
            admin_up: (flags & libc::IFF_UP as u32) != 0,
            oper_up,
        }
    }
}

/// Parse the hexadecimal `flags` file, e.g. `0x1091`
fn parse_flags(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    let hex = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .unwrap_or(raw);
    u32::from_str_radix(hex, 16).ok()
}
