//! Type definitions shared across the reconciliation engine
//!
//! Ports are validated once at the boundary so the rest of the engine only
//! ever handles values in 1-65535. Credentials wrap the Web API password in
//! `secrecy` so it never shows up in logs or debug output.

use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A TCP/UDP port number in the range 1-65535
///
/// Used both for the VPN forwarded port and for the client's listening port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ListenPort(u16);

impl ListenPort {
    /// Create a port, rejecting zero
    pub fn new(port: u16) -> Option<Self> {
        if port == 0 {
            None
        } else {
            Some(Self(port))
        }
    }

    /// Create a port from any integer, rejecting values outside 1-65535
    pub fn from_i64(value: i64) -> Option<Self> {
        u16::try_from(value).ok().and_then(Self::new)
    }

    /// Parse a decimal port, tolerating surrounding whitespace
    pub fn parse(value: &str) -> Option<Self> {
        value.trim().parse::<i64>().ok().and_then(Self::from_i64)
    }

    /// The raw port number
    pub fn get(self) -> u16 {
        self.0
    }
}

impl fmt::Display for ListenPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Point-in-time VPN connectivity derived from adapter enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VpnStatus {
    Connected,
    #[default]
    Disconnected,
}

impl VpnStatus {
    pub fn is_connected(self) -> bool {
        matches!(self, VpnStatus::Connected)
    }
}

impl From<bool> for VpnStatus {
    fn from(connected: bool) -> Self {
        if connected {
            VpnStatus::Connected
        } else {
            VpnStatus::Disconnected
        }
    }
}

/// Web API login credentials
#[derive(Clone, Debug)]
pub struct Credentials {
    username: String,
    password: Secret<String>,
}

impl Credentials {
    pub fn new(username: String, password: String) -> Self {
        Self {
            username,
            password: Secret::new(password),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Expose the password value (use with caution!)
    ///
    /// Only the login form should ever need this.
    pub fn expose_password(&self) -> &str {
        self.password.expose_secret()
    }
}

impl PartialEq for Credentials {
    fn eq(&self, other: &Self) -> bool {
        self.username == other.username
            && self.password.expose_secret() == other.password.expose_secret()
    }
}

impl Eq for Credentials {}
