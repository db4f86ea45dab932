//! Error types for portweaver
//!
//! This module defines all error types used throughout the application.
//! Faults inside a reconciliation pass never surface as `PortWeaverError`;
//! they are folded into a [`SkipReason`] and logged instead.

use thiserror::Error;

/// Main error type for the portweaver application
#[derive(Error, Debug)]
pub enum PortWeaverError {
    /// Errors related to configuration loading/parsing
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Errors raised by the BitTorrent client session
    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    /// Errors related to the background daemon and its control socket
    #[error("Daemon error: {0}")]
    Daemon(#[from] DaemonError),

    /// Generic I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing errors
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    NotFound { path: String },

    #[error("Failed to save configuration file: {path}")]
    SaveFailed { path: String },

    #[error("Configuration validation error: {message}")]
    ValidationError { message: String },

    #[error("I/O error: {message}")]
    IoError { message: String },
}

/// BitTorrent client Web API and process errors
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Invalid client URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP client creation failed: {0}")]
    ClientCreationFailed(#[from] reqwest::Error),

    #[error("Request failed: {reason}")]
    Transport { reason: String },

    #[error("Unexpected HTTP status {status} from {endpoint}")]
    UnexpectedStatus { endpoint: String, status: u16 },

    #[error("Authentication rejected with HTTP status {status}")]
    AuthenticationFailed { status: u16 },

    #[error("listen_port missing or not numeric in preferences")]
    InvalidPreferences { body: String },

    #[error("Failed to launch client executable {path}: {reason}")]
    LaunchFailed { path: String, reason: String },

    #[error("Client process {name} is not running after restart")]
    NotRunningAfterRestart { name: String },
}

/// Daemon lifecycle and IPC errors
#[derive(Error, Debug)]
pub enum DaemonError {
    #[error("No running portweaver daemon found at {socket}")]
    NotRunning { socket: String },

    #[error("portweaver is already running with PID {pid}")]
    AlreadyRunning { pid: i32 },

    #[error("Another portweaver instance is listening on {socket}")]
    SocketInUse { socket: String },

    #[error("IPC failure: {reason}")]
    Ipc { reason: String },

    #[error("Failed to daemonize: {reason}")]
    DaemonizeFailed { reason: String },

    #[error("PID file error: {reason}")]
    PidFile { reason: String },
}

/// Why a reconciliation pass ended before reaching a decision
///
/// Every variant is a soft failure: the pass is logged at ERROR and the
/// scheduler moves on to the next wait.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    #[error("VPN is not connected")]
    ConnectivityUnavailable,

    #[error("Could not determine the VPN forwarded port")]
    PortNotDiscoverable,

    #[error("BitTorrent client is not running")]
    ClientNotRunning,

    #[error("Could not determine the client's current listening port")]
    ClientPortUnreadable,

    #[error("Failed to set the client's listening port to {port}")]
    ClientPortWriteFailed { port: u16 },

    #[error("Listening port set to {port} but the client failed to restart")]
    ClientRestartFailed { port: u16 },

    #[error("Configuration unavailable: {reason}")]
    ConfigurationUnavailable { reason: String },
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, PortWeaverError>;
