//! BitTorrent client control module
//!
//! Talks to the qBittorrent Web API and manages the client process.

use crate::error::ClientError;
use crate::types::ListenPort;
use std::future::Future;

pub mod process;
pub mod session;

// Public re-exports
pub use process::{ClientProcess, RestartTimings};
pub use session::{parse_listen_port, QbittorrentSession};

/// Operations the reconciler needs from the BitTorrent client
///
/// Every port operation re-authenticates first; the session cookie is never
/// trusted to have survived since the previous call.
pub trait TorrentClient {
    /// Whether a client process is currently alive
    fn is_running(&self) -> impl Future<Output = bool> + Send;

    /// Log in to the Web API, establishing a session cookie
    fn authenticate(&self) -> impl Future<Output = Result<(), ClientError>> + Send;

    /// Read the configured listening port
    fn get_port(&self) -> impl Future<Output = Result<ListenPort, ClientError>> + Send;

    /// Write a new listening port
    fn set_port(&self, port: ListenPort) -> impl Future<Output = Result<(), ClientError>> + Send;

    /// Kill and relaunch the client, succeeding iff it is alive afterwards
    fn restart(&self) -> impl Future<Output = Result<(), ClientError>> + Send;
}
