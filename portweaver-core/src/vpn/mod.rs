//! VPN port discovery module
//!
//! Finds the forwarded port assigned by the VPN provider and whether the VPN
//! adapter is currently up.

use crate::types::ListenPort;
use std::future::Future;

pub mod interface;
pub mod log_parser;
pub mod port_source;

// Public re-exports
pub use interface::InterfaceScanner;
pub use log_parser::PortPairParser;
pub use port_source::ProtonPortSource;

/// Source of the desired listening port
///
/// Both calls are point-in-time snapshots and never fail: anything that goes
/// wrong is reported as "not connected" or `None`.
pub trait PortSource {
    /// True iff the VPN adapter is administratively and operationally up
    fn is_connected(&self) -> impl Future<Output = bool> + Send;

    /// Most recent forwarded port, if any can be found
    fn current_port(&self) -> impl Future<Output = Option<ListenPort>> + Send;
}
