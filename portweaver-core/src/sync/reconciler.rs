//! One reconciliation pass
//!
//! Steps run strictly in order and each one can end the pass early:
//! connectivity, desired port, client liveness, current port, compare,
//! update, optional restart. There is no retry inside a pass; the next
//! scheduled pass is the retry.

use crate::client::TorrentClient;
use crate::error::SkipReason;
use crate::types::ListenPort;
use crate::vpn::PortSource;
use std::fmt;
use tracing::{error, info};

/// Result of a single reconciliation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconciliationOutcome {
    /// Client already listens on the forwarded port
    NoChangeNeeded { port: ListenPort },
    /// Port written, restart disabled
    PortUpdated { from: ListenPort, to: ListenPort },
    /// Port written and client restarted
    PortUpdatedAndRestarted { from: ListenPort, to: ListenPort },
    /// Pass ended early
    Skipped(SkipReason),
}

impl ReconciliationOutcome {
    /// Whether the client's port was changed during this pass
    ///
    /// A failed restart still counts: the port had already been written.
    pub fn changed_port(&self) -> bool {
        matches!(
            self,
            ReconciliationOutcome::PortUpdated { .. }
                | ReconciliationOutcome::PortUpdatedAndRestarted { .. }
                | ReconciliationOutcome::Skipped(SkipReason::ClientRestartFailed { .. })
        )
    }
}

impl fmt::Display for ReconciliationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconciliationOutcome::NoChangeNeeded { port } => {
                write!(f, "ports match ({}), no update needed", port)
            }
            ReconciliationOutcome::PortUpdated { from, to } => {
                write!(f, "port updated from {} to {}", from, to)
            }
            ReconciliationOutcome::PortUpdatedAndRestarted { from, to } => {
                write!(f, "port updated from {} to {} and client restarted", from, to)
            }
            ReconciliationOutcome::Skipped(reason) => write!(f, "skipped: {}", reason),
        }
    }
}

/// Drives one pass against a port source and a client
#[derive(Debug, Clone, Copy)]
pub struct Reconciler {
    restart_on_change: bool,
}

impl Reconciler {
    pub fn new(restart_on_change: bool) -> Self {
        Self { restart_on_change }
    }

    /// Run one reconciliation pass
    ///
    /// Never fails: every fault is logged at ERROR and reported as
    /// [`ReconciliationOutcome::Skipped`].
    pub async fn reconcile<P, C>(&self, source: &P, client: &C) -> ReconciliationOutcome
    where
        P: PortSource + Sync,
        C: TorrentClient + Sync,
    {
        if !source.is_connected().await {
            return skip(SkipReason::ConnectivityUnavailable);
        }
        info!("VPN is connected");

        let desired = match source.current_port().await {
            Some(port) => port,
            None => return skip(SkipReason::PortNotDiscoverable),
        };
        info!(port = desired.get(), "VPN forwarded port found in log: {}", desired);

        if !client.is_running().await {
            return skip(SkipReason::ClientNotRunning);
        }
        info!("BitTorrent client is running");

        let current = match client.get_port().await {
            Ok(port) => port,
            Err(e) => {
                error!("Failed to read client listening port: {}", e);
                return skip(SkipReason::ClientPortUnreadable);
            }
        };
        info!(port = current.get(), "Current client listening port: {}", current);

        if current == desired {
            info!("Ports match, no update needed");
            return ReconciliationOutcome::NoChangeNeeded { port: current };
        }

        info!(
            from = current.get(),
            to = desired.get(),
            "Ports do not match, updating client listening port to {}",
            desired
        );
        if let Err(e) = client.set_port(desired).await {
            error!("Failed to set client listening port: {}", e);
            return skip(SkipReason::ClientPortWriteFailed {
                port: desired.get(),
            });
        }
        info!("Successfully set client listening port to {}", desired);

        if !self.restart_on_change {
            return ReconciliationOutcome::PortUpdated {
                from: current,
                to: desired,
            };
        }

        info!("Restarting BitTorrent client");
        if let Err(e) = client.restart().await {
            error!("Restart failed: {}", e);
            return skip(SkipReason::ClientRestartFailed {
                port: desired.get(),
            });
        }
        info!("Successfully restarted BitTorrent client");

        ReconciliationOutcome::PortUpdatedAndRestarted {
            from: current,
            to: desired,
        }
    }
}

fn skip(reason: SkipReason) -> ReconciliationOutcome {
    error!("{}", reason);
    ReconciliationOutcome::Skipped(reason)
}
