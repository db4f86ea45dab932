use portweaver_core::client::TorrentClient;
use portweaver_core::error::{ClientError, SkipReason};
use portweaver_core::sync::{ReconciliationOutcome, Reconciler};
use portweaver_core::types::ListenPort;
use portweaver_core::vpn::PortSource;
use std::sync::Mutex;

fn port(value: u16) -> ListenPort {
    ListenPort::new(value).unwrap()
}

struct MockSource {
    connected: bool,
    port: Option<ListenPort>,
}

impl PortSource for MockSource {
    async fn is_connected(&self) -> bool {
        self.connected
    }

    async fn current_port(&self) -> Option<ListenPort> {
        self.port
    }
}

/// Scripted client that records every call it receives
struct MockClient {
    running: bool,
    port: Option<ListenPort>,
    set_ok: bool,
    restart_ok: bool,
    calls: Mutex<Vec<String>>,
}

impl MockClient {
    fn new(port: u16) -> Self {
        Self {
            running: true,
            port: Some(self::port(port)),
            set_ok: true,
            restart_ok: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl TorrentClient for MockClient {
    async fn is_running(&self) -> bool {
        self.record("is_running".to_string());
        self.running
    }

    async fn authenticate(&self) -> Result<(), ClientError> {
        self.record("authenticate".to_string());
        Ok(())
    }

    async fn get_port(&self) -> Result<ListenPort, ClientError> {
        self.record("get_port".to_string());
        self.port.ok_or(ClientError::InvalidPreferences {
            body: "{}".to_string(),
        })
    }

    async fn set_port(&self, port: ListenPort) -> Result<(), ClientError> {
        self.record(format!("set_port {}", port));
        if self.set_ok {
            Ok(())
        } else {
            Err(ClientError::UnexpectedStatus {
                endpoint: "/api/v2/app/setPreferences".to_string(),
                status: 500,
            })
        }
    }

    async fn restart(&self) -> Result<(), ClientError> {
        self.record("restart".to_string());
        if self.restart_ok {
            Ok(())
        } else {
            Err(ClientError::NotRunningAfterRestart {
                name: "qbittorrent".to_string(),
            })
        }
    }
}

fn connected(value: u16) -> MockSource {
    MockSource {
        connected: true,
        port: Some(port(value)),
    }
}

#[tokio::test]
async fn test_matching_ports_make_no_write() {
    let client = MockClient::new(51413);

    let outcome = Reconciler::new(true).reconcile(&connected(51413), &client).await;

    assert_eq!(outcome, ReconciliationOutcome::NoChangeNeeded { port: port(51413) });
    assert!(!outcome.changed_port());
    assert_eq!(client.calls(), vec!["is_running", "get_port"]);
}

#[tokio::test]
async fn test_changed_port_is_written_then_restarted() {
    let client = MockClient::new(51413);

    let outcome = Reconciler::new(true).reconcile(&connected(60000), &client).await;

    assert_eq!(
        outcome,
        ReconciliationOutcome::PortUpdatedAndRestarted {
            from: port(51413),
            to: port(60000),
        }
    );
    assert!(outcome.changed_port());
    assert_eq!(
        client.calls(),
        vec!["is_running", "get_port", "set_port 60000", "restart"]
    );
}

#[tokio::test]
async fn test_restart_disabled() {
    let client = MockClient::new(51413);

    let outcome = Reconciler::new(false).reconcile(&connected(60000), &client).await;

    assert_eq!(
        outcome,
        ReconciliationOutcome::PortUpdated {
            from: port(51413),
            to: port(60000),
        }
    );
    assert!(!client.calls().contains(&"restart".to_string()));
}

/// Nothing touches the client while the VPN is down
#[tokio::test]
async fn test_vpn_down_skips_everything() {
    let client = MockClient::new(51413);
    let source = MockSource {
        connected: false,
        port: Some(port(60000)),
    };

    let outcome = Reconciler::new(true).reconcile(&source, &client).await;

    assert_eq!(
        outcome,
        ReconciliationOutcome::Skipped(SkipReason::ConnectivityUnavailable)
    );
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn test_no_forwarded_port() {
    let client = MockClient::new(51413);
    let source = MockSource {
        connected: true,
        port: None,
    };

    let outcome = Reconciler::new(true).reconcile(&source, &client).await;

    assert_eq!(
        outcome,
        ReconciliationOutcome::Skipped(SkipReason::PortNotDiscoverable)
    );
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn test_client_not_running() {
    let mut client = MockClient::new(51413);
    client.running = false;

    let outcome = Reconciler::new(true).reconcile(&connected(60000), &client).await;

    assert_eq!(
        outcome,
        ReconciliationOutcome::Skipped(SkipReason::ClientNotRunning)
    );
    assert_eq!(client.calls(), vec!["is_running"]);
}

#[tokio::test]
async fn test_unreadable_client_port() {
    let mut client = MockClient::new(51413);
    client.port = None;

    let outcome = Reconciler::new(true).reconcile(&connected(60000), &client).await;

    assert_eq!(
        outcome,
        ReconciliationOutcome::Skipped(SkipReason::ClientPortUnreadable)
    );
    assert_eq!(client.calls(), vec!["is_running", "get_port"]);
}

/// A failed write never restarts the client
#[tokio::test]
async fn test_write_failure_skips_restart() {
    let mut client = MockClient::new(51413);
    client.set_ok = false;

    let outcome = Reconciler::new(true).reconcile(&connected(60000), &client).await;

    assert_eq!(
        outcome,
        ReconciliationOutcome::Skipped(SkipReason::ClientPortWriteFailed { port: 60000 })
    );
    assert!(!outcome.changed_port());
    assert!(!client.calls().contains(&"restart".to_string()));
}

/// The port was written, so a failed restart still counts as an update
#[tokio::test]
async fn test_restart_failure_after_write() {
    let mut client = MockClient::new(51413);
    client.restart_ok = false;

    let outcome = Reconciler::new(true).reconcile(&connected(60000), &client).await;

    assert_eq!(
        outcome,
        ReconciliationOutcome::Skipped(SkipReason::ClientRestartFailed { port: 60000 })
    );
    assert!(outcome.changed_port());
}
