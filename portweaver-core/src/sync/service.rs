//! Scheduled pass wired to configuration and live collaborators
//!
//! Each pass re-reads the configuration file, so edits take effect on the
//! next pass without a restart. The client session is kept between passes
//! and rebuilt only when the client settings change.

use crate::client::QbittorrentSession;
use crate::config::toml_config::{create_default_config, TomlConfigStore};
use crate::config::{ClientSettings, Settings, DEFAULT_UPDATE_INTERVAL_SECS};
use crate::error::{ConfigError, PortWeaverError, SkipReason};
use crate::logging::{enforce_size_limit, MAX_LOG_FILE_BYTES};
use crate::sync::{PassReport, ReconcilePass, ReconciliationOutcome, Reconciler};
use crate::vpn::ProtonPortSource;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info};

/// The production reconciliation pass
pub struct PortSyncService {
    config_path: PathBuf,
    log_file: Option<PathBuf>,
    session: Option<(ClientSettings, QbittorrentSession)>,
}

impl PortSyncService {
    /// Create a service reading its settings from `config_path`
    pub fn new(config_path: PathBuf) -> Self {
        Self {
            config_path,
            log_file: None,
            session: None,
        }
    }

    /// Keep this log file under [`MAX_LOG_FILE_BYTES`] before each pass
    pub fn with_log_file(mut self, log_file: PathBuf) -> Self {
        self.log_file = Some(log_file);
        self
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load settings, creating a default configuration file when missing
    fn load_settings(&self) -> Result<Settings, SkipReason> {
        match TomlConfigStore::from_file(&self.config_path) {
            Ok(store) => {
                info!("Successfully loaded: {}", self.config_path.display());
                Ok(Settings::from_source(&store))
            }
            Err(PortWeaverError::Config(ConfigError::NotFound { path })) => {
                error!("Failed to load configuration file: {}", path);
                info!("Creating default configuration file: {}", path);
                if let Err(e) = create_default_config(&self.config_path) {
                    error!("Failed to create default configuration file: {}", e);
                }
                Err(SkipReason::ConfigurationUnavailable {
                    reason: format!("{} was missing", path),
                })
            }
            Err(e) => {
                error!("{}", e);
                Err(SkipReason::ConfigurationUnavailable {
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Run one complete pass and report when the next one is due
    pub async fn run_once(&mut self) -> PassReport {
        if let Some(log_file) = &self.log_file {
            enforce_size_limit(log_file, MAX_LOG_FILE_BYTES);
        }

        let settings = match self.load_settings() {
            Ok(settings) => settings,
            Err(reason) => {
                return PassReport {
                    outcome: ReconciliationOutcome::Skipped(reason),
                    next_interval: Duration::from_secs(DEFAULT_UPDATE_INTERVAL_SECS),
                }
            }
        };

        let session = match self.session.take() {
            Some((cached, session)) if cached == settings.client => session,
            _ => match QbittorrentSession::from_settings(&settings.client) {
                Ok(session) => session,
                Err(e) => {
                    error!("Cannot create client session: {}", e);
                    return PassReport {
                        outcome: ReconciliationOutcome::Skipped(
                            SkipReason::ConfigurationUnavailable {
                                reason: e.to_string(),
                            },
                        ),
                        next_interval: settings.update_interval,
                    };
                }
            },
        };

        let source = ProtonPortSource::from_settings(&settings.vpn);
        let outcome = Reconciler::new(settings.restart_on_change)
            .reconcile(&source, &session)
            .await;

        self.session = Some((settings.client, session));

        PassReport {
            outcome,
            next_interval: settings.update_interval,
        }
    }
}

impl ReconcilePass for PortSyncService {
    async fn run_pass(&mut self) -> PassReport {
        self.run_once().await
    }
}
