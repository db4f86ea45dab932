//! TOML configuration file I/O
//!
//! Handles locating, loading and creating the portweaver configuration file
//! in the user's configuration directory.

use crate::config::ConfigSource;
use crate::error::{ConfigError, PortWeaverError};
use std::path::{Path, PathBuf};
use toml::{Table, Value};
use tracing::{debug, info};

/// Default configuration file name
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default log file name, written next to the configuration file
const LOG_FILE_NAME: &str = "portweaver.log";

/// Content written when no configuration file exists yet
pub const DEFAULT_CONFIG: &str = r#"[general]

# Seconds between two port checks
update_interval_seconds = 180

[qbittorrent]

# qBittorrent Web UI address and credentials
url = "http://127.0.0.1:8080"
username = "admin"
password = "PASSWORD"

# Executable started when qBittorrent is restarted
exe_path = "/usr/bin/qbittorrent"

# Process name used to detect and stop qBittorrent
process_name = "qbittorrent"

# Restart qBittorrent after a port change (recommended)
restart_on_change = true

[vpn]

# Proton VPN client log containing "Port pair A->B" lines
# log_path = "/home/user/.local/share/Proton/Proton VPN/Logs/client-logs.txt"

# Substring of the VPN network adapter name (case-insensitive)
interface_token = "proton"
"#;

/// Configuration provider backed by a parsed TOML document
///
/// Section and key lookups are case-insensitive. Scalar values are rendered
/// as strings so that typed parsing (and its defaults) happens in one place.
#[derive(Debug, Clone, Default)]
pub struct TomlConfigStore {
    table: Table,
}

impl TomlConfigStore {
    /// Parse configuration from a TOML string
    pub fn parse(contents: &str) -> Result<Self, PortWeaverError> {
        let table: Table = contents.parse()?;
        Ok(Self { table })
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, PortWeaverError> {
        let contents = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => PortWeaverError::Config(ConfigError::NotFound {
                path: path.to_string_lossy().to_string(),
            }),
            _ => PortWeaverError::Config(ConfigError::IoError {
                message: format!("Failed to read config file: {}", e),
            }),
        })?;

        let store = Self::parse(&contents).map_err(|e| {
            PortWeaverError::Config(ConfigError::ValidationError {
                message: format!("Failed to parse config file: {}", e),
            })
        })?;

        debug!(path = %path.display(), sections = store.table.len(), "Loaded configuration");
        Ok(store)
    }
}

impl ConfigSource for TomlConfigStore {
    fn get(&self, section: &str, key: &str) -> String {
        if section.is_empty() || key.is_empty() {
            return String::new();
        }

        self.table
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(section))
            .and_then(|(_, value)| value.as_table())
            .and_then(|table| {
                table
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(key))
                    .map(|(_, value)| value)
            })
            .map(render_scalar)
            .unwrap_or_default()
    }
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::Datetime(d) => d.to_string(),
        Value::Array(_) | Value::Table(_) => String::new(),
    }
}

/// Get the default configuration directory
///
/// Returns `PORTWEAVER_CONFIG_DIR` if set, else `$XDG_CONFIG_HOME/portweaver`,
/// else `~/.config/portweaver`.
pub fn get_config_dir() -> Result<PathBuf, PortWeaverError> {
    // Allow tests to override config directory via environment variable
    if let Ok(config_dir) = std::env::var("PORTWEAVER_CONFIG_DIR") {
        return Ok(PathBuf::from(config_dir));
    }

    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        if !xdg_config.is_empty() {
            return Ok(PathBuf::from(xdg_config).join("portweaver"));
        }
    }

    let home = std::env::var("HOME").map_err(|_| {
        PortWeaverError::Config(ConfigError::IoError {
            message: "HOME environment variable not set".to_string(),
        })
    })?;

    Ok(PathBuf::from(home).join(".config").join("portweaver"))
}

/// Get the default configuration file path
pub fn get_config_path() -> Result<PathBuf, PortWeaverError> {
    Ok(get_config_dir()?.join(CONFIG_FILE_NAME))
}

/// Log file written next to the given configuration file
pub fn log_path_for(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(dir) => dir.join(LOG_FILE_NAME),
        None => PathBuf::from(LOG_FILE_NAME),
    }
}

/// Write [`DEFAULT_CONFIG`] to `path` unless a file already exists
///
/// Returns `Ok(true)` when a file was created, `Ok(false)` when one was
/// already present.
pub fn create_default_config<P: AsRef<Path>>(path: P) -> Result<bool, PortWeaverError> {
    let path = path.as_ref();
    if path.exists() {
        debug!(path = %path.display(), "Configuration file already exists");
        return Ok(false);
    }

    // Ensure config directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            PortWeaverError::Config(ConfigError::IoError {
                message: format!("Failed to create config directory: {}", e),
            })
        })?;
    }

    std::fs::write(path, DEFAULT_CONFIG).map_err(|_e| {
        PortWeaverError::Config(ConfigError::SaveFailed {
            path: path.to_string_lossy().to_string(),
        })
    })?;

    info!("Created default configuration file: {}", path.display());
    Ok(true)
}
