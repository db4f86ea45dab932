//! Configuration module
//!
//! Settings are read through [`ConfigSource`], a flat `section`/`key` lookup
//! that always yields a string. Typed values are derived here with
//! documented defaults, so a malformed value never aborts a pass.

use crate::types::Credentials;
use std::path::PathBuf;
use std::time::Duration;

pub mod toml_config;

/// Wait between passes when the configured interval is missing or invalid
pub const DEFAULT_UPDATE_INTERVAL_SECS: u64 = 180;

/// Wait forced after a manually triggered pass
pub const MANUAL_FOLLOWUP_INTERVAL_SECS: u64 = 10;

/// Substring identifying the VPN adapter by name
pub const DEFAULT_INTERFACE_TOKEN: &str = "proton";

pub const SECTION_GENERAL: &str = "general";
pub const SECTION_CLIENT: &str = "qbittorrent";
pub const SECTION_VPN: &str = "vpn";

/// Key/value configuration provider
///
/// Returns an empty string when the section or key is absent.
pub trait ConfigSource {
    fn get(&self, section: &str, key: &str) -> String;
}

/// Connection and process settings for the BitTorrent client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    /// Base URL of the Web API, without trailing slash
    pub url: String,
    pub credentials: Credentials,
    /// Executable launched on restart
    pub exe_path: PathBuf,
    /// Process name used for liveness checks and termination
    pub process_name: String,
}

/// Where the VPN forwarded port and adapter are discovered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VpnSettings {
    pub log_path: PathBuf,
    pub interface_token: String,
}

/// Typed view over a [`ConfigSource`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub update_interval: Duration,
    pub restart_on_change: bool,
    pub client: ClientSettings,
    pub vpn: VpnSettings,
}

impl Settings {
    /// Build settings from a source, applying defaults for anything missing
    pub fn from_source<S: ConfigSource + ?Sized>(source: &S) -> Self {
        let update_interval = Duration::from_secs(parse_interval_secs(
            &source.get(SECTION_GENERAL, "update_interval_seconds"),
        ));

        let restart_on_change =
            parse_flag(&source.get(SECTION_CLIENT, "restart_on_change"), true);

        let client = ClientSettings {
            url: source
                .get(SECTION_CLIENT, "url")
                .trim()
                .trim_end_matches('/')
                .to_string(),
            credentials: Credentials::new(
                source.get(SECTION_CLIENT, "username"),
                source.get(SECTION_CLIENT, "password"),
            ),
            exe_path: PathBuf::from(source.get(SECTION_CLIENT, "exe_path")),
            process_name: source.get(SECTION_CLIENT, "process_name").trim().to_string(),
        };

        let log_path = source.get(SECTION_VPN, "log_path");
        let interface_token = source.get(SECTION_VPN, "interface_token");
        let vpn = VpnSettings {
            log_path: if log_path.trim().is_empty() {
                default_vpn_log_path()
            } else {
                PathBuf::from(log_path.trim())
            },
            interface_token: if interface_token.trim().is_empty() {
                DEFAULT_INTERFACE_TOKEN.to_string()
            } else {
                interface_token.trim().to_string()
            },
        };

        Self {
            update_interval,
            restart_on_change,
            client,
            vpn,
        }
    }
}

/// Parse the poll interval in seconds
///
/// Missing, non-numeric and zero values fall back to
/// [`DEFAULT_UPDATE_INTERVAL_SECS`].
pub fn parse_interval_secs(value: &str) -> u64 {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => secs,
        _ => DEFAULT_UPDATE_INTERVAL_SECS,
    }
}

/// Parse a boolean-like flag (`true`/`false`, case-insensitive)
///
/// Anything else yields `default`.
pub fn parse_flag(value: &str, default: bool) -> bool {
    let value = value.trim();
    if value.eq_ignore_ascii_case("true") {
        true
    } else if value.eq_ignore_ascii_case("false") {
        false
    } else {
        default
    }
}

/// Default location of the Proton VPN client log
///
/// `$XDG_DATA_HOME/Proton/Proton VPN/Logs/client-logs.txt`, falling back to
/// `~/.local/share` when XDG_DATA_HOME is unset.
pub fn default_vpn_log_path() -> PathBuf {
    let data_dir = std::env::var_os("XDG_DATA_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir
        .join("Proton")
        .join("Proton VPN")
        .join("Logs")
        .join("client-logs.txt")
}
