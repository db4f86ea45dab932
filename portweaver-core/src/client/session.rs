//! qBittorrent Web API session
//!
//! One `QbittorrentSession` owns one HTTP client with a cookie jar, so a
//! successful login is reused by the request that follows it. Every request
//! is bounded by a fixed timeout.

use crate::client::{ClientProcess, TorrentClient};
use crate::config::ClientSettings;
use crate::error::ClientError;
use crate::types::{Credentials, ListenPort};
use reqwest::{Client, Response};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Upper bound for every Web API request
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const LOGIN_ENDPOINT: &str = "/api/v2/auth/login";
const PREFERENCES_ENDPOINT: &str = "/api/v2/app/preferences";
const SET_PREFERENCES_ENDPOINT: &str = "/api/v2/app/setPreferences";

/// Authenticated access to a qBittorrent instance
#[derive(Debug)]
pub struct QbittorrentSession {
    client: Client,
    base_url: String,
    credentials: Credentials,
    process: ClientProcess,
    timeout: Duration,
}

impl QbittorrentSession {
    /// Create a new session with the default request timeout
    ///
    /// # Arguments
    /// * `base_url` - Web UI address (must use http:// or https://)
    /// * `credentials` - Web UI login
    /// * `process` - Client process used for liveness checks and restarts
    pub fn new(
        base_url: &str,
        credentials: Credentials,
        process: ClientProcess,
    ) -> Result<Self, ClientError> {
        Self::with_timeout(base_url, credentials, process, REQUEST_TIMEOUT)
    }

    /// Create a new session with a custom request timeout
    #[tracing::instrument(skip(credentials, process, timeout), fields(timeout_ms = timeout.as_millis()))]
    pub fn with_timeout(
        base_url: &str,
        credentials: Credentials,
        process: ClientProcess,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();

        // Validate base URL
        let url = Url::parse(&base_url)
            .map_err(|e| ClientError::InvalidUrl(format!("Failed to parse URL '{}': {}", base_url, e)))?;

        // Ensure scheme is HTTP or HTTPS
        match url.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(ClientError::InvalidUrl(format!(
                    "Only HTTP/HTTPS schemes are supported, got: {}",
                    scheme
                )));
            }
        }

        let client = Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .use_rustls_tls()
            .build()?;

        Ok(Self {
            client,
            base_url,
            credentials,
            process,
            timeout,
        })
    }

    /// Create a session from client settings
    pub fn from_settings(settings: &ClientSettings) -> Result<Self, ClientError> {
        Self::new(
            &settings.url,
            settings.credentials.clone(),
            ClientProcess::new(settings.process_name.clone(), settings.exe_path.clone()),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn process(&self) -> &ClientProcess {
        &self.process
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn transport_error(&self, error: reqwest::Error) -> ClientError {
        let reason = if error.is_timeout() {
            format!("Request timeout after {:?}", self.timeout)
        } else if error.is_connect() {
            "Connection refused or unreachable".to_string()
        } else {
            format!("Request failed: {}", error)
        };
        ClientError::Transport { reason }
    }

    fn ensure_success(endpoint: &str, response: &Response) -> Result<(), ClientError> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ClientError::UnexpectedStatus {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            })
        }
    }
}

impl TorrentClient for QbittorrentSession {
    async fn is_running(&self) -> bool {
        self.process.is_running().await
    }

    #[tracing::instrument(skip(self), fields(url = %self.base_url))]
    async fn authenticate(&self) -> Result<(), ClientError> {
        let form = [
            ("username", self.credentials.username()),
            ("password", self.credentials.expose_password()),
        ];

        let response = self
            .client
            .post(self.endpoint(LOGIN_ENDPOINT))
            .form(&form)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status.is_success() {
            debug!(status = %status, "Authenticated with client Web API");
            Ok(())
        } else {
            warn!(status = %status, "Client Web API rejected login");
            Err(ClientError::AuthenticationFailed {
                status: status.as_u16(),
            })
        }
    }

    #[tracing::instrument(skip(self), fields(url = %self.base_url))]
    async fn get_port(&self) -> Result<ListenPort, ClientError> {
        self.authenticate().await?;

        let endpoint = self.endpoint(PREFERENCES_ENDPOINT);
        let response = self
            .client
            .get(&endpoint)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        Self::ensure_success(&endpoint, &response)?;

        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        match parse_listen_port(&body) {
            Some(port) => Ok(port),
            None => {
                debug!(body = %body, "Preferences JSON without a usable listen_port");
                Err(ClientError::InvalidPreferences { body })
            }
        }
    }

    #[tracing::instrument(skip(self), fields(url = %self.base_url))]
    async fn set_port(&self, port: ListenPort) -> Result<(), ClientError> {
        self.authenticate().await?;

        let endpoint = self.endpoint(SET_PREFERENCES_ENDPOINT);
        let payload = format!("{{\"listen_port\": {}}}", port);

        let response = self
            .client
            .post(&endpoint)
            .form(&[("json", payload)])
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        Self::ensure_success(&endpoint, &response)
    }

    async fn restart(&self) -> Result<(), ClientError> {
        self.process.restart().await
    }
}

/// Extract `listen_port` from a preferences JSON document
///
/// The field may be a JSON number or a numeric string; both are accepted.
/// Anything else, including an out-of-range number, yields `None`.
pub fn parse_listen_port(body: &str) -> Option<ListenPort> {
    let document: Value = serde_json::from_str(body).ok()?;

    match document.get("listen_port")? {
        Value::Number(number) => number.as_i64().and_then(ListenPort::from_i64),
        Value::String(text) => ListenPort::parse(text),
        _ => None,
    }
}
