//! Client configuration.

use std::time::Duration;

use url::Url;

use crate::error::{ClientError, Result};

/// Environment variable for the backend base URL.
pub const API_URL_ENV: &str = "BOTDESK_API_URL";

/// Environment variable for the Google OAuth redirect URI.
pub const GOOGLE_REDIRECT_URI_ENV: &str = "BOTDESK_GOOGLE_REDIRECT_URI";

/// Environment variable for the per-request timeout in seconds.
pub const REQUEST_TIMEOUT_ENV: &str = "BOTDESK_REQUEST_TIMEOUT_SECS";

/// Environment variable for the login entry point.
pub const LOGIN_PATH_ENV: &str = "BOTDESK_LOGIN_PATH";

/// Default backend for local development.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Where the user is sent when the session cannot be recovered.
pub const DEFAULT_LOGIN_PATH: &str = "/login";

/// Configuration for [`crate::ApiClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL; endpoint paths are appended to it.
    pub base_url: String,
    /// Timeout applied to every request.
    pub request_timeout: Duration,
    /// Redirect URI registered with Google, needed for the code exchange.
    pub google_redirect_uri: Option<String>,
    /// Login entry point reported when the session expires.
    pub login_path: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            google_redirect_uri: None,
            login_path: DEFAULT_LOGIN_PATH.to_string(),
        }
    }
}

impl ClientConfig {
    /// Creates a config pointing at `base_url` with default settings.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Reads the config from `BOTDESK_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(url) = std::env::var(API_URL_ENV) {
            config.base_url = url;
        }
        if let Ok(uri) = std::env::var(GOOGLE_REDIRECT_URI_ENV) {
            if !uri.trim().is_empty() {
                config.google_redirect_uri = Some(uri);
            }
        }
        if let Ok(secs) = std::env::var(REQUEST_TIMEOUT_ENV) {
            config.request_timeout = parse_timeout(&secs)?;
        }
        if let Ok(path) = std::env::var(LOGIN_PATH_ENV) {
            config.login_path = path;
        }
        config.validate()?;
        Ok(config)
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the Google OAuth redirect URI.
    pub fn with_google_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.google_redirect_uri = Some(uri.into());
        self
    }

    /// Checks that the base URL is an absolute http(s) URL and the request
    /// timeout is non-zero.
    pub fn validate(&self) -> Result<()> {
        if self.request_timeout.is_zero() {
            return Err(ClientError::Configuration(
                "request timeout must be greater than zero".to_string(),
            ));
        }
        let url = Url::parse(&self.base_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ClientError::Configuration(format!(
                "unsupported scheme in API URL: {}",
                self.base_url
            )));
        }
        Ok(())
    }

    /// Absolute URL of an endpoint path such as `/bots/42`.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Parses a `BOTDESK_REQUEST_TIMEOUT_SECS` value.
fn parse_timeout(raw: &str) -> Result<Duration> {
    let secs: u64 = raw.trim().parse().map_err(|_| {
        ClientError::Configuration(format!(
            "{} must be a number of seconds, got {:?}",
            REQUEST_TIMEOUT_ENV, raw
        ))
    })?;
    if secs == 0 {
        return Err(ClientError::Configuration(format!(
            "{} must be greater than zero",
            REQUEST_TIMEOUT_ENV
        )));
    }
    Ok(Duration::from_secs(secs))
}
