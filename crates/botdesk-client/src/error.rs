//! Error types for the client crate.

use thiserror::Error;

use botdesk_persistence::PersistenceError;

/// Errors returned by [`crate::ApiClient`] and the service wrappers.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced a response (DNS, connect, TLS, reset).
    #[error("transport error: {0}")]
    Transport(String),

    /// The request timed out.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// The backend answered with a non-success status.
    #[error("API error {status}: {}", api_message(.detail, .body))]
    Api {
        /// HTTP status code.
        status: u16,
        /// The backend's `detail` field, JSON-encoded when not a string.
        detail: Option<String>,
        /// Raw response body.
        body: String,
    },

    /// The session could not be refreshed; the stored session has been cleared.
    #[error("session refresh failed: {0}")]
    RefreshFailed(#[source] RefreshError),

    /// A response body could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// Authentication flow failure with a user-facing message.
    #[error("{0}")]
    Auth(String),

    /// Invalid input rejected before any request was made.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Session storage failure.
    #[error("storage error: {0}")]
    Storage(#[from] PersistenceError),

    /// Invalid URL.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Local file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Request body could not be encoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn api_message<'a>(detail: &'a Option<String>, body: &'a str) -> &'a str {
    detail.as_deref().unwrap_or(body)
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

impl ClientError {
    /// Builds an [`ClientError::Api`] from a status code and raw body,
    /// extracting the backend's `detail` field when present.
    pub fn from_status(status: u16, body: String) -> Self {
        let detail = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|mut v| v.get_mut("detail").map(serde_json::Value::take))
            .filter(|d| !d.is_null())
            .map(|d| match d {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            });
        ClientError::Api {
            status,
            detail,
            body,
        }
    }

    /// HTTP status of an API error.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::RefreshFailed(e) => e.status,
            _ => None,
        }
    }

    /// Backend `detail` message of an API error.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ClientError::Api { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    /// Returns true if the caller has to log in again.
    pub fn requires_login(&self) -> bool {
        matches!(self, ClientError::RefreshFailed(_)) || self.status() == Some(401)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ClientError::Timeout(e.to_string())
        } else if e.is_decode() {
            ClientError::Decode(e.to_string())
        } else {
            ClientError::Transport(e.to_string())
        }
    }
}

/// Outcome of a failed token refresh, shared by every request that waited
/// on it.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct RefreshError {
    /// HTTP status of the refresh endpoint, if it answered.
    pub status: Option<u16>,
    /// Description of the failure.
    pub message: String,
}

impl RefreshError {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<ClientError> for RefreshError {
    fn from(e: ClientError) -> Self {
        RefreshError::new(e.status(), e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_extracts_string_detail() {
        let err = ClientError::from_status(404, r#"{"detail":"Bot not found"}"#.to_string());
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.detail(), Some("Bot not found"));
        assert_eq!(err.to_string(), "API error 404: Bot not found");
    }

    #[test]
    fn test_from_status_encodes_structured_detail() {
        let err = ClientError::from_status(
            422,
            r#"{"detail":[{"loc":["body","email"],"msg":"field required"}]}"#.to_string(),
        );
        let detail = err.detail().unwrap();
        assert!(detail.starts_with('['));
        assert!(detail.contains("field required"));
    }

    #[test]
    fn test_from_status_plain_body() {
        let err = ClientError::from_status(502, "Bad Gateway".to_string());
        assert_eq!(err.detail(), None);
        assert_eq!(err.to_string(), "API error 502: Bad Gateway");
    }

    #[test]
    fn test_requires_login() {
        let err = ClientError::RefreshFailed(RefreshError::new(Some(401), "expired"));
        assert!(err.requires_login());
        assert_eq!(err.status(), Some(401));
        assert!(!ClientError::Timeout("slow".into()).requires_login());
    }

    #[test]
    fn test_refresh_error_from_client_error() {
        let err: RefreshError = ClientError::from_status(403, "{}".into()).into();
        assert_eq!(err.status, Some(403));
    }
}
