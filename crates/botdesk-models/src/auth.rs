//! Authentication payloads.

use serde::{Deserialize, Serialize};

use crate::ids::UserId;

/// Email/password login request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

/// Account registration request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterData {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

/// Token pair issued by the backend.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl AuthTokens {
    /// Creates a bearer token pair.
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            token_type: default_token_type(),
        }
    }
}

// Token values stay out of logs.
impl std::fmt::Debug for AuthTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthTokens")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .finish()
    }
}

/// Body of `POST /auth/refresh`.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

/// A user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub full_name: String,
    #[serde(default)]
    pub is_verified: bool,
}

/// Response to a registration request.
///
/// Tokens are only present when the backend logs the user in right away
/// (for example when email verification is disabled).
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub tokens: Option<AuthTokens>,
}

/// Body of `POST /auth/verify-email`.
#[derive(Debug, Clone, Serialize)]
pub struct EmailVerificationRequest<'a> {
    pub token: &'a str,
}

/// Response to a successful email verification.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailVerificationResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub is_verified: bool,
    pub tokens: AuthTokens,
    #[serde(default)]
    pub user: Option<User>,
}

/// Body of `POST /auth/google`.
#[derive(Debug, Clone, Serialize)]
pub struct GoogleAuthRequest<'a> {
    pub code: &'a str,
    pub redirect_uri: &'a str,
}

/// Response to a Google authorization-code exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleAuthResponse {
    #[serde(flatten)]
    pub tokens: AuthTokens,
    #[serde(default)]
    pub user: Option<User>,
}
