//! Authentication flows.
//!
//! Credential exchanges (login, register, verify-email, google) are sent with
//! refresh disabled: a 401 there means bad credentials, not an expired session.

use tracing::{debug, info, warn};

use botdesk_models::{
    AuthResponse, AuthTokens, EmailVerificationRequest, EmailVerificationResponse,
    GoogleAuthRequest, GoogleAuthResponse, LoginCredentials, RegisterData, User,
};

use crate::error::{ClientError, Result};
use crate::http::ApiClient;
use crate::oauth::UsedCodeRegistry;
use crate::request::ApiRequest;

const TIMEOUT_MESSAGE: &str = "Request timeout. Please check your connection";

/// Authentication endpoints under `/auth`.
pub struct AuthService<'a> {
    client: &'a ApiClient,
}

impl<'a> AuthService<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Logs in with email and password and stores the session.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<AuthTokens> {
        let request = ApiRequest::post("/auth/login")
            .json(credentials)?
            .without_refresh();
        let tokens: AuthTokens = self.client.send_json(request).await?;
        self.client.session().establish(&tokens, None)?;
        info!(email = %credentials.email, "logged in");
        Ok(tokens)
    }

    /// Registers a new account.
    ///
    /// When the backend answers with tokens (verification disabled) the session
    /// is stored right away; otherwise the user has to verify the email first.
    pub async fn register(&self, data: &RegisterData) -> Result<AuthResponse> {
        let request = ApiRequest::post("/auth/register")
            .json(data)?
            .without_refresh();
        let response: AuthResponse = self.client.send_json(request).await?;
        if let Some(tokens) = &response.tokens {
            self.client
                .session()
                .establish(tokens, response.user.as_ref())?;
        }
        info!(email = %data.email, logged_in = response.tokens.is_some(), "registered");
        Ok(response)
    }

    /// Fetches the current user and caches the profile.
    pub async fn current_user(&self) -> Result<User> {
        let user: User = self.client.send_json(ApiRequest::get("/auth/me")).await?;
        self.client.session().set_user(&user)?;
        Ok(user)
    }

    /// Confirms an email address with the token from the verification mail.
    pub async fn verify_email(&self, token: &str) -> Result<EmailVerificationResponse> {
        let request = ApiRequest::post("/auth/verify-email")
            .json(&EmailVerificationRequest { token })?
            .without_refresh();
        let response: EmailVerificationResponse = self
            .client
            .send_json(request)
            .await
            .map_err(map_verification_error)?;
        self.client
            .session()
            .establish(&response.tokens, response.user.as_ref())?;
        info!(verified = response.is_verified, "email verified");
        Ok(response)
    }

    /// Exchanges a Google authorization code for a session.
    ///
    /// A code is exchanged at most once; it is remembered before the request
    /// and forgotten again only if the request never reached the backend.
    pub async fn google_auth(&self, code: &str) -> Result<GoogleAuthResponse> {
        let redirect_uri = self.client.config().google_redirect_uri.clone().ok_or_else(|| {
            ClientError::Configuration(
                "Redirect URI is not configured. Please check your environment variables."
                    .to_string(),
            )
        })?;

        let used_codes = UsedCodeRegistry::new(self.client.session().store());
        if used_codes.is_used(code)? {
            return Err(ClientError::Auth(
                "This Google code was already used. Please try logging in again.".to_string(),
            ));
        }
        used_codes.mark_used(code)?;

        let request = ApiRequest::post("/auth/google")
            .json(&GoogleAuthRequest {
                code,
                redirect_uri: &redirect_uri,
            })?
            .without_refresh();
        let response: GoogleAuthResponse = match self.client.send_json(request).await {
            Ok(response) => response,
            Err(e) => {
                if matches!(e, ClientError::Transport(_) | ClientError::Timeout(_)) {
                    debug!("google exchange did not reach the backend, releasing code");
                    if let Err(e) = used_codes.remove(code) {
                        warn!(error = %e, "failed to release google code");
                    }
                }
                return Err(map_google_error(e));
            }
        };

        self.client
            .session()
            .establish(&response.tokens, response.user.as_ref())?;
        info!("logged in with google");
        Ok(response)
    }

    /// Clears the stored session. The backend keeps no server-side session.
    pub fn logout(&self) -> Result<()> {
        self.client.session().clear()
    }
}

/// User-facing message for a failed email verification.
pub fn map_verification_error(err: ClientError) -> ClientError {
    let message = match &err {
        ClientError::Api {
            detail: Some(detail),
            ..
        } => detail.clone(),
        ClientError::Api { status: 400, .. } => "Invalid or expired verification token".to_string(),
        ClientError::Timeout(_) => TIMEOUT_MESSAGE.to_string(),
        _ => "An error occurred during email verification".to_string(),
    };
    debug!(error = %err, "email verification failed");
    ClientError::Auth(message)
}

/// User-facing message for a failed Google code exchange.
pub fn map_google_error(err: ClientError) -> ClientError {
    let message = match &err {
        ClientError::Api {
            detail: Some(detail),
            ..
        } => {
            if detail.contains("invalid_grant") {
                "Google code has expired or was already used. Please try logging in again."
                    .to_string()
            } else if detail.contains("redirect_uri") {
                "Redirect URI mismatch. Please check your Google OAuth configuration.".to_string()
            } else {
                detail.clone()
            }
        }
        ClientError::Api { status: 400, .. } => {
            "Invalid or expired Google code. Please try logging in again.".to_string()
        }
        ClientError::Timeout(_) => TIMEOUT_MESSAGE.to_string(),
        _ => "An error occurred during Google authentication".to_string(),
    };
    debug!(error = %err, "google authentication failed");
    ClientError::Auth(message)
}
