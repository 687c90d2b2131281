//! Authenticated HTTP client with single-flight session refresh.
//!
//! Every request reads the current access token from the [`SessionManager`]
//! and sends it as a bearer token. When a request that allows it comes back
//! with `401 Unauthorized`, the client refreshes the session and re-issues the
//! request once with the new token.
//!
//! Refreshes are single-flight: the first request to see a 401 starts
//! `POST /auth/refresh`, and every other request that fails while it is in
//! flight awaits the same shared result instead of starting its own. The slot
//! holding the shared refresh is cleared as soon as it settles, so a later 401
//! starts a fresh refresh. A 401 for a token the session has already replaced
//! is retried with the current token without refreshing again.

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, info, trace, warn};

use botdesk_models::{AuthTokens, RefreshRequest};

use crate::config::ClientConfig;
use crate::error::{ClientError, RefreshError, Result};
use crate::request::{build_form, ApiRequest, RequestBody};
use crate::services::{AuthService, BotService, FeedbackService, KnowledgeService};
use crate::session::SessionManager;

/// Token refresh endpoint.
pub const REFRESH_PATH: &str = "/auth/refresh";

type RefreshFuture = Shared<BoxFuture<'static, std::result::Result<String, RefreshError>>>;

/// Client for the BotDesk REST API.
///
/// Cheap to clone; clones share the HTTP connection pool, the session and the
/// in-flight refresh.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: reqwest::Client,
    config: ClientConfig,
    session: SessionManager,
    pending_refresh: Mutex<Option<RefreshFuture>>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.config.base_url)
            .finish()
    }
}

impl ApiClient {
    /// Creates a client for `config`, authenticating with `session`.
    pub fn new(config: ClientConfig, session: SessionManager) -> Result<Self> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            inner: Arc::new(ClientInner {
                http,
                config,
                session,
                pending_refresh: Mutex::new(None),
            }),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn session(&self) -> &SessionManager {
        &self.inner.session
    }

    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(self)
    }

    pub fn bots(&self) -> BotService<'_> {
        BotService::new(self)
    }

    pub fn knowledge(&self) -> KnowledgeService<'_> {
        KnowledgeService::new(self)
    }

    pub fn feedback(&self) -> FeedbackService<'_> {
        FeedbackService::new(self)
    }

    /// Sends `request`, recovering from one expired access token.
    ///
    /// Returns the response if its status is a success, otherwise the
    /// corresponding [`ClientError`].
    pub async fn send(&self, request: ApiRequest) -> Result<Response> {
        let sent = self.inner.session.access_token()?;
        let response = self.inner.dispatch(&request, sent.as_deref()).await?;

        if response.status() != StatusCode::UNAUTHORIZED || !request.refresh_on_unauthorized {
            return error_for_status(response).await;
        }

        let token = match self.inner.session.access_token()? {
            // Another request already refreshed past the token this one used.
            Some(current) if sent.as_deref() != Some(current.as_str()) => {
                debug!(
                    method = %request.method,
                    path = %request.path,
                    "request unauthorized with a replaced token, retrying"
                );
                current
            }
            _ => {
                debug!(
                    method = %request.method,
                    path = %request.path,
                    "request unauthorized, refreshing session"
                );
                self.refreshed_access_token()
                    .await
                    .map_err(ClientError::RefreshFailed)?
            }
        };

        // A 401 here is final.
        let retry = self.inner.dispatch(&request, Some(&token)).await?;
        error_for_status(retry).await
    }

    /// Sends `request` and decodes a JSON response body.
    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let response = self.send(request).await?;
        decode(response).await
    }

    /// Sends `request`, discarding the response body.
    pub async fn send_empty(&self, request: ApiRequest) -> Result<()> {
        self.send(request).await?;
        Ok(())
    }

    /// Joins the in-flight refresh, starting one if none is running.
    async fn refreshed_access_token(&self) -> std::result::Result<String, RefreshError> {
        let pending = {
            let mut slot = self.inner.pending_refresh.lock().await;
            match slot.as_ref() {
                Some(pending) => {
                    trace!("joining in-flight session refresh");
                    pending.clone()
                }
                None => {
                    let pending = Arc::clone(&self.inner).refresh_session().boxed().shared();
                    *slot = Some(pending.clone());
                    pending
                }
            }
        };
        pending.await
    }
}

impl ClientInner {
    async fn dispatch(&self, request: &ApiRequest, token: Option<&str>) -> Result<Response> {
        let url = self.config.endpoint(&request.path);
        let mut builder = self.http.request(request.method.clone(), url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(body) => builder.json(body),
            RequestBody::Multipart(fields) => builder.multipart(build_form(fields)?),
        };

        trace!(method = %request.method, path = %request.path, "sending request");
        Ok(builder.send().await?)
    }

    /// Body of the shared refresh future.
    ///
    /// Settles the refresh exactly once: persists the new tokens or expires
    /// the session, then frees the slot for the next refresh.
    async fn refresh_session(self: Arc<Self>) -> std::result::Result<String, RefreshError> {
        let result = match self.exchange_refresh_token().await {
            Ok(tokens) => self
                .session
                .replace_tokens(&tokens)
                .map(|()| tokens.access_token)
                .map_err(RefreshError::from),
            Err(e) => Err(RefreshError::from(e)),
        };

        match &result {
            Ok(_) => info!("session refreshed"),
            Err(e) => {
                warn!(status = ?e.status, error = %e, "session refresh failed");
                self.session.expire(&self.config.login_path);
            }
        }

        *self.pending_refresh.lock().await = None;
        result
    }

    async fn exchange_refresh_token(&self) -> Result<AuthTokens> {
        let refresh_token = self
            .session
            .refresh_token()?
            .ok_or_else(|| ClientError::Auth("no refresh token stored".to_string()))?;

        let request = ApiRequest::post(REFRESH_PATH)
            .json(&RefreshRequest {
                refresh_token: &refresh_token,
            })?
            .without_refresh();
        let response = self.dispatch(&request, None).await?;
        let response = error_for_status(response).await?;
        decode(response).await
    }
}

async fn error_for_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::from_status(status.as_u16(), body))
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
}
