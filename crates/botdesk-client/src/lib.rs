//! Authenticated REST client for the BotDesk backend.
//!
//! [`ApiClient`] attaches the stored bearer token to every request and
//! recovers from an expired access token with a single shared refresh, no
//! matter how many requests fail at once. Typed service wrappers cover the
//! authentication, bot, knowledge-base and feedback endpoints.
//!
//! ```no_run
//! # async fn run() -> botdesk_client::Result<()> {
//! use std::sync::Arc;
//! use botdesk_client::{ApiClient, ClientConfig, SessionManager};
//! use botdesk_persistence::MemoryStore;
//!
//! let session = SessionManager::new(Arc::new(MemoryStore::new()));
//! let client = ApiClient::new(ClientConfig::from_env()?, session)?;
//! for bot in client.bots().list().await? {
//!     println!("{} {}", bot.id, bot.bot_name);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod oauth;
pub mod request;
pub mod services;
pub mod session;

pub use config::ClientConfig;
pub use error::{ClientError, RefreshError, Result};
pub use http::{ApiClient, REFRESH_PATH};
pub use oauth::UsedCodeRegistry;
pub use request::{ApiRequest, FilePart, FormField, RequestBody};
pub use services::{AuthService, BotService, FeedbackService, KnowledgeService};
pub use session::{Session, SessionEvent, SessionManager};
