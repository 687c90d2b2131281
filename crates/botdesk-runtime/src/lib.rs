//! Background status watches for BotDesk.
//!
//! Uploading a document to a bot's knowledge base starts an ingestion job on
//! the backend. [`KnowledgePoller`] follows such jobs:
//! - `watch` arms a timer for one bot while its knowledge base is `processing`
//! - every tick queries the status endpoint and publishes the result
//! - when processing ends the bot is fetched once and handed to a callback
//!
//! # Example
//!
//! ```ignore
//! use botdesk_runtime::{KnowledgePoller, PollerConfig};
//! use botdesk_models::{BotId, KnowledgeBaseState};
//!
//! let poller = KnowledgePoller::for_client(client, PollerConfig::from_env()?);
//! let handle = poller.watch(BotId::new(42), KnowledgeBaseState::Processing, |bot| {
//!     println!("{} is now {}", bot.bot_name, bot.knowledge_base_status);
//! })?;
//! let final_status = handle.join().await?;
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod poller;
pub mod source;

pub use config::{PollerConfig, POLL_INTERVAL_ENV};
pub use error::{Result, RuntimeError};
pub use event::PollEvent;
pub use poller::{KnowledgePoller, WatchHandle};
pub use source::StatusSource;
