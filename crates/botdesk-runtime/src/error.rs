//! Error types for the runtime crate.

use thiserror::Error;

use botdesk_client::ClientError;
use botdesk_models::{BotId, KnowledgeBaseState};

/// Errors that can occur when arming or running a status watch.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Watches are only armed while the knowledge base is processing.
    #[error("knowledge base of bot {bot_id} is {status}, not processing")]
    NotProcessing {
        bot_id: BotId,
        status: KnowledgeBaseState,
    },

    /// A watch for this bot is already running.
    #[error("already watching bot {0}")]
    AlreadyWatching(BotId),

    /// The status source failed.
    #[error("status source error: {0}")]
    Source(#[from] ClientError),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The watch task panicked or was aborted.
    #[error("watch task failed: {0}")]
    Task(String),
}

/// Result type for runtime operations.
pub type Result<T> = std::result::Result<T, RuntimeError>;
