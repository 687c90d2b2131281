//! Where the poller gets its data from.

use async_trait::async_trait;

use botdesk_client::{ApiClient, ClientError};
use botdesk_models::{Bot, BotId, KnowledgeBaseStatus};

/// Status and bot lookups used by [`crate::KnowledgePoller`].
#[async_trait]
pub trait StatusSource: Send + Sync + 'static {
    /// `GET /ai/bots/{id}/knowledge/status`.
    async fn knowledge_status(&self, bot_id: BotId) -> Result<KnowledgeBaseStatus, ClientError>;

    /// `GET /bots/{id}`.
    async fn bot(&self, bot_id: BotId) -> Result<Bot, ClientError>;
}

#[async_trait]
impl StatusSource for ApiClient {
    async fn knowledge_status(&self, bot_id: BotId) -> Result<KnowledgeBaseStatus, ClientError> {
        self.knowledge().status(bot_id).await
    }

    async fn bot(&self, bot_id: BotId) -> Result<Bot, ClientError> {
        self.bots().get(bot_id).await
    }
}
