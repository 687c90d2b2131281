//! Knowledge-base uploads and status.

use std::path::Path;

use tracing::info;

use botdesk_models::{BotId, KnowledgeBaseStatus};

use crate::error::Result;
use crate::http::ApiClient;
use crate::request::{ensure_pdf, ApiRequest, FilePart, FormField};

/// Endpoints under `/ai/bots/{id}/knowledge`.
pub struct KnowledgeService<'a> {
    client: &'a ApiClient,
}

impl<'a> KnowledgeService<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Current processing state of the bot's knowledge base.
    pub async fn status(&self, bot_id: BotId) -> Result<KnowledgeBaseStatus> {
        self.client
            .send_json(ApiRequest::get(format!(
                "/ai/bots/{}/knowledge/status",
                bot_id
            )))
            .await
    }

    /// Uploads a PDF document. Processing continues on the backend; watch
    /// [`KnowledgeService::status`] until it leaves `processing`.
    pub async fn upload(&self, bot_id: BotId, path: &Path) -> Result<serde_json::Value> {
        let path = ensure_pdf(path)?;
        let file = FilePart::from_path(&path).await?;
        self.upload_file(bot_id, file).await
    }

    /// Uploads an in-memory document.
    pub async fn upload_file(&self, bot_id: BotId, file: FilePart) -> Result<serde_json::Value> {
        let name = file.file_name.clone();
        let size = file.bytes.len();
        let request = ApiRequest::post(format!("/ai/bots/{}/knowledge", bot_id))
            .multipart(vec![FormField::file("file", file)]);
        let response = self.client.send(request).await?;
        let bytes = response.bytes().await?;
        info!(bot_id = %bot_id, file = %name, size, "knowledge document uploaded");
        // The body is informational only.
        Ok(serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null))
    }
}
