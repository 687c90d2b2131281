//! Bot CRUD and lifecycle.

use tracing::info;

use botdesk_models::{Bot, BotId, CreateBotData, MessageResponse, UpdateBotData};

use crate::error::{ClientError, Result};
use crate::http::ApiClient;
use crate::request::ApiRequest;

/// Endpoints under `/bots` and `/ai/bots`.
pub struct BotService<'a> {
    client: &'a ApiClient,
}

impl<'a> BotService<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Lists the current user's bots.
    pub async fn list(&self) -> Result<Vec<Bot>> {
        self.client.send_json(ApiRequest::get("/bots/")).await
    }

    pub async fn get(&self, id: BotId) -> Result<Bot> {
        self.client
            .send_json(ApiRequest::get(format!("/bots/{}", id)))
            .await
    }

    pub async fn create(&self, data: &CreateBotData) -> Result<Bot> {
        let bot: Bot = self
            .client
            .send_json(ApiRequest::post("/bots/").json(data)?)
            .await?;
        info!(bot_id = %bot.id, bot_type = %bot.bot_type, "bot created");
        Ok(bot)
    }

    /// Applies a partial update. Fields left `None` are not sent.
    pub async fn update(&self, id: BotId, data: &UpdateBotData) -> Result<Bot> {
        if data.is_empty() {
            return Err(ClientError::InvalidInput(
                "nothing to update: no fields given".to_string(),
            ));
        }
        self.client
            .send_json(ApiRequest::put(format!("/bots/{}", id)).json(data)?)
            .await
    }

    pub async fn delete(&self, id: BotId) -> Result<()> {
        self.client
            .send_empty(ApiRequest::delete(format!("/bots/{}", id)))
            .await?;
        info!(bot_id = %id, "bot deleted");
        Ok(())
    }

    /// Generates the bot's code from its requirements.
    pub async fn generate(&self, id: BotId) -> Result<Bot> {
        self.client
            .send_json(ApiRequest::post(format!("/ai/bots/{}/generate", id)))
            .await
    }

    pub async fn deploy(&self, id: BotId) -> Result<MessageResponse> {
        self.client
            .send_json(ApiRequest::post(format!("/ai/bots/{}/deploy", id)))
            .await
    }

    pub async fn stop(&self, id: BotId) -> Result<MessageResponse> {
        self.client
            .send_json(ApiRequest::post(format!("/ai/bots/{}/stop", id)))
            .await
    }
}
