//! Customer feedback review.

use std::path::PathBuf;

use tracing::{debug, info};

use botdesk_models::{
    BotId, CreateFeedbackData, Feedback, FeedbackFilter, FeedbackId, FeedbackListResponse,
    FeedbackPage, FeedbackStats, FeedbackStatus, MarkAllReadResponse, RawFeedbackStats,
    UpdateFeedbackStatusData,
};

use crate::error::Result;
use crate::http::ApiClient;
use crate::request::{ApiRequest, FilePart, FormField};

/// Endpoints under `/bots/{id}/feedbacks`.
pub struct FeedbackService<'a> {
    client: &'a ApiClient,
}

impl<'a> FeedbackService<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Lists feedback for a bot. Accepts both response shapes of the backend.
    pub async fn list(&self, bot_id: BotId, filter: &FeedbackFilter) -> Result<FeedbackPage> {
        let request =
            ApiRequest::get(format!("/bots/{}/feedbacks", bot_id)).query(filter.query_pairs());
        let response: FeedbackListResponse = self.client.send_json(request).await?;
        let page = FeedbackPage::from(response);
        debug!(bot_id = %bot_id, count = page.feedbacks.len(), total = page.total, "feedback listed");
        Ok(page)
    }

    pub async fn get(&self, bot_id: BotId, feedback_id: FeedbackId) -> Result<Feedback> {
        self.client
            .send_json(ApiRequest::get(format!(
                "/bots/{}/feedbacks/{}",
                bot_id, feedback_id
            )))
            .await
    }

    pub async fn update_status(
        &self,
        bot_id: BotId,
        feedback_id: FeedbackId,
        status: FeedbackStatus,
    ) -> Result<Feedback> {
        let request = ApiRequest::patch(format!(
            "/bots/{}/feedbacks/{}/status",
            bot_id, feedback_id
        ))
        .json(&UpdateFeedbackStatusData { status })?;
        self.client.send_json(request).await
    }

    pub async fn delete(&self, bot_id: BotId, feedback_id: FeedbackId) -> Result<()> {
        self.client
            .send_empty(ApiRequest::delete(format!(
                "/bots/{}/feedbacks/{}",
                bot_id, feedback_id
            )))
            .await?;
        info!(bot_id = %bot_id, feedback_id = %feedback_id, "feedback deleted");
        Ok(())
    }

    /// Aggregated statistics, with missing counters reported as zero.
    pub async fn stats(&self, bot_id: BotId) -> Result<FeedbackStats> {
        let raw: RawFeedbackStats = self
            .client
            .send_json(ApiRequest::get(format!("/bots/{}/feedbacks/stats", bot_id)))
            .await?;
        Ok(raw.into())
    }

    pub async fn mark_all_read(&self, bot_id: BotId) -> Result<MarkAllReadResponse> {
        let response: MarkAllReadResponse = self
            .client
            .send_json(ApiRequest::patch(format!(
                "/bots/{}/feedbacks/mark-all-read",
                bot_id
            )))
            .await?;
        info!(bot_id = %bot_id, updated = response.updated_count, "feedback marked read");
        Ok(response)
    }

    /// Submits a feedback entry as a bot would, with optional image files.
    pub async fn create(
        &self,
        bot_id: BotId,
        data: &CreateFeedbackData,
        images: &[PathBuf],
    ) -> Result<Feedback> {
        let mut fields = vec![
            FormField::text("rating", data.rating),
            FormField::text("message_text", &data.message_text),
            FormField::text("user_telegram_id", data.user_telegram_id),
        ];
        let optional = [
            ("username", &data.username),
            ("first_name", &data.first_name),
            ("last_name", &data.last_name),
        ];
        for (name, value) in optional {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                fields.push(FormField::text(name, value));
            }
        }
        for path in images {
            fields.push(FormField::file("images", FilePart::from_path(path).await?));
        }

        let request = ApiRequest::post(format!("/bots/{}/feedbacks", bot_id)).multipart(fields);
        self.client.send_json(request).await
    }
}
