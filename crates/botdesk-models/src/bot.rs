//! Bot resources and knowledge-base status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ids::{BotId, UserId};
use crate::timestamp;

/// Kind of bot the backend generates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BotType {
    /// Free-form conversational bot.
    #[default]
    SimpleChat,
    /// Q&A bot answering from an uploaded knowledge base.
    QaKnowledgeBase,
    /// Bot collecting customer feedback.
    #[serde(rename = "qa_feedback")]
    QaFeedbackBot,
}

impl BotType {
    /// Wire name of the bot type.
    pub fn as_str(&self) -> &'static str {
        match self {
            BotType::SimpleChat => "simple_chat",
            BotType::QaKnowledgeBase => "qa_knowledge_base",
            BotType::QaFeedbackBot => "qa_feedback",
        }
    }

    /// Whether bots of this type carry a knowledge base.
    pub fn uses_knowledge_base(&self) -> bool {
        matches!(self, BotType::QaKnowledgeBase)
    }
}

impl fmt::Display for BotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BotType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "simple_chat" | "chat" => Ok(BotType::SimpleChat),
            "qa_knowledge_base" | "qa" => Ok(BotType::QaKnowledgeBase),
            "qa_feedback" | "feedback" => Ok(BotType::QaFeedbackBot),
            other => Err(format!("unknown bot type: {}", other)),
        }
    }
}

/// Lifecycle status of a bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BotStatus {
    Created,
    Generating,
    Ready,
    Deployed,
    Stopped,
    Error,
}

impl fmt::Display for BotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BotStatus::Created => "created",
            BotStatus::Generating => "generating",
            BotStatus::Ready => "ready",
            BotStatus::Deployed => "deployed",
            BotStatus::Stopped => "stopped",
            BotStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// Processing state of a bot's knowledge base.
///
/// `Processing` is the only non-terminal state; a status watch is armed only
/// while the backend reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum KnowledgeBaseState {
    #[default]
    Empty,
    Processing,
    Ready,
    Failed,
}

impl KnowledgeBaseState {
    /// Returns true while the backend is still ingesting documents.
    pub fn is_processing(&self) -> bool {
        matches!(self, KnowledgeBaseState::Processing)
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            KnowledgeBaseState::Empty => "No Knowledge Base",
            KnowledgeBaseState::Processing => "Processing",
            KnowledgeBaseState::Ready => "Ready",
            KnowledgeBaseState::Failed => "Failed",
        }
    }
}

impl fmt::Display for KnowledgeBaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            KnowledgeBaseState::Empty => "empty",
            KnowledgeBaseState::Processing => "processing",
            KnowledgeBaseState::Ready => "ready",
            KnowledgeBaseState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// A bot owned by the current user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bot {
    pub id: BotId,
    pub owner_id: UserId,
    pub bot_name: String,
    #[serde(default)]
    pub requirements: String,
    #[serde(default)]
    pub bot_token: String,
    #[serde(default)]
    pub bot_type: BotType,
    #[serde(default)]
    pub generated_code: Option<String>,
    pub status: BotStatus,
    #[serde(default)]
    pub is_running: bool,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub pid: Option<i64>,
    #[serde(default)]
    pub knowledge_base_status: KnowledgeBaseState,
}

impl Bot {
    /// Telegram token with everything but the bot id prefix masked.
    pub fn masked_token(&self) -> String {
        match self.bot_token.split_once(':') {
            Some((prefix, _)) => format!("{}:****", prefix),
            None if self.bot_token.is_empty() => String::new(),
            None => "****".to_string(),
        }
    }
}

/// Body of `POST /bots/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBotData {
    pub bot_name: String,
    pub requirements: String,
    pub bot_token: String,
    pub bot_type: BotType,
}

/// Body of `PUT /bots/{id}`; unset fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateBotData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bot_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirements: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bot_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bot_type: Option<BotType>,
}

impl UpdateBotData {
    /// Returns true if no field would be changed.
    pub fn is_empty(&self) -> bool {
        self.bot_name.is_none()
            && self.requirements.is_none()
            && self.bot_token.is_none()
            && self.bot_type.is_none()
    }
}

/// Response of `GET /ai/bots/{id}/knowledge/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeBaseStatus {
    pub bot_id: BotId,
    pub knowledge_base_status: KnowledgeBaseState,
    pub bot_type: BotType,
}

/// A document stored in a bot's knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeBaseFile {
    pub id: String,
    pub filename: String,
    pub original_name: String,
    pub file_size: u64,
    pub upload_date: String,
    pub status: KnowledgeBaseState,
}

/// Generic `{ "message": ... }` acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}
