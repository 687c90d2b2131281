//! Customer feedback collected by feedback bots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::ids::{BotId, FeedbackId, ImageId};
use crate::timestamp;

/// Star rating in the range 1..=5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// Creates a rating, rejecting values outside 1..=5.
    pub fn new(value: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&value).then_some(Self(value))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rating {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Rating::new(value).ok_or_else(|| format!("rating must be between 1 and 5, got {}", value))
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Rating {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: u8 = s.trim().parse().map_err(|_| format!("invalid rating: {}", s))?;
        Rating::try_from(value)
    }
}

/// Review status of a feedback entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackStatus {
    New,
    Read,
    Resolved,
}

impl FeedbackStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackStatus::New => "new",
            FeedbackStatus::Read => "read",
            FeedbackStatus::Resolved => "resolved",
        }
    }
}

impl fmt::Display for FeedbackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeedbackStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(FeedbackStatus::New),
            "read" => Ok(FeedbackStatus::Read),
            "resolved" => Ok(FeedbackStatus::Resolved),
            other => Err(format!("unknown feedback status: {}", other)),
        }
    }
}

/// Where an attached image is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageType {
    Local,
    Azure,
}

/// An image attached to a feedback entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackImage {
    pub id: ImageId,
    pub feedback_id: FeedbackId,
    /// URL the image can be viewed at.
    pub file_path: String,
    pub storage_type: StorageType,
    pub file_size: u64,
    pub original_filename: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

/// A feedback entry left by a Telegram user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    pub id: FeedbackId,
    pub bot_id: BotId,
    pub user_telegram_id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    pub rating: Rating,
    pub message_text: String,
    pub status: FeedbackStatus,
    #[serde(default)]
    pub images: Vec<FeedbackImage>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Feedback {
    /// Best display name for the author.
    pub fn author(&self) -> String {
        if let Some(username) = &self.username {
            return format!("@{}", username);
        }
        let full = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        if full.is_empty() {
            self.user_telegram_id.to_string()
        } else {
            full
        }
    }
}

/// Aggregated feedback statistics for one bot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackStats {
    pub total_feedbacks: u64,
    pub new_feedbacks: u64,
    pub read_feedbacks: u64,
    pub resolved_feedbacks: u64,
    pub average_rating: f64,
    pub rating_distribution: BTreeMap<u8, u64>,
}

/// Statistics as the backend reports them.
///
/// Counter names differ from [`FeedbackStats`]: `replied_count` is what the
/// dashboard calls resolved.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFeedbackStats {
    #[serde(default)]
    pub total_count: Option<u64>,
    #[serde(default)]
    pub new_count: Option<u64>,
    #[serde(default)]
    pub read_count: Option<u64>,
    #[serde(default)]
    pub replied_count: Option<u64>,
    #[serde(default)]
    pub average_rating: Option<f64>,
    #[serde(default)]
    pub rating_distribution: Option<BTreeMap<u8, u64>>,
}

impl From<RawFeedbackStats> for FeedbackStats {
    fn from(raw: RawFeedbackStats) -> Self {
        let rating_distribution = raw.rating_distribution.unwrap_or_else(|| {
            (Rating::MIN..=Rating::MAX).map(|star| (star, 0)).collect()
        });
        Self {
            total_feedbacks: raw.total_count.unwrap_or(0),
            new_feedbacks: raw.new_count.unwrap_or(0),
            read_feedbacks: raw.read_count.unwrap_or(0),
            resolved_feedbacks: raw.replied_count.unwrap_or(0),
            average_rating: raw.average_rating.unwrap_or(0.0),
            rating_distribution,
        }
    }
}

/// Body of `PATCH /bots/{id}/feedbacks/{fid}/status`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct UpdateFeedbackStatusData {
    pub status: FeedbackStatus,
}

/// Response of `PATCH /bots/{id}/feedbacks/mark-all-read`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MarkAllReadResponse {
    pub updated_count: u64,
}

/// Text fields of a new feedback entry; images travel as multipart parts.
#[derive(Debug, Clone)]
pub struct CreateFeedbackData {
    pub rating: Rating,
    pub message_text: String,
    pub user_telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Filter and paging options for listing feedback.
#[derive(Debug, Clone, Default)]
pub struct FeedbackFilter {
    /// `None` means all statuses.
    pub status: Option<FeedbackStatus>,
    /// `None` means all ratings.
    pub rating: Option<Rating>,
    /// 1-based page number.
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl FeedbackFilter {
    /// Page size used for the skip computation when no limit is given.
    pub const DEFAULT_LIMIT: u32 = 100;

    pub fn with_status(mut self, status: FeedbackStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_rating(mut self, rating: Rating) -> Self {
        self.rating = Some(rating);
        self
    }

    pub fn with_page(mut self, page: u32, limit: u32) -> Self {
        self.page = Some(page);
        self.limit = Some(limit);
        self
    }

    /// Query parameters understood by the list endpoint.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(status) = self.status {
            pairs.push(("status", status.to_string()));
        }
        if let Some(rating) = self.rating {
            pairs.push(("rating", rating.to_string()));
        }
        if let Some(page) = self.page.filter(|p| *p > 0) {
            let limit = self.limit.unwrap_or(Self::DEFAULT_LIMIT);
            let skip = u64::from(page - 1) * u64::from(limit);
            pairs.push(("skip", skip.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        pairs
    }
}

/// One page of feedback entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackPage {
    pub feedbacks: Vec<Feedback>,
    pub total: u64,
}

/// The list endpoint answers either with a bare array or a paged object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FeedbackListResponse {
    Paged(FeedbackPage),
    Bare(Vec<Feedback>),
}

impl From<FeedbackListResponse> for FeedbackPage {
    fn from(resp: FeedbackListResponse) -> Self {
        match resp {
            FeedbackListResponse::Paged(page) => page,
            FeedbackListResponse::Bare(feedbacks) => {
                let total = feedbacks.len() as u64;
                FeedbackPage { feedbacks, total }
            }
        }
    }
}
