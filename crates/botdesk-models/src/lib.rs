//! Core data models for BotDesk.
//!
//! Wire types shared by the API client, the status poller and the CLI:
//! authentication payloads, bots and their knowledge-base status, and
//! customer feedback.

pub mod auth;
pub mod bot;
pub mod feedback;
pub mod ids;
pub mod timestamp;

// Re-export main types
pub use auth::{
    AuthResponse, AuthTokens, EmailVerificationRequest, EmailVerificationResponse,
    GoogleAuthRequest, GoogleAuthResponse, LoginCredentials, RefreshRequest, RegisterData, User,
};
pub use bot::{
    Bot, BotStatus, BotType, CreateBotData, KnowledgeBaseFile, KnowledgeBaseState,
    KnowledgeBaseStatus, MessageResponse, UpdateBotData,
};
pub use feedback::{
    CreateFeedbackData, Feedback, FeedbackFilter, FeedbackImage, FeedbackListResponse,
    FeedbackPage, FeedbackStats, FeedbackStatus, MarkAllReadResponse, Rating, RawFeedbackStats,
    StorageType, UpdateFeedbackStatusData,
};
pub use ids::{BotId, FeedbackId, ImageId, UserId};
