//! Typed wrappers over the REST endpoints.

mod auth;
mod bots;
mod feedback;
mod knowledge;

pub use auth::{map_google_error, map_verification_error, AuthService};
pub use bots::BotService;
pub use feedback::FeedbackService;
pub use knowledge::KnowledgeService;
