//! Rendering of API resources for the terminal.

use serde::Serialize;

use botdesk_models::{Bot, Feedback, FeedbackStats, KnowledgeBaseStatus, User};

use crate::cli::OutputFormat;
use crate::commands::Result;

/// Prints `value` as pretty JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Prints `value` as JSON or with the given table renderer.
pub fn emit<T: Serialize + ?Sized>(
    format: OutputFormat,
    value: &T,
    table: impl FnOnce(&T),
) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(value),
        OutputFormat::Table => {
            table(value);
            Ok(())
        }
    }
}

pub fn print_user(user: &User) {
    println!("User: {} ({})", user.full_name, user.id);
    println!("  Email: {}", user.email);
    println!("  Verified: {}", if user.is_verified { "yes" } else { "no" });
}

pub fn print_bot_table(bots: &[Bot]) {
    if bots.is_empty() {
        println!("No bots found.");
        return;
    }

    println!(
        "{:<6}  {:<24}  {:<18}  {:<10}  {:<8}  KNOWLEDGE",
        "ID", "NAME", "TYPE", "STATUS", "RUNNING"
    );
    println!("{}", "-".repeat(90));
    for bot in bots {
        println!(
            "{:<6}  {:<24}  {:<18}  {:<10}  {:<8}  {}",
            bot.id,
            truncate(&bot.bot_name, 24),
            bot.bot_type,
            bot.status,
            if bot.is_running { "yes" } else { "no" },
            knowledge_label(bot)
        );
    }
    println!("\n{} bot(s)", bots.len());
}

pub fn print_bot(bot: &Bot, with_code: bool) {
    println!("Bot: {} ({})", bot.bot_name, bot.id);
    println!("  Type: {}", bot.bot_type);
    println!("  Status: {}", bot.status);
    println!("  Running: {}", if bot.is_running { "yes" } else { "no" });
    if let Some(pid) = bot.pid {
        println!("  PID: {}", pid);
    }
    println!("  Token: {}", bot.masked_token());
    println!("  Knowledge base: {}", knowledge_label(bot));
    println!("  Created: {}", bot.created_at.format("%Y-%m-%d %H:%M"));
    println!("  Requirements: {}", bot.requirements);
    if with_code {
        match &bot.generated_code {
            Some(code) => println!("\n{}", code),
            None => println!("\n(no code generated yet)"),
        }
    }
}

pub fn print_knowledge_status(status: &KnowledgeBaseStatus) {
    println!(
        "Bot {} ({}): {}",
        status.bot_id,
        status.bot_type,
        status.knowledge_base_status.label()
    );
}

pub fn print_feedback_table(feedbacks: &[Feedback], total: u64) {
    if feedbacks.is_empty() {
        println!("No feedback found.");
        return;
    }

    println!(
        "{:<6}  {:<6}  {:<9}  {:<20}  {:<16}  MESSAGE",
        "ID", "RATING", "STATUS", "AUTHOR", "CREATED"
    );
    println!("{}", "-".repeat(100));
    for feedback in feedbacks {
        println!(
            "{:<6}  {:<6}  {:<9}  {:<20}  {:<16}  {}",
            feedback.id,
            stars(feedback.rating.get()),
            feedback.status,
            truncate(&feedback.author(), 20),
            feedback.created_at.format("%Y-%m-%d %H:%M"),
            truncate(&feedback.message_text, 40)
        );
    }
    println!("\n{} of {} feedback entries", feedbacks.len(), total);
}

pub fn print_feedback(feedback: &Feedback) {
    println!("Feedback {} for bot {}", feedback.id, feedback.bot_id);
    println!("  Author: {}", feedback.author());
    println!("  Rating: {}", stars(feedback.rating.get()));
    println!("  Status: {}", feedback.status);
    println!("  Created: {}", feedback.created_at.format("%Y-%m-%d %H:%M"));
    println!("\n{}", feedback.message_text);
    if !feedback.images.is_empty() {
        println!("\nImages:");
        for image in &feedback.images {
            println!("  {} ({} bytes) {}", image.original_filename, image.file_size, image.file_path);
        }
    }
}

pub fn print_feedback_stats(stats: &FeedbackStats) {
    println!("Total: {}", stats.total_feedbacks);
    println!("  New: {}", stats.new_feedbacks);
    println!("  Read: {}", stats.read_feedbacks);
    println!("  Resolved: {}", stats.resolved_feedbacks);
    println!("Average rating: {:.1}", stats.average_rating);
    for (star, count) in stats.rating_distribution.iter().rev() {
        println!("  {}  {}", stars(*star), count);
    }
}

fn knowledge_label(bot: &Bot) -> &'static str {
    if bot.bot_type.uses_knowledge_base() {
        bot.knowledge_base_status.label()
    } else {
        "-"
    }
}

fn stars(rating: u8) -> String {
    let filled = usize::from(rating.min(5));
    format!("{}{}", "*".repeat(filled), ".".repeat(5 - filled))
}

/// Truncates a string to the given number of characters, adding "..." if
/// truncated.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
