//! Feedback review commands.

use botdesk_models::{CreateFeedbackData, FeedbackFilter};

use super::{Context, Result};
use crate::cli::{FeedbackCommands, FeedbackListArgs, FeedbackSubmitArgs};
use crate::output;

pub async fn execute(ctx: &Context, command: FeedbackCommands) -> Result<()> {
    let feedback = ctx.client.feedback();
    match command {
        FeedbackCommands::List(args) => {
            let page = feedback.list(args.bot, &list_filter(&args)).await?;
            output::emit(ctx.format, &page, |page| {
                output::print_feedback_table(&page.feedbacks, page.total)
            })
        }
        FeedbackCommands::Show { bot, id } => {
            let entry = feedback.get(bot, id).await?;
            output::emit(ctx.format, &entry, output::print_feedback)
        }
        FeedbackCommands::SetStatus { bot, id, status } => {
            let entry = feedback.update_status(bot, id, status).await?;
            output::emit(ctx.format, &entry, |entry| {
                println!("Feedback {} is now {}", entry.id, entry.status)
            })
        }
        FeedbackCommands::Delete { bot, id } => {
            feedback.delete(bot, id).await?;
            println!("Deleted feedback {}", id);
            Ok(())
        }
        FeedbackCommands::Stats { bot } => {
            let stats = feedback.stats(bot).await?;
            output::emit(ctx.format, &stats, output::print_feedback_stats)
        }
        FeedbackCommands::MarkAllRead { bot } => {
            let response = feedback.mark_all_read(bot).await?;
            output::emit(ctx.format, &response, |r| {
                println!("Marked {} feedback entries as read", r.updated_count)
            })
        }
        FeedbackCommands::Submit(args) => {
            let entry = feedback
                .create(args.bot, &submit_data(&args), &args.images)
                .await?;
            output::emit(ctx.format, &entry, output::print_feedback)
        }
    }
}

fn list_filter(args: &FeedbackListArgs) -> FeedbackFilter {
    FeedbackFilter {
        status: args.status,
        rating: args.rating,
        page: args.page,
        limit: args.limit,
    }
}

fn submit_data(args: &FeedbackSubmitArgs) -> CreateFeedbackData {
    CreateFeedbackData {
        rating: args.rating,
        message_text: args.message.clone(),
        user_telegram_id: args.telegram_id,
        username: args.username.clone(),
        first_name: None,
        last_name: None,
    }
}
