//! Knowledge base commands.

use std::path::Path;

use tokio::sync::oneshot;

use botdesk_models::{BotId, KnowledgeBaseState};
use botdesk_runtime::{KnowledgePoller, PollEvent};

use super::{Context, Result};
use crate::cli::{KnowledgeCommands, OutputFormat};
use crate::output;

pub async fn execute(ctx: &Context, command: KnowledgeCommands) -> Result<()> {
    match command {
        KnowledgeCommands::Status { bot } => {
            let status = ctx.client.knowledge().status(bot).await?;
            output::emit(ctx.format, &status, output::print_knowledge_status)
        }
        KnowledgeCommands::Upload { bot, file, watch } => upload(ctx, bot, &file, watch).await,
        KnowledgeCommands::Watch { bot } => {
            let status = ctx.client.knowledge().status(bot).await?;
            if !status.knowledge_base_status.is_processing() {
                return output::emit(ctx.format, &status, output::print_knowledge_status);
            }
            wait_for_processing(ctx, bot, status.knowledge_base_status).await
        }
    }
}

async fn upload(ctx: &Context, bot: BotId, file: &Path, watch: bool) -> Result<()> {
    let response = ctx.client.knowledge().upload(bot, file).await?;
    if ctx.format == OutputFormat::Json && !watch {
        return output::print_json(&response);
    }
    println!("Uploaded {} to bot {}", file.display(), bot);
    if !watch {
        return Ok(());
    }

    let status = ctx.client.knowledge().status(bot).await?;
    if status.knowledge_base_status.is_processing() {
        wait_for_processing(ctx, bot, status.knowledge_base_status).await
    } else {
        output::emit(ctx.format, &status, output::print_knowledge_status)
    }
}

/// Follows processing until it ends or the user presses Ctrl-C.
async fn wait_for_processing(ctx: &Context, bot: BotId, status: KnowledgeBaseState) -> Result<()> {
    let poller = KnowledgePoller::for_client(ctx.client.clone(), ctx.poller.clone());
    let mut events = poller.subscribe();
    let (tx, rx) = oneshot::channel();

    let handle = poller.watch(bot, status, move |bot| {
        let _ = tx.send(bot);
    })?;
    eprintln!(
        "Waiting for bot {} knowledge base (checking every {}s, Ctrl-C to stop)...",
        bot,
        poller.config().poll_interval.as_secs_f32()
    );

    let join = handle.join();
    tokio::pin!(join);
    let final_status = loop {
        tokio::select! {
            result = &mut join => break result?,
            Ok(event) = events.recv() => report_event(&event),
            _ = tokio::signal::ctrl_c() => {
                eprintln!("Stopped watching bot {}.", bot);
                return Ok(());
            }
        }
    };

    match rx.await {
        Ok(bot) => output::emit(ctx.format, &bot, |bot| {
            println!("Knowledge base {}.", final_status);
            output::print_bot(bot, false);
        }),
        Err(_) => {
            println!("Knowledge base {}.", final_status);
            Ok(())
        }
    }
}

fn report_event(event: &PollEvent) {
    match event {
        PollEvent::StatusChanged { status, .. } => eprintln!("  status: {}", status),
        PollEvent::TickFailed { error, .. } => eprintln!("  status check failed: {}", error),
        PollEvent::BotRefreshFailed { error, .. } => {
            eprintln!("  could not reload bot: {}", error)
        }
        _ => {}
    }
}
