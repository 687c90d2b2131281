//! Bot management commands.

use botdesk_models::{CreateBotData, UpdateBotData};

use super::{Context, Result};
use crate::cli::{BotCommands, UpdateArgs};
use crate::output;

pub async fn execute(ctx: &Context, command: BotCommands) -> Result<()> {
    let bots = ctx.client.bots();
    match command {
        BotCommands::List => {
            let list = bots.list().await?;
            output::emit(ctx.format, &list, |list| output::print_bot_table(list))
        }
        BotCommands::Show { id, code } => {
            let bot = bots.get(id).await?;
            output::emit(ctx.format, &bot, |bot| output::print_bot(bot, code))
        }
        BotCommands::Create {
            name,
            requirements,
            token,
            bot_type,
        } => {
            let bot = bots
                .create(&CreateBotData {
                    bot_name: name,
                    requirements,
                    bot_token: token,
                    bot_type,
                })
                .await?;
            output::emit(ctx.format, &bot, |bot| {
                println!("Created bot {} ({})", bot.bot_name, bot.id);
                println!("Next: `botdesk bots generate {}`", bot.id);
            })
        }
        BotCommands::Update(args) => {
            let id = args.id;
            let bot = bots.update(id, &update_data(args)).await?;
            output::emit(ctx.format, &bot, |bot| output::print_bot(bot, false))
        }
        BotCommands::Delete { id } => {
            bots.delete(id).await?;
            println!("Deleted bot {}", id);
            Ok(())
        }
        BotCommands::Generate { id } => {
            println!("Generating code for bot {}...", id);
            let bot = bots.generate(id).await?;
            output::emit(ctx.format, &bot, |bot| output::print_bot(bot, true))
        }
        BotCommands::Deploy { id } => {
            let response = bots.deploy(id).await?;
            output::emit(ctx.format, &response, |r| println!("{}", r.message))
        }
        BotCommands::Stop { id } => {
            let response = bots.stop(id).await?;
            output::emit(ctx.format, &response, |r| println!("{}", r.message))
        }
    }
}

fn update_data(args: UpdateArgs) -> UpdateBotData {
    UpdateBotData {
        bot_name: args.name,
        requirements: args.requirements,
        bot_token: args.token,
        bot_type: args.bot_type,
    }
}
