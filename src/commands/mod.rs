mod permissions;
mod poll;

use crate::handlers::HandlerResult;
use crate::manager::PollManager;
use log::info;
use serenity::builder::CreateApplicationCommands;
use serenity::model::application::command::Command;
use serenity::model::application::interaction::InteractionResponseType;
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::model::id::GuildId;
use serenity::prelude::*;

fn create_commands(commands: &mut CreateApplicationCommands) -> &mut CreateApplicationCommands {
    commands
        .create_application_command(|command| poll::create_poll_command(command))
        .create_application_command(|command| permissions::create_permissions_command(command))
}

/// Register on one guild when given (instant), otherwise globally.
pub async fn register_commands(ctx: &Context, guild_id: Option<GuildId>) -> Result<(), serenity::Error> {
    match guild_id {
        Some(guild_id) => {
            guild_id.set_application_commands(&ctx.http, create_commands).await?;
            info!("Registered slash commands on guild {}", guild_id);
        }
        None => {
            Command::set_global_application_commands(&ctx.http, create_commands).await?;
            info!("Registered global slash commands");
        }
    }
    Ok(())
}

pub async fn handle_command(
    manager: &PollManager,
    ctx: &Context,
    command: &ApplicationCommandInteraction,
) -> HandlerResult {
    match command.data.name.as_str() {
        poll::COMMAND_NAME => poll::handle_poll_command(manager, ctx, command).await?,
        permissions::COMMAND_NAME => permissions::handle_permissions_command(manager, ctx, command).await?,
        _ => {
            send_ephemeral(ctx, command, "Comando desconocido").await?;
        }
    }

    Ok(())
}

async fn send_ephemeral(
    ctx: &Context,
    command: &ApplicationCommandInteraction,
    content: &str,
) -> Result<(), serenity::Error> {
    command
        .create_interaction_response(&ctx.http, |response| {
            response
                .kind(InteractionResponseType::ChannelMessageWithSource)
                .interaction_response_data(|message| message.content(content).ephemeral(true))
        })
        .await
}
