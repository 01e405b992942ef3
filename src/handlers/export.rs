use super::platform::{DiscordRoles, member_roles};
use super::{HandlerResult, user_message};
use crate::config::Config;
use crate::error::PollError;
use crate::manager::PollManager;
use crate::voting::export::export_file_name;
use crate::voting::permissions;
use chrono::Utc;
use log::{info, warn};
use serenity::model::application::interaction::InteractionResponseType;
use serenity::model::application::interaction::message_component::MessageComponentInteraction;
use serenity::model::channel::AttachmentType;
use serenity::prelude::*;
use std::borrow::Cow;

pub async fn handle_export(
    manager: &PollManager,
    config: &Config,
    ctx: &Context,
    component: &MessageComponentInteraction,
    poll_id: &str,
) -> HandlerResult {
    let roles = member_roles(&DiscordRoles::new(ctx), component.member.as_ref()).await?;
    if let Err(err) = permissions::authorize(&roles, std::slice::from_ref(&config.export_role)) {
        warn!("Export of {} denied for {}", poll_id, component.user.name);
        return reply(ctx, component, &user_message(&err)).await;
    }

    let (poll, table) = match manager.get_poll(poll_id).await {
        Some(poll) => match manager.export_poll(poll_id).await {
            Ok(table) => (poll, table),
            Err(err) => return reply(ctx, component, &user_message(&err)).await,
        },
        None => return reply(ctx, component, &user_message(&PollError::NotFound(poll_id.to_string()))).await,
    };

    let csv = table.to_csv();
    let filename = export_file_name(&poll.id, Utc::now());
    let content = format!(
        "📊 **Resultados exportados**\n**Pregunta:** {}\n**Total de votos:** {}\n**Creada:** {}",
        poll.question,
        poll.total_votes(),
        poll.created_at.format("%d/%m/%Y")
    );

    component
        .create_interaction_response(&ctx.http, |response| {
            response
                .kind(InteractionResponseType::ChannelMessageWithSource)
                .interaction_response_data(|message| {
                    message
                        .content(content)
                        .add_file(AttachmentType::Bytes {
                            data: Cow::Owned(csv.into_bytes()),
                            filename: filename.clone(),
                        })
                        .ephemeral(true)
                })
        })
        .await?;

    info!("Poll {} exported by {} as {}", poll.id, component.user.name, filename);
    Ok(())
}

async fn reply(ctx: &Context, component: &MessageComponentInteraction, content: &str) -> HandlerResult {
    component
        .create_interaction_response(&ctx.http, |response| {
            response
                .kind(InteractionResponseType::ChannelMessageWithSource)
                .interaction_response_data(|message| message.content(content).ephemeral(true))
        })
        .await?;
    Ok(())
}
