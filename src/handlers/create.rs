use super::platform::{DiscordRoles, GuildEmojis, member_roles, snapshot};
use super::render::{poll_components, poll_embed, voting_menus};
use super::{HandlerResult, user_message};
use crate::manager::{NewPoll, PollManager};
use crate::voting::results::calculate_results;
use chrono::Utc;
use log::{error, info, warn};
use serenity::model::application::component::ActionRowComponent;
use serenity::model::application::interaction::InteractionResponseType;
use serenity::model::application::interaction::modal::ModalSubmitInteraction;
use serenity::prelude::*;
use std::collections::HashMap;

pub const MODAL_PREFIX: &str = "poll_modal";

pub const FIELD_QUESTION: &str = "poll_question";
pub const FIELD_DESCRIPTION: &str = "poll_description";
pub const FIELD_SECTIONS: &str = "poll_sections";
pub const FIELD_TIME_LIMIT: &str = "poll_time_limit";
pub const FIELD_VOTING_ROLES: &str = "poll_voting_roles";

fn input_values(modal: &ModalSubmitInteraction) -> HashMap<String, String> {
    modal
        .data
        .components
        .iter()
        .flat_map(|row| row.components.iter())
        .filter_map(|component| match component {
            ActionRowComponent::InputText(input) => Some((input.custom_id.clone(), input.value.clone())),
            _ => None,
        })
        .collect()
}

pub async fn handle_poll_modal(manager: &PollManager, ctx: &Context, modal: &ModalSubmitInteraction) -> HandlerResult {
    // Roles may have changed between opening the modal and submitting it.
    let roles = member_roles(&DiscordRoles::new(ctx), modal.member.as_ref()).await?;
    if let Err(err) = manager.authorize_create(&roles).await {
        return reply_ephemeral(ctx, modal, &user_message(&err)).await;
    }

    let mut values = input_values(modal);
    let request = NewPoll {
        sections_text: values.remove(FIELD_SECTIONS).unwrap_or_default(),
        question: values.remove(FIELD_QUESTION).unwrap_or_default(),
        description: values.remove(FIELD_DESCRIPTION),
        duration_days: values.remove(FIELD_TIME_LIMIT),
        voting_roles: values.remove(FIELD_VOTING_ROLES),
        author: snapshot(&modal.user, modal.member.as_ref()),
        channel_id: modal.channel_id.to_string(),
    };

    let poll = match manager.create_poll(request).await {
        Ok(poll) => poll,
        Err(err) => {
            warn!("Poll creation by {} rejected: {}", modal.user.name, err);
            return reply_ephemeral(ctx, modal, &user_message(&err)).await;
        }
    };

    let summary = calculate_results(&poll, Utc::now(), &GuildEmojis::new(&ctx.cache));
    let (menus, hidden) = voting_menus(&poll);
    let notice = (hidden > 0).then(|| {
        format!(
            "⚠️ Solo se muestran las primeras 25 opciones en el menú. Total de opciones: {}",
            poll.options.len()
        )
    });

    let posted = modal
        .create_interaction_response(&ctx.http, |response| {
            response
                .kind(InteractionResponseType::ChannelMessageWithSource)
                .interaction_response_data(|message| {
                    if let Some(notice) = &notice {
                        message.content(notice);
                    }
                    message
                        .embed(|embed| poll_embed(embed, &poll, &summary))
                        .components(|components| poll_components(components, &poll.id, &menus))
                })
        })
        .await;

    if let Err(why) = posted {
        error!("Failed to post poll {}: {:?}", poll.id, why);
        if let Err(e) = manager.polls().delete_poll(&poll.id).await {
            error!("Failed to discard unposted poll {}: {}", poll.id, e);
        }
        return Err(why.into());
    }

    let message = modal.get_interaction_response(&ctx.http).await?;
    manager.set_message_id(&poll.id, &message.id.to_string()).await?;
    info!("Poll {} posted as message {}", poll.id, message.id);

    Ok(())
}

async fn reply_ephemeral(ctx: &Context, modal: &ModalSubmitInteraction, content: &str) -> HandlerResult {
    modal
        .create_interaction_response(&ctx.http, |response| {
            response
                .kind(InteractionResponseType::ChannelMessageWithSource)
                .interaction_response_data(|message| message.content(content).ephemeral(true))
        })
        .await?;
    Ok(())
}
