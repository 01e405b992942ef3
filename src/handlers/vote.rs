use super::platform::{DiscordRoles, GuildEmojis, member_roles, snapshot};
use super::render::{poll_components, poll_embed, voting_menus};
use super::{HandlerResult, user_message};
use crate::error::PollError;
use crate::manager::PollManager;
use crate::voting::results::calculate_results;
use chrono::Utc;
use log::{error, warn};
use serenity::model::application::component::ComponentType;
use serenity::model::application::interaction::InteractionResponseType;
use serenity::model::application::interaction::message_component::MessageComponentInteraction;
use serenity::prelude::*;

pub async fn handle_vote_select(
    manager: &PollManager,
    ctx: &Context,
    component: &MessageComponentInteraction,
    poll_id: &str,
) -> HandlerResult {
    if component.data.component_type != ComponentType::SelectMenu {
        warn!("Vote component {} is not a select menu", component.data.custom_id);
        return Ok(());
    }
    let option_key = match component.data.values.first() {
        Some(value) => value.clone(),
        None => return Ok(()),
    };

    let poll = match manager.get_poll(poll_id).await {
        Some(poll) => poll,
        None => return reply_error(ctx, component, &PollError::NotFound(poll_id.to_string())).await,
    };

    let roles = match member_roles(&DiscordRoles::new(ctx), component.member.as_ref()).await {
        Ok(roles) => roles,
        Err(why) => {
            error!("Failed to fetch roles for {}: {:?}", component.user.name, why);
            component
                .create_interaction_response(&ctx.http, |response| {
                    response
                        .kind(InteractionResponseType::ChannelMessageWithSource)
                        .interaction_response_data(|message| {
                            message
                                .content("❌ No se pudieron verificar tus roles. Inténtalo de nuevo.")
                                .ephemeral(true)
                        })
                })
                .await?;
            return Ok(());
        }
    };
    if let Err(err) = manager.authorize_vote(&poll, &roles).await {
        return reply_error(ctx, component, &err).await;
    }

    let voter = snapshot(&component.user, component.member.as_ref());
    let poll = match manager.cast_vote(poll_id, &option_key, voter).await {
        Ok(poll) => poll,
        Err(err) => return reply_error(ctx, component, &err).await,
    };

    let summary = calculate_results(&poll, Utc::now(), &GuildEmojis::new(&ctx.cache));
    let (menus, _) = voting_menus(&poll);

    component
        .create_interaction_response(&ctx.http, |response| {
            response
                .kind(InteractionResponseType::UpdateMessage)
                .interaction_response_data(|message| {
                    message
                        .embed(|embed| poll_embed(embed, &poll, &summary))
                        .components(|components| poll_components(components, &poll.id, &menus))
                })
        })
        .await?;

    Ok(())
}

async fn reply_error(ctx: &Context, component: &MessageComponentInteraction, err: &PollError) -> HandlerResult {
    warn!("Vote by {} rejected: {}", component.user.name, err);
    component
        .create_interaction_response(&ctx.http, |response| {
            response
                .kind(InteractionResponseType::ChannelMessageWithSource)
                .interaction_response_data(|message| message.content(user_message(err)).ephemeral(true))
        })
        .await?;
    Ok(())
}
