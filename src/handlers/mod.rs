pub mod create;
mod export;
pub mod platform;
pub mod render;
mod vote;

use crate::config::Config;
use crate::error::PollError;
use crate::manager::PollManager;
use log::{error, info, warn};
use serenity::model::application::interaction::message_component::MessageComponentInteraction;
use serenity::model::application::interaction::{Interaction, InteractionResponseType};
use serenity::prelude::*;

pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// What a component's custom id asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentAction {
    Vote { poll_id: String },
    Export { poll_id: String },
}

// Formats: poll_section_<index>_<poll_id>, poll_select_<poll_id>, export_poll_<poll_id>.
// Poll ids contain underscores, so everything after the prefix is the id.
pub fn parse_component_id(custom_id: &str) -> Option<ComponentAction> {
    if let Some(rest) = custom_id.strip_prefix("poll_section_") {
        let (index, poll_id) = rest.split_once('_')?;
        index.parse::<usize>().ok()?;
        return non_empty(poll_id).map(|poll_id| ComponentAction::Vote { poll_id });
    }
    if let Some(poll_id) = custom_id.strip_prefix("poll_select_") {
        return non_empty(poll_id).map(|poll_id| ComponentAction::Vote { poll_id });
    }
    if let Some(poll_id) = custom_id.strip_prefix("export_poll_") {
        return non_empty(poll_id).map(|poll_id| ComponentAction::Export { poll_id });
    }
    None
}

fn non_empty(poll_id: &str) -> Option<String> {
    (!poll_id.is_empty()).then(|| poll_id.to_string())
}

/// User-facing text for a core error.
pub fn user_message(err: &PollError) -> String {
    match err {
        PollError::Validation(crate::error::ValidationError::TooFewOptions { .. }) => {
            "❌ Necesitas al menos 2 opciones para crear una encuesta.".to_string()
        }
        PollError::Validation(crate::error::ValidationError::MalformedDuration(_)) => {
            "❌ La duración debe ser un número entero de días.".to_string()
        }
        PollError::Validation(crate::error::ValidationError::EmptyQuestion) => {
            "❌ La pregunta no puede estar vacía.".to_string()
        }
        PollError::NotFound(_) => "❌ Esta encuesta ya no existe.".to_string(),
        PollError::Expired(_) => "❌ Esta encuesta ha finalizado y ya no acepta votos.".to_string(),
        PollError::Permission { allowed } => {
            format!("❌ No tienes permisos para esta acción. Roles permitidos: **{}**", allowed.join(", "))
        }
        PollError::Persistence(_) => "❌ No se pudo guardar la encuesta. Por favor, inténtalo de nuevo.".to_string(),
    }
}

pub async fn handle_component(
    manager: &PollManager,
    config: &Config,
    ctx: &Context,
    component: &MessageComponentInteraction,
) -> HandlerResult {
    let custom_id = &component.data.custom_id;
    info!("Received component interaction: {}", custom_id);

    match parse_component_id(custom_id) {
        Some(ComponentAction::Vote { poll_id }) => vote::handle_vote_select(manager, ctx, component, &poll_id).await,
        Some(ComponentAction::Export { poll_id }) => {
            export::handle_export(manager, config, ctx, component, &poll_id).await
        }
        None => {
            warn!("Unhandled component custom_id: {}", custom_id);
            component
                .create_interaction_response(&ctx.http, |response| {
                    response
                        .kind(InteractionResponseType::ChannelMessageWithSource)
                        .interaction_response_data(|message| message.content("Acción desconocida.").ephemeral(true))
                })
                .await?;
            Ok(())
        }
    }
}

pub async fn handle_interaction(manager: &PollManager, config: &Config, ctx: &Context, interaction: Interaction) {
    let result = match interaction {
        Interaction::ApplicationCommand(ref command) => crate::commands::handle_command(manager, ctx, command).await,
        Interaction::MessageComponent(ref component) => handle_component(manager, config, ctx, component).await,
        Interaction::ModalSubmit(ref modal) => {
            if modal.data.custom_id.starts_with(create::MODAL_PREFIX) {
                create::handle_poll_modal(manager, ctx, modal).await
            } else {
                warn!("Unhandled modal custom_id: {}", modal.data.custom_id);
                Ok(())
            }
        }
        _ => {
            warn!("Unhandled interaction type: {:?}", interaction.kind());
            Ok(())
        }
    };

    if let Err(why) = result {
        error!("Interaction handler error: {:?}", why);
    }
}
