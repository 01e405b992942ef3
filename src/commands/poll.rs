use super::send_ephemeral;
use crate::handlers::platform::{DiscordRoles, member_roles};
use crate::handlers::{HandlerResult, user_message};
use crate::handlers::create::{
    FIELD_DESCRIPTION, FIELD_QUESTION, FIELD_SECTIONS, FIELD_TIME_LIMIT, FIELD_VOTING_ROLES, MODAL_PREFIX,
};
use crate::manager::PollManager;
use serenity::builder::{CreateApplicationCommand, CreateInputText};
use serenity::model::application::component::InputTextStyle;
use serenity::model::application::interaction::InteractionResponseType;
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::prelude::*;

pub const COMMAND_NAME: &str = "encuesta";

pub fn create_poll_command(command: &mut CreateApplicationCommand) -> &mut CreateApplicationCommand {
    command
        .name(COMMAND_NAME)
        .description("Crea una encuesta con secciones y opciones")
        .dm_permission(false)
}

struct ModalField {
    id: &'static str,
    label: &'static str,
    placeholder: &'static str,
    style: InputTextStyle,
    max_length: u64,
    required: bool,
}

const MODAL_FIELDS: [ModalField; 5] = [
    ModalField {
        id: FIELD_QUESTION,
        label: "Pregunta",
        placeholder: "¿Qué día prefieres para la raid?",
        style: InputTextStyle::Short,
        max_length: 200,
        required: true,
    },
    ModalField {
        id: FIELD_DESCRIPTION,
        label: "Descripción (opcional)",
        placeholder: "Contexto adicional para la encuesta",
        style: InputTextStyle::Paragraph,
        max_length: 500,
        required: false,
    },
    ModalField {
        id: FIELD_SECTIONS,
        label: "Opciones (una por línea, [Sección] opcional)",
        placeholder: "[Día]\nLunes\nMartes\n[Hora]\n20:00\n21:00",
        style: InputTextStyle::Paragraph,
        max_length: 1500,
        required: true,
    },
    ModalField {
        id: FIELD_TIME_LIMIT,
        label: "Duración en días (1-30, por defecto 2)",
        placeholder: "2",
        style: InputTextStyle::Short,
        max_length: 3,
        required: false,
    },
    ModalField {
        id: FIELD_VOTING_ROLES,
        label: "Roles que pueden votar (opcional)",
        placeholder: "raider, trial",
        style: InputTextStyle::Short,
        max_length: 200,
        required: false,
    },
];

fn input_text<'a>(input: &'a mut CreateInputText, field: &ModalField) -> &'a mut CreateInputText {
    input
        .custom_id(field.id)
        .label(field.label)
        .placeholder(field.placeholder)
        .style(field.style)
        .max_length(field.max_length)
        .required(field.required)
}

pub async fn handle_poll_command(
    manager: &PollManager,
    ctx: &Context,
    command: &ApplicationCommandInteraction,
) -> HandlerResult {
    let roles = member_roles(&DiscordRoles::new(ctx), command.member.as_ref()).await?;
    if let Err(err) = manager.authorize_create(&roles).await {
        send_ephemeral(ctx, command, &user_message(&err)).await?;
        return Ok(());
    }

    command
        .create_interaction_response(&ctx.http, |response| {
            response
                .kind(InteractionResponseType::Modal)
                .interaction_response_data(|modal| {
                    modal
                        .custom_id(format!("{}_{}", MODAL_PREFIX, command.user.id))
                        .title("Nueva encuesta")
                        .components(|components| {
                            for field in &MODAL_FIELDS {
                                components.create_action_row(|row| {
                                    row.create_input_text(|input| input_text(input, field))
                                });
                            }
                            components
                        })
                })
        })
        .await?;

    Ok(())
}
