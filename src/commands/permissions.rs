use super::send_ephemeral;
use crate::handlers::{HandlerResult, user_message};
use crate::manager::PollManager;
use crate::models::{PermissionKind, Permissions};
use crate::voting::parser::parse_role_list;
use log::warn;
use serenity::builder::CreateApplicationCommand;
use serenity::model::application::command::CommandOptionType;
use serenity::model::application::interaction::application_command::{
    ApplicationCommandInteraction, CommandDataOption,
};
use serenity::model::permissions::Permissions as DiscordPermissions;
use serenity::prelude::*;

pub const COMMAND_NAME: &str = "permisos";

pub fn create_permissions_command(command: &mut CreateApplicationCommand) -> &mut CreateApplicationCommand {
    command
        .name(COMMAND_NAME)
        .description("Configura qué roles pueden crear encuestas y votar")
        .default_member_permissions(DiscordPermissions::ADMINISTRATOR)
        .dm_permission(false)
        .create_option(|option| {
            option
                .name("crear")
                .description("Roles que pueden crear encuestas")
                .kind(CommandOptionType::SubCommand)
                .create_sub_option(|sub_option| {
                    sub_option
                        .name("roles")
                        .description("Lista de roles separados por comas")
                        .kind(CommandOptionType::String)
                        .required(true)
                })
        })
        .create_option(|option| {
            option
                .name("votar")
                .description("Roles que pueden votar por defecto")
                .kind(CommandOptionType::SubCommand)
                .create_sub_option(|sub_option| {
                    sub_option
                        .name("roles")
                        .description("Lista de roles separados por comas")
                        .kind(CommandOptionType::String)
                        .required(true)
                })
        })
        .create_option(|option| {
            option
                .name("ver")
                .description("Muestra la configuración actual")
                .kind(CommandOptionType::SubCommand)
        })
}

fn subcommand_kind(name: &str) -> Option<PermissionKind> {
    match name {
        "crear" => Some(PermissionKind::Create),
        "votar" => Some(PermissionKind::Vote),
        _ => None,
    }
}

fn roles_argument(subcommand: &CommandDataOption) -> Option<&str> {
    subcommand
        .options
        .iter()
        .find(|option| option.name == "roles")
        .and_then(|option| option.value.as_ref())
        .and_then(|value| value.as_str())
}

fn describe(permissions: &Permissions) -> String {
    format!(
        "🔐 **Permisos actuales**\n**Crear encuestas:** {}\n**Votar:** {}",
        permissions.create_poll.join(", "),
        permissions.vote.join(", ")
    )
}

pub async fn handle_permissions_command(
    manager: &PollManager,
    ctx: &Context,
    command: &ApplicationCommandInteraction,
) -> HandlerResult {
    let is_admin = command
        .member
        .as_ref()
        .and_then(|member| member.permissions)
        .map(|permissions| permissions.administrator())
        .unwrap_or(false);
    if !is_admin {
        warn!("Non-admin {} tried /{}", command.user.name, COMMAND_NAME);
        send_ephemeral(ctx, command, "❌ Solo los administradores pueden configurar permisos.").await?;
        return Ok(());
    }

    let subcommand = match command.data.options.first() {
        Some(option) => option,
        None => {
            send_ephemeral(ctx, command, "❌ Falta el subcomando.").await?;
            return Ok(());
        }
    };

    if subcommand.name == "ver" {
        let current = manager.get_permissions().await;
        send_ephemeral(ctx, command, &describe(&current)).await?;
        return Ok(());
    }

    let kind = match subcommand_kind(&subcommand.name) {
        Some(kind) => kind,
        None => {
            send_ephemeral(ctx, command, "❌ Subcomando desconocido.").await?;
            return Ok(());
        }
    };

    let roles = parse_role_list(roles_argument(subcommand).unwrap_or_default());
    if roles.is_empty() {
        send_ephemeral(ctx, command, "❌ Indica al menos un rol.").await?;
        return Ok(());
    }

    let reply = match manager.set_permissions(kind, roles).await {
        Ok(updated) => format!("✅ Permisos actualizados.\n{}", describe(&updated)),
        Err(err) => user_message(&err),
    };
    send_ephemeral(ctx, command, &reply).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subcommands_map_to_permission_kinds() {
        assert_eq!(subcommand_kind("crear"), Some(PermissionKind::Create));
        assert_eq!(subcommand_kind("votar"), Some(PermissionKind::Vote));
        assert_eq!(subcommand_kind("ver"), None);
    }

    #[test]
    fn describe_lists_both_allow_lists() {
        let text = describe(&Permissions::default());
        assert!(text.contains("**Crear encuestas:** oficial, admin"));
        assert!(text.contains("**Votar:** miembro, raider, trial, oficial, admin"));
    }
}
