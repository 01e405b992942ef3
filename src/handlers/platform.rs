use crate::models::UserSnapshot;
use crate::voting::DisplayTokenResolver;
use async_trait::async_trait;
use serenity::cache::Cache;
use serenity::model::guild::Member;
use serenity::model::user::User;
use serenity::prelude::*;

/// Role names of a guild member, lower-cased.
#[async_trait]
pub trait RoleDirectory: Send + Sync {
    async fn roles_of(&self, member: &Member) -> Result<Vec<String>, serenity::Error>;
}

pub struct DiscordRoles<'a> {
    ctx: &'a Context,
}

impl<'a> DiscordRoles<'a> {
    pub fn new(ctx: &'a Context) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl<'a> RoleDirectory for DiscordRoles<'a> {
    async fn roles_of(&self, member: &Member) -> Result<Vec<String>, serenity::Error> {
        let guild_roles = member.guild_id.roles(&self.ctx.http).await?;
        Ok(member
            .roles
            .iter()
            .filter_map(|role_id| guild_roles.get(role_id))
            .map(|role| role.name.to_lowercase())
            .collect())
    }
}

/// Roles of an optional member; no member (e.g. a DM) means no roles.
pub async fn member_roles(
    directory: &dyn RoleDirectory,
    member: Option<&Member>,
) -> Result<Vec<String>, serenity::Error> {
    match member {
        Some(member) => directory.roles_of(member).await,
        None => Ok(Vec::new()),
    }
}

/// Resolves `:name:` against custom emoji of every guild in the cache.
pub struct GuildEmojis<'a> {
    cache: &'a Cache,
}

impl<'a> GuildEmojis<'a> {
    pub fn new(cache: &'a Cache) -> Self {
        Self { cache }
    }
}

impl DisplayTokenResolver for GuildEmojis<'_> {
    fn resolve_display_token(&self, token: &str) -> Option<String> {
        self.cache.guilds().into_iter().find_map(|guild_id| {
            let guild = self.cache.guild(guild_id)?;
            guild
                .emojis
                .values()
                .find(|emoji| emoji.name == token)
                .map(|emoji| emoji.to_string())
        })
    }
}

/// Snapshot of the acting user; the guild nickname is used as display name.
pub fn snapshot(user: &User, member: Option<&Member>) -> UserSnapshot {
    UserSnapshot::new(
        user.id.to_string(),
        user.name.clone(),
        member.and_then(|m| m.nick.clone()),
    )
}
