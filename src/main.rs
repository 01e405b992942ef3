use log::{error, info};
use serenity::async_trait;
use serenity::model::application::interaction::Interaction;
use serenity::model::gateway::Ready;
use serenity::model::id::GuildId;
use serenity::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use trusty_survey::config::Config;
use trusty_survey::manager::PollManager;
use trusty_survey::{commands, handlers, tasks};

struct Bot {
    manager: Arc<PollManager>,
    config: Arc<Config>,
    // `ready` fires again on reconnect.
    cleanup_started: AtomicBool,
}

#[async_trait]
impl EventHandler for Bot {
    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let manager = Arc::clone(&self.manager);
        let config = Arc::clone(&self.config);

        tokio::spawn(async move {
            handlers::handle_interaction(&manager, &config, &ctx, interaction).await;
        });
    }

    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("{} is connected!", ready.user.name);

        let guild_id = self.config.guild_id.map(GuildId);
        if let Err(why) = commands::register_commands(&ctx, guild_id).await {
            error!("Failed to register slash commands: {:?}", why);
        }

        if !self.cleanup_started.swap(true, Ordering::SeqCst) {
            let manager = Arc::clone(&self.manager);
            let interval_secs = self.config.cleanup_interval_secs;
            let max_age_hours = self.config.cleanup_max_age_hours;
            tokio::spawn(async move {
                tasks::cleanup::cleanup_old_polls_task(manager, interval_secs, max_age_hours).await;
            });
        }
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = match Config::from_env() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return;
        }
    };

    let manager = match PollManager::open(&config.data_dir).await {
        Ok(manager) => Arc::new(manager),
        Err(e) => {
            error!("Failed to open poll storage in {}: {}", config.data_dir.display(), e);
            return;
        }
    };
    info!("Loaded {} poll(s) from {}", manager.polls().len().await, manager.polls().path().display());

    let intents = GatewayIntents::GUILDS | GatewayIntents::GUILD_EMOJIS_AND_STICKERS;

    let mut client = match Client::builder(&config.discord_token, intents)
        .event_handler(Bot {
            manager,
            config: Arc::clone(&config),
            cleanup_started: AtomicBool::new(false),
        })
        .await
    {
        Ok(client) => client,
        Err(why) => {
            error!("Error creating client: {:?}", why);
            return;
        }
    };

    if let Err(why) = client.start().await {
        error!("Client error: {:?}", why);
    }
}
