//! Bot layer - Discord-specific interface and command handlers
//!
//! This module provides the Discord interface of the shop: prefix and slash commands,
//! the interactive shop message, autocomplete and gateway event handling.

/// Discord command implementations (shop, catalogue management, configuration, general)
pub mod commands;
/// Discord interaction handlers (autocomplete, gateway events)
pub mod handlers;
/// Interactive shop message
pub mod shop;

use crate::{
    config::AppConfig,
    errors::{Error, Result},
    store::Store,
};
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tracing::{error, info, instrument};

/// Shared data available to all bot commands.
#[derive(Debug)]
pub struct BotData {
    /// Document store and JSON mirror
    pub store: Arc<Store>,
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Set once the gateway session is ready, read by the status server
    pub connected: Arc<AtomicBool>,
}

impl BotData {
    /// Bundles the shared state handed to every command.
    #[must_use]
    pub const fn new(store: Arc<Store>, config: Arc<AppConfig>, connected: Arc<AtomicBool>) -> Self {
        Self {
            store,
            config,
            connected,
        }
    }
}

/// Poise context carrying the shared [`BotData`].
pub type Context<'a> = poise::Context<'a, BotData, Error>;

/// Every command the bot registers.
#[must_use]
pub fn all_commands() -> Vec<poise::Command<BotData, Error>> {
    vec![
        commands::shop(),
        commands::qrcode(),
        commands::product(),
        commands::country(),
        commands::category(),
        commands::setqrcode(),
        commands::setthankyou(),
        commands::settargetchannel(),
        commands::history(),
        commands::backup(),
        commands::ping(),
        commands::help(),
    ]
}

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {:?}", error);
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("Error in command `{}`: {:?}", ctx.command().name, error);
            if let Err(e) = ctx.say(format!("❌ An error occurred: {error}")).await {
                error!("Failed to send error message: {}", e);
            }
        }
        poise::FrameworkError::MissingUserPermissions { ctx, .. } => {
            if let Err(e) = ctx
                .say("❌ You need the Administrator permission to use this command.")
                .await
            {
                error!("Failed to send error message: {}", e);
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {}", e);
            }
        }
    }
}

/// Builds the framework and runs the client until it stops.
///
/// # Errors
/// Returns an error if the client cannot be created or the gateway connection fails.
#[instrument(skip(token, data))]
pub async fn run_bot(token: String, data: BotData) -> Result<()> {
    let prefix = data.config.command_prefix.clone();
    let dev_guild_id = data.config.dev_guild_id;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: all_commands(),
            on_error: |error| Box::pin(on_error(error)),
            event_handler: |ctx, event, framework, data| {
                Box::pin(handlers::events::event_handler(ctx, event, framework, data))
            },
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(prefix),
                ..Default::default()
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                if let Some(guild_id) = dev_guild_id {
                    let guild_id = serenity::GuildId::new(guild_id);
                    poise::builtins::register_in_guild(ctx, &framework.options().commands, guild_id)
                        .await?;
                    info!("Registered commands in guild {}", guild_id);
                } else {
                    info!("Registering commands globally...");
                    poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                }
                Ok(data)
            })
        })
        .build();

    let intents = serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::DIRECT_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT;

    info!("Setting up Serenity client for Poise framework...");
    let mut client = serenity::Client::builder(&token, intents)
        .framework(framework)
        .await
        .inspect_err(|e| error!("Error creating client: {:?}", e))?;

    info!("Starting bot client...");
    client
        .start()
        .await
        .inspect_err(|e| error!("Client error: {:?}", e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_names_are_unique() {
        let commands = all_commands();
        let mut names: Vec<&str> = commands.iter().map(|c| c.name.as_str()).collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total);
        assert!(names.contains(&"shop"));
        assert!(names.contains(&"settargetchannel"));
    }

    #[test]
    fn test_management_subcommands_require_admin() {
        let commands = all_commands();
        for parent in ["product", "country", "category"] {
            let command = commands
                .iter()
                .find(|c| c.name == parent)
                .unwrap_or_else(|| panic!("missing command {parent}"));
            for sub in command.subcommands.iter().filter(|s| s.name != "list") {
                assert!(
                    sub.required_permissions
                        .contains(serenity::Permissions::ADMINISTRATOR),
                    "{parent} {} is not admin-only",
                    sub.name
                );
            }
        }
    }
}
