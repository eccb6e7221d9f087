//! General Discord commands - ping and help.
//! This module contains simple commands that don't touch the store
//! and provide basic bot functionality and user assistance.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        errors::{Error, Result},
    };

    /// Responds with "Pong!" to test bot connectivity.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ping(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command, prefix_command)]
    pub async fn help(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say(super::help_text(&ctx.data().config.command_prefix))
            .await?;
        Ok(())
    }
}

/// Help message with every command written with `prefix`.
pub(crate) fn help_text(prefix: &str) -> String {
    format!(
        "**Ducky Shop Help**\n\
        Commands work as `/slash` commands or with the `{prefix}` prefix.\n\n\
        **Shopping**\n\
        • `{prefix}shop` - Opens the shop. Pick a country, a category, then products.\n\
        • `{prefix}qrcode` - Shows the payment QR code.\n\n\
        **Catalogue (admin)**\n\
        • `{prefix}product <add|edit|remove|list|clear|clearall|placeholders|batch>`\n\
        • `{prefix}country <add|edit|remove|list>`\n\
        • `{prefix}category <add|edit|remove|list>`\n\n\
        **Configuration (admin)**\n\
        • `{prefix}setqrcode <url>` - Sets the payment QR code image.\n\
        • `{prefix}setthankyou <message>` - Sets the message shown after checkout.\n\
        • `{prefix}settargetchannel [channel]` - Picks the channel that counts messages.\n\
        • `{prefix}history [limit]` - Shows recent purchases.\n\
        • `{prefix}backup` - Exports the shop as a list of commands.\n\n\
        **Utility**\n\
        • `{prefix}ping` - Checks if the bot is responsive.\n\
        • `{prefix}help` - Shows this help message."
    )
}

// Re-export all commands
pub use inner::*;
