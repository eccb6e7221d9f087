//! Shop configuration commands - QR code, thank-you message and counter channel.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, handlers::events::sync_target_channel},
        core::{backup, payment_qr, settings},
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;

    /// Sets the payment QR code image shown at checkout.
    #[poise::command(
        slash_command,
        prefix_command,
        guild_only,
        required_permissions = "ADMINISTRATOR"
    )]
    pub async fn setqrcode(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Image URL of the QR code"] url: String,
    ) -> Result<()> {
        let url = url.trim();
        if !super::is_http_url(url) {
            ctx.say("❌ The QR code must be an http(s) image URL.")
                .await?;
            return Ok(());
        }

        settings::save_qrcode_url(&ctx.data().store, url).await?;

        let mut embed = serenity::CreateEmbed::default()
            .title("✅ QR code updated")
            .color(0x0058_65F2);
        embed = if payment_qr::is_image_url(url) {
            embed.image(url)
        } else {
            embed.description(
                "This link is not an image, so a QR code pointing to it will be shown instead.",
            )
        };
        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    /// Sets the message shown after a successful checkout.
    ///
    /// A literal `\n` starts a new line.
    #[poise::command(
        slash_command,
        prefix_command,
        guild_only,
        required_permissions = "ADMINISTRATOR"
    )]
    pub async fn setthankyou(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Thank-you message"]
        #[rest]
        message: String,
    ) -> Result<()> {
        let message = backup::unescape_newlines(message.trim());
        let message = message.trim();
        if message.is_empty() {
            ctx.say("❌ The thank-you message cannot be empty.")
                .await?;
            return Ok(());
        }

        settings::save_thank_you_message(&ctx.data().store, message).await?;
        ctx.say(format!("✅ Thank-you message set to:\n{message}"))
            .await?;
        Ok(())
    }

    /// Picks the channel whose name counts the messages posted in it.
    ///
    /// Without a channel argument the current channel is used.
    #[poise::command(
        slash_command,
        prefix_command,
        guild_only,
        required_permissions = "ADMINISTRATOR"
    )]
    pub async fn settargetchannel(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Channel to count messages in"] channel: Option<serenity::Channel>,
    ) -> Result<()> {
        let channel_id = channel.map_or_else(|| ctx.channel_id(), |c| c.id());

        settings::save_target_channel_id(&ctx.data().store, Some(channel_id.get())).await?;
        sync_target_channel(ctx.serenity_context(), &ctx.data().store, channel_id).await;
        ctx.say(format!("✅ Message counter now tracks <#{channel_id}>."))
            .await?;
        Ok(())
    }
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("https://") || value.starts_with("http://")
}

// Re-export all commands
pub use inner::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_http_url() {
        assert!(is_http_url("https://promptpay.io/0812345678.png"));
        assert!(is_http_url("http://example.com/qr.png"));
        assert!(!is_http_url("ftp://example.com/qr.png"));
        assert!(!is_http_url("qr.png"));
    }
}
