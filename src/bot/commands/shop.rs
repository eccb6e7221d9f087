//! Shop commands - the interactive shop and the payment QR code.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, shop},
        core::payment_qr::{self, PaymentQr},
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;

    /// Opens the shop: pick a country, a category, then add products to your cart.
    #[poise::command(slash_command, prefix_command)]
    pub async fn shop(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        shop::run_shop(ctx).await
    }

    /// Shows the payment QR code.
    #[poise::command(slash_command, prefix_command)]
    pub async fn qrcode(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let qr = payment_qr::payment_qr(&ctx.data().store, payment_qr::SHOP_MEMO).await?;
        let embed = serenity::CreateEmbed::default()
            .title("💳 Payment QR code")
            .description("Scan to pay for your order.")
            .image(qr.embed_url())
            .color(0x0058_65F2);

        let mut reply = poise::CreateReply::default().embed(embed);
        if let PaymentQr::Generated(png) = qr {
            reply = reply.attachment(serenity::CreateAttachment::bytes(
                png,
                payment_qr::GENERATED_FILE_NAME,
            ));
        }
        ctx.send(reply).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
