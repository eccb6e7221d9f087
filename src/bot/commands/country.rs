//! Country Discord commands - the `country` command group.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, commands::utils::reply_error, handlers::autocomplete},
        core::country,
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;

    /// Manage the countries of the shop.
    #[poise::command(
        slash_command,
        prefix_command,
        subcommands("country_add", "country_edit", "country_remove", "country_list")
    )]
    pub async fn country(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let prefix = &ctx.data().config.command_prefix;
        ctx.say(format!(
            "Country management. Available subcommands:\n\
            `{prefix}country add <code> <name> [emoji]` - Add a country\n\
            `{prefix}country edit <code> [name] [emoji]` - Rename a country or change its emoji\n\
            `{prefix}country remove <code>` - Remove a country and its products\n\
            `{prefix}country list` - List countries"
        ))
        .await?;
        Ok(())
    }

    /// Adds a country.
    #[poise::command(
        slash_command,
        prefix_command,
        rename = "add",
        guild_only,
        required_permissions = "ADMINISTRATOR"
    )]
    pub async fn country_add(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Short code, e.g. 6"] code: String,
        #[description = "Display name"] name: String,
        #[description = "Flag or emoji"] emoji: Option<String>,
    ) -> Result<()> {
        let emoji = emoji.unwrap_or_default();
        match country::add_country(&ctx.data().store, &code, &name, &emoji).await {
            Ok(added) => {
                ctx.say(format!(
                    "✅ Added country {} **{}** (`{}`).",
                    added.emoji, added.name, added.code
                ))
                .await?;
                Ok(())
            }
            Err(e) => reply_error(ctx, e).await,
        }
    }

    /// Changes the name and/or emoji of a country.
    #[poise::command(
        slash_command,
        prefix_command,
        rename = "edit",
        guild_only,
        required_permissions = "ADMINISTRATOR"
    )]
    pub async fn country_edit(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Country to edit"]
        #[autocomplete = "autocomplete::autocomplete_country"]
        code: String,
        #[description = "New name"] name: Option<String>,
        #[description = "New flag or emoji"] emoji: Option<String>,
    ) -> Result<()> {
        match country::edit_country(&ctx.data().store, &code, name.as_deref(), emoji.as_deref())
            .await
        {
            Ok(edited) => {
                ctx.say(format!(
                    "✅ Country `{}` is now {} **{}**.",
                    edited.code, edited.emoji, edited.name
                ))
                .await?;
                Ok(())
            }
            Err(e) => reply_error(ctx, e).await,
        }
    }

    /// Removes a country and every product listed under it.
    #[poise::command(
        slash_command,
        prefix_command,
        rename = "remove",
        guild_only,
        required_permissions = "ADMINISTRATOR"
    )]
    pub async fn country_remove(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Country to remove"]
        #[autocomplete = "autocomplete::autocomplete_country"]
        code: String,
    ) -> Result<()> {
        match country::remove_country(&ctx.data().store, &code).await {
            Ok((removed, products)) => {
                ctx.say(format!(
                    "✅ Removed country {} **{}** and {products} of its product(s).",
                    removed.emoji, removed.name
                ))
                .await?;
                Ok(())
            }
            Err(e) => reply_error(ctx, e).await,
        }
    }

    /// Lists all countries.
    #[poise::command(slash_command, prefix_command, rename = "list")]
    pub async fn country_list(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let countries = country::load_countries(&ctx.data().store).await;
        if countries.is_empty() {
            ctx.say("No countries configured.").await?;
            return Ok(());
        }

        let lines: Vec<String> = countries
            .iter()
            .map(|c| {
                let lock = if country::is_protected(&c.code) { " 🔒" } else { "" };
                format!("`{}` {} {}{lock}", c.code, c.emoji, c.name)
            })
            .collect();

        let embed = serenity::CreateEmbed::default()
            .title("🌍 Countries")
            .description(lines.join("\n"))
            .color(0x0034_98DB);
        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
