//! Category Discord commands - the `category` command group.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, commands::utils::reply_error, handlers::autocomplete},
        core::category,
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;

    /// Manage the product categories of the shop.
    #[poise::command(
        slash_command,
        prefix_command,
        subcommands("category_add", "category_edit", "category_remove", "category_list")
    )]
    pub async fn category(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let prefix = &ctx.data().config.command_prefix;
        ctx.say(format!(
            "Category management. Available subcommands:\n\
            `{prefix}category add <code> <name> [emoji]` - Add a category\n\
            `{prefix}category edit <code> [name] [emoji]` - Rename a category or change its emoji\n\
            `{prefix}category remove <code>` - Remove a category and its products\n\
            `{prefix}category list` - List categories"
        ))
        .await?;
        Ok(())
    }

    /// Adds a category.
    #[poise::command(
        slash_command,
        prefix_command,
        rename = "add",
        guild_only,
        required_permissions = "ADMINISTRATOR"
    )]
    pub async fn category_add(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Short code, e.g. food"] code: String,
        #[description = "Display name"] name: String,
        #[description = "Emoji"] emoji: Option<String>,
    ) -> Result<()> {
        let emoji = emoji.unwrap_or_default();
        match category::add_category(&ctx.data().store, &code, &name, &emoji).await {
            Ok(added) => {
                ctx.say(format!(
                    "✅ Added category {} **{}** (`{}`).",
                    added.emoji, added.name, added.code
                ))
                .await?;
                Ok(())
            }
            Err(e) => reply_error(ctx, e).await,
        }
    }

    /// Changes the name and/or emoji of a category.
    #[poise::command(
        slash_command,
        prefix_command,
        rename = "edit",
        guild_only,
        required_permissions = "ADMINISTRATOR"
    )]
    pub async fn category_edit(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Category to edit"]
        #[autocomplete = "autocomplete::autocomplete_category"]
        code: String,
        #[description = "New name"] name: Option<String>,
        #[description = "New emoji"] emoji: Option<String>,
    ) -> Result<()> {
        match category::edit_category(&ctx.data().store, &code, name.as_deref(), emoji.as_deref())
            .await
        {
            Ok(edited) => {
                ctx.say(format!(
                    "✅ Category `{}` is now {} **{}**.",
                    edited.code, edited.emoji, edited.name
                ))
                .await?;
                Ok(())
            }
            Err(e) => reply_error(ctx, e).await,
        }
    }

    /// Removes a category and its products in every country.
    #[poise::command(
        slash_command,
        prefix_command,
        rename = "remove",
        guild_only,
        required_permissions = "ADMINISTRATOR"
    )]
    pub async fn category_remove(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Category to remove"]
        #[autocomplete = "autocomplete::autocomplete_category"]
        code: String,
    ) -> Result<()> {
        match category::remove_category(&ctx.data().store, &code).await {
            Ok((removed, products)) => {
                ctx.say(format!(
                    "✅ Removed category {} **{}** and {products} product(s) in it.",
                    removed.emoji, removed.name
                ))
                .await?;
                Ok(())
            }
            Err(e) => reply_error(ctx, e).await,
        }
    }

    /// Lists all categories.
    #[poise::command(slash_command, prefix_command, rename = "list")]
    pub async fn category_list(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let categories = category::load_categories(&ctx.data().store).await;
        if categories.is_empty() {
            ctx.say("No categories configured.").await?;
            return Ok(());
        }

        let lines: Vec<String> = categories
            .iter()
            .map(|c| format!("`{}` {} {}", c.code, c.emoji, c.name))
            .collect();

        let embed = serenity::CreateEmbed::default()
            .title("🗂️ Categories")
            .description(lines.join("\n"))
            .color(0x0034_98DB);
        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
