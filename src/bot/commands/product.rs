//! Product Discord commands - the `product` command group.
//!
//! Listing is open to everyone; every change to the catalogue requires the
//! Administrator permission.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{
            BotData,
            commands::utils::{reply_error, say_lines},
            handlers::autocomplete,
        },
        core::{
            category, country,
            product::{self, SaveOutcome},
        },
        errors::{Error, Result},
        models::{Product, ProductChanges},
    };

    /// Manage the products sold in the shop.
    #[poise::command(
        slash_command,
        prefix_command,
        subcommands(
            "product_add",
            "product_edit",
            "product_remove",
            "product_list",
            "product_clear",
            "product_clearall",
            "product_placeholders",
            "product_batch"
        )
    )]
    pub async fn product(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let prefix = &ctx.data().config.command_prefix;
        let help_text = format!(
            "Product management. Available subcommands:\n\
            `{prefix}product add <name> <price> <emoji> <country> <category>` - Add or replace a product\n\
            `{prefix}product edit <name> <country> ...` - Change a product\n\
            `{prefix}product remove <name> [category] [country]` - Remove a product\n\
            `{prefix}product list [country] [category]` - List products\n\
            `{prefix}product clear <category> [country]` - Remove all products of a category\n\
            `{prefix}product clearall` - Remove every product\n\
            `{prefix}product placeholders` - Fill empty categories with placeholders\n\
            `{prefix}product batch <json>` - Add many products from a JSON array"
        );
        ctx.say(help_text).await?;
        Ok(())
    }

    /// Adds a product, replacing one with the same name in the same country and category.
    #[poise::command(
        slash_command,
        prefix_command,
        rename = "add",
        guild_only,
        required_permissions = "ADMINISTRATOR"
    )]
    pub async fn product_add(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Product name"] name: String,
        #[description = "Unit price"] price: f64,
        #[description = "Emoji shown on the product button"] emoji: String,
        #[description = "Country code"]
        #[autocomplete = "autocomplete::autocomplete_country"]
        country: String,
        #[description = "Category code"]
        #[autocomplete = "autocomplete::autocomplete_category"]
        category: String,
    ) -> Result<()> {
        let store = &ctx.data().store;

        let country_code = country::resolve_country_code(&country);
        if country::get_country(store, &country_code).await.is_none() {
            return reply_error(ctx, Error::CountryNotFound { code: country_code }).await;
        }
        if category::get_category(store, category.trim()).await.is_none() {
            return reply_error(
                ctx,
                Error::CategoryNotFound {
                    code: category.trim().to_string(),
                },
            )
            .await;
        }

        let new_product = Product {
            name,
            price,
            emoji,
            country: country_code,
            category,
        };
        let label = format!("{} {}", new_product.emoji, new_product.name);

        match product::save_product(store, new_product).await {
            Ok(SaveOutcome::Added) => {
                ctx.say(format!("✅ Added **{label}** at **{price:.2}**."))
                    .await?;
            }
            Ok(SaveOutcome::Updated) => {
                ctx.say(format!("✅ Updated **{label}**, now **{price:.2}**."))
                    .await?;
            }
            Err(e) => return reply_error(ctx, e).await,
        }
        Ok(())
    }

    /// Changes the name, price, emoji, category or country of a product.
    #[poise::command(
        slash_command,
        prefix_command,
        rename = "edit",
        guild_only,
        required_permissions = "ADMINISTRATOR"
    )]
    #[allow(clippy::too_many_arguments)]
    pub async fn product_edit(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Product to edit"]
        #[autocomplete = "autocomplete::autocomplete_product_name"]
        name: String,
        #[description = "Country the product is listed in"]
        #[autocomplete = "autocomplete::autocomplete_country"]
        country: String,
        #[description = "New price"] price: Option<f64>,
        #[description = "New emoji"] emoji: Option<String>,
        #[description = "New name"] new_name: Option<String>,
        #[description = "New category code"]
        #[autocomplete = "autocomplete::autocomplete_category"]
        new_category: Option<String>,
        #[description = "New country code"]
        #[autocomplete = "autocomplete::autocomplete_country"]
        new_country: Option<String>,
    ) -> Result<()> {
        let changes = ProductChanges {
            emoji,
            name: new_name,
            price,
            category: new_category,
            country: new_country,
        };
        if changes.is_empty() {
            ctx.say("❌ Nothing to change. Give at least one new value.")
                .await?;
            return Ok(());
        }

        match product::update_product(&ctx.data().store, &name, &country, changes).await {
            Ok(edited) => {
                ctx.say(format!(
                    "✅ Product is now **{} {}** at **{:.2}** in {}/{}.",
                    edited.emoji, edited.name, edited.price, edited.country, edited.category
                ))
                .await?;
                Ok(())
            }
            Err(e) => reply_error(ctx, e).await,
        }
    }

    /// Removes a product by name, optionally only from one category or country.
    #[poise::command(
        slash_command,
        prefix_command,
        rename = "remove",
        guild_only,
        required_permissions = "ADMINISTRATOR"
    )]
    pub async fn product_remove(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Product to remove"]
        #[autocomplete = "autocomplete::autocomplete_product_name"]
        name: String,
        #[description = "Only from this category"]
        #[autocomplete = "autocomplete::autocomplete_category"]
        category: Option<String>,
        #[description = "Only from this country"]
        #[autocomplete = "autocomplete::autocomplete_country"]
        country: Option<String>,
    ) -> Result<()> {
        let removed = product::remove_product(
            &ctx.data().store,
            &name,
            category.as_deref(),
            country.as_deref(),
        )
        .await?;

        if removed == 0 {
            return reply_error(ctx, Error::ProductNotFound { name }).await;
        }
        ctx.say(format!("✅ Removed {removed} product(s) named **{name}**."))
            .await?;
        Ok(())
    }

    /// Lists products, grouped by country and category.
    #[poise::command(slash_command, prefix_command, rename = "list")]
    pub async fn product_list(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Only this country"]
        #[autocomplete = "autocomplete::autocomplete_country"]
        country: Option<String>,
        #[description = "Only this category"]
        #[autocomplete = "autocomplete::autocomplete_category"]
        category: Option<String>,
    ) -> Result<()> {
        let store = &ctx.data().store;
        let products =
            product::load_products(store, country.as_deref(), category.as_deref()).await;

        if products.is_empty() {
            ctx.say("No products found.").await?;
            return Ok(());
        }

        let countries = country::load_countries(store).await;
        let categories = category::load_categories(store).await;
        let country_label = |code: &str| {
            countries
                .iter()
                .find(|c| c.code == code)
                .map(|c| format!("{} {}", c.emoji, c.name))
        };
        let category_label = |code: &str| {
            categories
                .iter()
                .find(|c| c.code == code)
                .map(|c| format!("{} {}", c.emoji, c.name))
        };
        let lines = super::listing_lines(&products, country_label, category_label);
        say_lines(ctx, &lines).await
    }

    /// Removes every product of a category, in one country or everywhere.
    #[poise::command(
        slash_command,
        prefix_command,
        rename = "clear",
        guild_only,
        required_permissions = "ADMINISTRATOR"
    )]
    pub async fn product_clear(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Category to clear"]
        #[autocomplete = "autocomplete::autocomplete_category"]
        category: String,
        #[description = "Only in this country"]
        #[autocomplete = "autocomplete::autocomplete_country"]
        country: Option<String>,
    ) -> Result<()> {
        let removed =
            product::clear_category_products(&ctx.data().store, category.trim(), country.as_deref())
                .await?;
        ctx.say(format!(
            "✅ Removed {removed} product(s) from category **{}**.",
            category.trim()
        ))
        .await?;
        Ok(())
    }

    /// Removes every product from the catalogue.
    #[poise::command(
        slash_command,
        prefix_command,
        rename = "clearall",
        guild_only,
        required_permissions = "ADMINISTRATOR"
    )]
    pub async fn product_clearall(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let removed = product::delete_all_products(&ctx.data().store).await?;
        ctx.say(format!("✅ Removed all {removed} product(s)."))
            .await?;
        Ok(())
    }

    /// Adds a "No products" placeholder to every empty category.
    #[poise::command(
        slash_command,
        prefix_command,
        rename = "placeholders",
        guild_only,
        required_permissions = "ADMINISTRATOR"
    )]
    pub async fn product_placeholders(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let inserted = product::add_no_product_placeholders(&ctx.data().store).await?;
        ctx.say(format!("✅ Added {inserted} placeholder(s)."))
            .await?;
        Ok(())
    }

    /// Adds many products at once from a JSON array of product objects.
    #[poise::command(
        slash_command,
        prefix_command,
        rename = "batch",
        guild_only,
        required_permissions = "ADMINISTRATOR"
    )]
    pub async fn product_batch(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "JSON array of {name, price, emoji, country, category} objects"]
        #[rest]
        json: String,
    ) -> Result<()> {
        let entries = match super::parse_batch(&json) {
            Ok(entries) => entries,
            Err(e) => return reply_error(ctx, e).await,
        };

        let report = product::batch_add_products(&ctx.data().store, &entries).await?;

        let mut lines = vec![format!(
            "✅ Saved {} product(s): {} added, {} updated.",
            report.saved(),
            report.added,
            report.updated
        )];
        if !report.errors.is_empty() {
            lines.push(format!("⚠️ {} entr(ies) skipped:", report.errors.len()));
            lines.extend(report.errors.iter().map(|e| format!("• {e}")));
        }
        say_lines(ctx, &lines).await
    }
}

use crate::{errors::Result, models::Product};
use serde_json::Value;

/// Parses batch input: a JSON array of objects or a single object, optionally wrapped
/// in a code block.
pub(crate) fn parse_batch(input: &str) -> Result<Vec<Value>> {
    let trimmed = input.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed);

    match serde_json::from_str::<Value>(body)? {
        Value::Array(entries) => Ok(entries),
        object @ Value::Object(_) => Ok(vec![object]),
        _ => Err(crate::errors::Error::Config {
            message: "Expected a JSON array of products".to_string(),
        }),
    }
}

/// Renders products as text lines with a heading per country and category.
pub(crate) fn listing_lines<C, K>(products: &[Product], country_label: C, category_label: K) -> Vec<String>
where
    C: Fn(&str) -> Option<String>,
    K: Fn(&str) -> Option<String>,
{
    let mut sorted: Vec<&Product> = products.iter().collect();
    sorted.sort_by(|a, b| (&a.country, &a.category).cmp(&(&b.country, &b.category)));

    let mut lines = Vec::new();
    let mut heading: Option<(&str, &str)> = None;
    for p in sorted {
        let group = (p.country.as_str(), p.category.as_str());
        if heading != Some(group) {
            let country = country_label(&p.country).unwrap_or_else(|| p.country.clone());
            let category = category_label(&p.category).unwrap_or_else(|| p.category.clone());
            lines.push(format!("**{country} / {category}**"));
            heading = Some(group);
        }
        lines.push(format!("{} {} - {:.2}", p.emoji, p.name, p.price));
    }
    lines
}

// Re-export all commands
pub use inner::*;
