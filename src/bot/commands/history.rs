//! Purchase history and catalogue backup commands.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        core::{backup::Snapshot, purchase},
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;
    use tracing::info;

    /// Shows the most recent purchases.
    #[poise::command(
        slash_command,
        prefix_command,
        guild_only,
        required_permissions = "ADMINISTRATOR"
    )]
    pub async fn history(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Number of purchases to show (default 5, max 25)"]
        #[min = 1]
        #[max = 25]
        limit: Option<u64>,
    ) -> Result<()> {
        let limit = super::clamp_limit(limit);
        let records = purchase::get_purchase_history(&ctx.data().store, limit).await;

        if records.is_empty() {
            ctx.say("No purchases yet.").await?;
            return Ok(());
        }

        let budget = super::field_value_budget(records.len());
        let embed = serenity::CreateEmbed::default()
            .title(format!("🧾 Last {} purchase(s)", records.len()))
            .fields(records.iter().map(|r| {
                let (name, value) = super::history_field(r, budget);
                (name, value, false)
            }))
            .color(0x0034_98DB);
        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    /// Exports countries, categories, products and settings as a file of commands.
    ///
    /// Posting the lines of the file in a channel rebuilds the shop.
    #[poise::command(
        slash_command,
        prefix_command,
        guild_only,
        required_permissions = "ADMINISTRATOR"
    )]
    pub async fn backup(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let snapshot = Snapshot::capture(&ctx.data().store).await;
        let commands = snapshot.to_commands(&ctx.data().config.command_prefix);
        info!("Exporting {} backup command(s)", commands.len());

        let file = serenity::CreateAttachment::bytes(commands.join("\n").into_bytes(), "shop_backup.txt");
        ctx.send(
            poise::CreateReply::default()
                .content(format!(
                    "📦 Backup of {} countries, {} categories and {} products ({} commands).",
                    snapshot.countries.len(),
                    snapshot.categories.len(),
                    snapshot.products.len(),
                    commands.len()
                ))
                .attachment(file)
                .ephemeral(true),
        )
        .await?;
        Ok(())
    }
}

use super::utils::{EMBED_FIELD_LIMIT, EMBED_TOTAL_LIMIT, fit_lines, truncate_chars};
use crate::{core::purchase::DEFAULT_HISTORY_LIMIT, models::PurchaseRecord};

const MAX_HISTORY_LIMIT: u64 = 25;
/// Field names are cut to this, leaving the rest of the embed for the values.
const FIELD_NAME_LIMIT: usize = 100;
/// Room kept for the embed title.
const TITLE_ALLOWANCE: usize = 100;

fn clamp_limit(limit: Option<u64>) -> u64 {
    limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT)
}

/// Characters each field value may use so that `fields` fields stay within one embed.
fn field_value_budget(fields: usize) -> usize {
    let per_field = (EMBED_TOTAL_LIMIT - TITLE_ALLOWANCE) / fields.max(1);
    per_field
        .saturating_sub(FIELD_NAME_LIMIT)
        .min(EMBED_FIELD_LIMIT)
}

/// Embed field for one purchase: buyer and time, then one line per item and the total,
/// in at most `max_value_chars` characters.
fn history_field(record: &PurchaseRecord, max_value_chars: usize) -> (String, String) {
    let name = format!(
        "{} - <t:{}:f>",
        truncate_chars(&record.user_name, FIELD_NAME_LIMIT - 30),
        record.timestamp.timestamp()
    );
    let lines: Vec<String> = record
        .items
        .iter()
        .map(|item| format!("{} × {} ({:.2})", item.quantity, item.name, item.subtotal))
        .collect();
    let total = format!("**Total: {:.2}**", record.total_price);
    (name, fit_lines(&lines, Some(&total), max_value_chars))
}

// Re-export all commands
pub use inner::*;

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::models::PurchaseItem;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None), 5);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(10)), 10);
        assert_eq!(clamp_limit(Some(500)), 25);
    }

    #[test]
    fn test_history_field() {
        let record = PurchaseRecord {
            user_id: "42".to_string(),
            user_name: "duck".to_string(),
            items: vec![PurchaseItem {
                name: "Katana".to_string(),
                country: "2".to_string(),
                category: "weapon".to_string(),
                quantity: 2,
                unit_price: 10.0,
                subtotal: 20.0,
            }],
            total_price: 20.0,
            timestamp: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        };

        let (name, value) = history_field(&record, EMBED_FIELD_LIMIT);
        assert_eq!(name, "duck - <t:1700000000:f>");
        assert_eq!(value, "2 × Katana (20.00)\n**Total: 20.00**");
    }

    #[test]
    fn test_full_page_of_large_orders_fits_in_one_embed() {
        let items: Vec<PurchaseItem> = (0..60)
            .map(|n| PurchaseItem {
                name: format!("Limited edition product number {n:02}"),
                country: "1".to_string(),
                category: "item".to_string(),
                quantity: 1,
                unit_price: 10.0,
                subtotal: 10.0,
            })
            .collect();
        let record = PurchaseRecord {
            user_id: "42".to_string(),
            user_name: "d".repeat(200),
            items,
            total_price: 600.0,
            timestamp: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        };

        let (_, single) = history_field(&record, field_value_budget(1));
        assert!(single.chars().count() <= EMBED_FIELD_LIMIT);
        assert!(single.ends_with("**Total: 600.00**"));

        let budget = field_value_budget(25);
        let embed_chars: usize = (0..25)
            .map(|_| {
                let (name, value) = history_field(&record, budget);
                assert!(value.ends_with("**Total: 600.00**"));
                name.chars().count() + value.chars().count()
            })
            .sum();
        assert!(embed_chars + TITLE_ALLOWANCE <= EMBED_TOTAL_LIMIT);
    }
}
