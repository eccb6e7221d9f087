//! Catalogue export as a list of bot commands.
//!
//! Replaying the exported lines in a channel recreates the countries, categories,
//! products and configuration of the shop.

use crate::{
    core::{category, country, product, settings},
    models::{Category, Country, Product},
    store::Store,
};

/// Everything an export contains.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// Countries in display order
    pub countries: Vec<Country>,
    /// Categories in display order
    pub categories: Vec<Category>,
    /// Every product, placeholders included
    pub products: Vec<Product>,
    /// QR code URL, if one was set
    pub qrcode_url: Option<String>,
    /// Message shown after checkout
    pub thank_you_message: String,
    /// Channel carrying the message counter
    pub target_channel_id: Option<u64>,
}

impl Snapshot {
    /// Reads the current catalogue and configuration from the store.
    pub async fn capture(store: &Store) -> Self {
        Self {
            countries: country::load_countries(store).await,
            categories: category::load_categories(store).await,
            products: product::load_products(store, None, None).await,
            qrcode_url: settings::configured_qrcode_url(store).await,
            thank_you_message: settings::load_thank_you_message(store).await,
            target_channel_id: settings::load_target_channel_id(store).await,
        }
    }

    /// Renders the snapshot as commands using `prefix`.
    ///
    /// Main countries and default categories that already exist are edited rather than
    /// added; placeholders are left out. Every command fits on one line.
    #[must_use]
    pub fn to_commands(&self, prefix: &str) -> Vec<String> {
        let mut lines = Vec::new();

        let default_categories = category::default_categories();
        for c in &self.countries {
            let verb = if country::is_protected(&c.code) {
                "edit"
            } else {
                "add"
            };
            lines.push(format!(
                "{prefix}country {verb} {} {} {}",
                quote(&c.code),
                quote(&c.name),
                quote(&c.emoji)
            ));
        }

        for c in &self.categories {
            let verb = if default_categories.iter().any(|d| d.code == c.code) {
                "edit"
            } else {
                "add"
            };
            lines.push(format!(
                "{prefix}category {verb} {} {} {}",
                quote(&c.code),
                quote(&c.name),
                quote(&c.emoji)
            ));
        }

        for p in self.products.iter().filter(|p| !product::is_placeholder(p)) {
            lines.push(format!(
                "{prefix}product add {} {} {} {} {}",
                quote(&p.name),
                p.price,
                quote(&p.emoji),
                quote(&p.country),
                quote(&p.category)
            ));
        }

        if let Some(url) = &self.qrcode_url {
            lines.push(format!("{prefix}setqrcode {}", quote(url)));
        }
        lines.push(format!(
            "{prefix}setthankyou {}",
            escape_newlines(&self.thank_you_message)
        ));
        if let Some(id) = self.target_channel_id {
            lines.push(format!("{prefix}settargetchannel {id}"));
        }
        lines
    }
}

/// Writes line breaks as a literal `\n`, which `setthankyou` turns back into line breaks.
#[must_use]
pub fn escape_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\n', "\\n")
}

/// Reverses [`escape_newlines`].
#[must_use]
pub fn unescape_newlines(text: &str) -> String {
    text.replace("\\n", "\n")
}

/// Makes `value` parse back as a single prefix-command argument.
///
/// Line breaks become spaces. Values that are empty or contain whitespace, quotes or
/// backslashes are wrapped in double quotes with `"` and `\` backslash-escaped.
fn quote(value: &str) -> String {
    let value = value.replace("\r\n", " ").replace(['\r', '\n'], " ");
    let needs_quotes = value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || c == '"' || c == '\\');
    if !needs_quotes {
        return value;
    }
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Result;
    use crate::test_utils::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_quote() {
        assert_eq!(quote("Gold"), "Gold");
        assert_eq!(quote("Gold bar"), "\"Gold bar\"");
        assert_eq!(quote(""), "\"\"");
        assert_eq!(quote(r#"12" Sub"#), r#""12\" Sub""#);
        assert_eq!(quote(r"C:\shop"), r#""C:\\shop""#);
        assert_eq!(quote("Gold\nbar"), "\"Gold bar\"");
    }

    #[test]
    fn test_newline_escaping() {
        let message = "Thanks!\nDelivery within 24h.\r\nSee you";
        let escaped = escape_newlines(message);
        assert_eq!(escaped, r"Thanks!\nDelivery within 24h.\nSee you");
        assert!(!escaped.contains('\n'));
        assert_eq!(
            unescape_newlines(&escaped),
            "Thanks!\nDelivery within 24h.\nSee you"
        );
    }

    #[test]
    fn test_every_command_is_one_line() {
        let snapshot = Snapshot {
            products: vec![Product {
                name: "12\" Pizza\nlarge".to_string(),
                price: 5.5,
                emoji: "🍕".to_string(),
                country: "1".to_string(),
                category: "item".to_string(),
            }],
            qrcode_url: Some("https://example.com/qr.png".to_string()),
            thank_you_message: "Thanks!\n\nCome again.".to_string(),
            ..Snapshot::default()
        };

        let lines = snapshot.to_commands("!");

        assert!(lines.iter().all(|l| !l.contains('\n')));
        assert_eq!(lines[0], r#"!product add "12\" Pizza large" 5.5 🍕 1 item"#);
        assert_eq!(lines[1], "!setqrcode https://example.com/qr.png");
        assert_eq!(lines[2], r"!setthankyou Thanks!\n\nCome again.");
    }

    #[tokio::test]
    async fn test_export_commands() -> Result<()> {
        let (store, _dir) = setup_test_store().await?;
        country::add_country(&store, "6", "Viet Nam", "🇻🇳").await?;
        create_test_product(&store, "Gold bar", "6", "money").await?;
        product::add_no_product_placeholders(&store).await?;
        settings::save_target_channel_id(&store, Some(99)).await?;

        let lines = Snapshot::capture(&store).await.to_commands("!");

        assert_eq!(lines[0], "!country edit 1 Thailand 🇹🇭");
        assert!(lines.contains(&"!country add 6 \"Viet Nam\" 🇻🇳".to_string()));
        assert!(lines.contains(&"!category edit money Money 💰".to_string()));
        assert!(lines.contains(&"!product add \"Gold bar\" 10 📦 6 money".to_string()));
        assert!(!lines.iter().any(|l| l.contains(product::PLACEHOLDER_NAME)));
        assert_eq!(lines.last().map(String::as_str), Some("!settargetchannel 99"));
        Ok(())
    }
}
