//! Plain records shared by the document store, the JSON mirror and the bot layer.
//!
//! These are the shapes written to the mirror files, so field names are part of the
//! on-disk format.

use crate::entities::{category, country, product, purchase};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// A top-level section of the catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    /// Short code, `"1"` to `"5"` for the main countries
    pub code: String,
    /// Display name
    pub name: String,
    /// Flag or emoji shown on buttons
    #[serde(default)]
    pub emoji: String,
}

/// A product category, shared by every country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Short code such as `"weapon"`
    pub code: String,
    /// Display name
    pub name: String,
    /// Emoji shown on buttons
    #[serde(default)]
    pub emoji: String,
}

/// Countries mirror file as written now (a list) or by older releases (keyed maps).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CountriesFile {
    /// `[{"code": .., "name": .., "emoji": ..}, ..]`
    List(Vec<Country>),
    /// `{"countries": [codes], "country_names": {code: name}, "country_emojis": {code: emoji}}`
    Keyed {
        /// Codes in display order
        countries: Vec<String>,
        /// Name per code
        #[serde(default)]
        country_names: BTreeMap<String, String>,
        /// Emoji per code
        #[serde(default)]
        country_emojis: BTreeMap<String, String>,
    },
}

impl CountriesFile {
    /// Flattens either layout into countries in display order.
    ///
    /// In the keyed layout, codes that only appear in `country_names` follow the listed
    /// ones, and a code without a name is shown as its own name.
    #[must_use]
    pub fn into_countries(self) -> Vec<Country> {
        match self {
            Self::List(countries) => countries,
            Self::Keyed {
                mut countries,
                mut country_names,
                mut country_emojis,
            } => {
                let extra: Vec<String> = country_names
                    .keys()
                    .filter(|code| !countries.contains(code))
                    .cloned()
                    .collect();
                countries.extend(extra);
                countries
                    .into_iter()
                    .map(|code| Country {
                        name: country_names.remove(&code).unwrap_or_else(|| code.clone()),
                        emoji: country_emojis.remove(&code).unwrap_or_default(),
                        code,
                    })
                    .collect()
            }
        }
    }
}

/// Categories mirror file as written now (a list) or by older releases (keyed maps).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CategoriesFile {
    /// `[{"code": .., "name": .., "emoji": ..}, ..]`
    List(Vec<Category>),
    /// `{"category_names": {code: name}, "category_emojis": {code: emoji}}`
    Keyed {
        /// Name per code
        category_names: BTreeMap<String, String>,
        /// Emoji per code
        #[serde(default)]
        category_emojis: BTreeMap<String, String>,
    },
}

impl CategoriesFile {
    /// Flattens either layout into categories. Keyed categories come out sorted by code.
    #[must_use]
    pub fn into_categories(self) -> Vec<Category> {
        match self {
            Self::List(categories) => categories,
            Self::Keyed {
                category_names,
                mut category_emojis,
            } => category_names
                .into_iter()
                .map(|(code, name)| Category {
                    emoji: category_emojis.remove(&code).unwrap_or_default(),
                    code,
                    name,
                })
                .collect(),
        }
    }
}

/// One item of the catalogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Display name, unique within its country and category
    pub name: String,
    /// Unit price, never negative
    pub price: f64,
    /// Emoji shown on the product button
    pub emoji: String,
    /// Country code
    pub country: String,
    /// Category code
    pub category: String,
}

impl Product {
    /// Identifier used as the cart key: `country_category_name`.
    #[must_use]
    pub fn cart_id(&self) -> String {
        format!("{}_{}_{}", self.country, self.category, self.name)
    }

    /// True when this record occupies the same catalogue slot as `other`.
    #[must_use]
    pub fn same_slot(&self, other: &Self) -> bool {
        self.name == other.name && self.country == other.country && self.category == other.category
    }
}

/// Optional edits applied by `update_product`. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductChanges {
    /// New emoji
    pub emoji: Option<String>,
    /// New name
    pub name: Option<String>,
    /// New price
    pub price: Option<f64>,
    /// Move to this category
    pub category: Option<String>,
    /// Move to this country (legacy names accepted)
    pub country: Option<String>,
}

impl ProductChanges {
    /// True when no field would change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// One line of a completed purchase, priced at checkout time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseItem {
    /// Product name
    pub name: String,
    /// Country code
    #[serde(default)]
    pub country: String,
    /// Category code
    #[serde(default)]
    pub category: String,
    /// Units bought
    pub quantity: u32,
    /// Price of one unit
    #[serde(default, alias = "price")]
    pub unit_price: f64,
    /// `quantity * unit_price`
    #[serde(default)]
    pub subtotal: f64,
}

/// A completed checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseRecord {
    /// Discord id of the buyer
    pub user_id: String,
    /// Display name of the buyer at checkout
    pub user_name: String,
    /// Purchased lines
    pub items: Vec<PurchaseItem>,
    /// Sum of the line subtotals
    pub total_price: f64,
    /// Time of checkout. Timestamps without an offset are read as UTC.
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
}

/// Parses an RFC 3339 timestamp, or an ISO 8601 one without offset taken as UTC.
///
/// # Errors
/// Returns the parse error of the offset-less form when neither matches.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map(|t| t.and_utc())
        })
}

fn deserialize_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}

/// Stored state of the renamed channel. `pending_number` may run ahead of
/// `current_number` while renames are being rate limited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelState {
    /// Channel name after the last successful rename
    #[serde(default)]
    pub channel_name: String,
    /// Number carried by the channel name
    #[serde(default)]
    pub current_number: u64,
    /// Messages counted so far
    #[serde(default)]
    pub pending_number: u64,
}

impl From<country::Model> for Country {
    fn from(model: country::Model) -> Self {
        Self {
            code: model.code,
            name: model.name,
            emoji: model.emoji,
        }
    }
}

impl From<category::Model> for Category {
    fn from(model: category::Model) -> Self {
        Self {
            code: model.code,
            name: model.name,
            emoji: model.emoji,
        }
    }
}

impl From<product::Model> for Product {
    fn from(model: product::Model) -> Self {
        Self {
            name: model.name,
            price: model.price,
            emoji: model.emoji,
            country: model.country,
            category: model.category,
        }
    }
}

impl TryFrom<purchase::Model> for PurchaseRecord {
    type Error = serde_json::Error;

    fn try_from(model: purchase::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: model.user_id,
            user_name: model.user_name,
            items: serde_json::from_str(&model.items)?,
            total_price: model.total_price,
            timestamp: model.timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_keyed_countries_layout() {
        let raw = r#"{
            "countries": ["1", "6"],
            "country_names": {"1": "Thailand", "6": "Laos", "7": "Vietnam"},
            "country_emojis": {"1": "🇹🇭"},
            "country_codes": {"thailand": "1"}
        }"#;

        let countries = serde_json::from_str::<CountriesFile>(raw)
            .unwrap()
            .into_countries();

        let codes: Vec<&str> = countries.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, ["1", "6", "7"]);
        assert_eq!(countries[0].emoji, "🇹🇭");
        assert_eq!(countries[1].name, "Laos");
        assert_eq!(countries[2].emoji, "");
    }

    #[test]
    fn test_keyed_categories_layout() {
        let raw = r#"{"category_names": {"weapon": "Weapons", "car": "Cars"}, "category_emojis": {"car": "🚗"}}"#;

        let categories = serde_json::from_str::<CategoriesFile>(raw)
            .unwrap()
            .into_categories();

        assert_eq!(
            categories,
            vec![
                Category {
                    code: "car".to_string(),
                    name: "Cars".to_string(),
                    emoji: "🚗".to_string(),
                },
                Category {
                    code: "weapon".to_string(),
                    name: "Weapons".to_string(),
                    emoji: String::new(),
                },
            ]
        );
    }

    #[test]
    fn test_parse_timestamp_accepts_naive_iso() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2024-05-01T12:00:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-05-01T12:00:00Z").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-05-01T14:00:00+02:00").unwrap(), expected);
        assert_eq!(
            parse_timestamp("2024-05-01T12:00:00.123456")
                .unwrap()
                .timestamp_subsec_micros(),
            123_456
        );
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_purchase_record_with_naive_timestamp() {
        let raw = r#"{
            "user_id": "42",
            "user_name": "duck#0001",
            "items": [{"name": "Katana", "price": 10.0, "quantity": 2}],
            "total_price": 20.0,
            "timestamp": "2024-05-01T12:00:00.123456"
        }"#;

        let record: PurchaseRecord = serde_json::from_str(raw).unwrap();

        assert_eq!(record.timestamp.timestamp(), 1_714_564_800);
        assert_eq!(record.items[0].unit_price, 10.0);
        assert_eq!(record.items[0].country, "");
    }
}
