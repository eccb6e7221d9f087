//! Autocomplete handlers for Discord slash command parameters.
//!
//! Countries and categories are suggested by code with a readable label; product names
//! are suggested as-is so they match the command parameter exactly.

use crate::{
    bot::Context,
    core::{category, country, product},
    models::{Category, Country},
};
use poise::serenity_prelude::AutocompleteChoice;

/// Discord's limit on suggestions per request.
const MAX_CHOICES: usize = 25;

fn label(emoji: &str, name: &str, code: &str) -> String {
    if emoji.is_empty() {
        format!("{name} ({code})")
    } else {
        format!("{emoji} {name} ({code})")
    }
}

fn matches(partial: &str, code: &str, name: &str) -> bool {
    let partial = partial.trim().to_lowercase();
    partial.is_empty()
        || code.to_lowercase().starts_with(&partial)
        || name.to_lowercase().contains(&partial)
}

fn country_choices(countries: Vec<Country>, partial: &str) -> Vec<AutocompleteChoice> {
    countries
        .into_iter()
        .filter(|c| matches(partial, &c.code, &c.name))
        .map(|c| AutocompleteChoice::new(label(&c.emoji, &c.name, &c.code), c.code))
        .take(MAX_CHOICES)
        .collect()
}

fn category_choices(categories: Vec<Category>, partial: &str) -> Vec<AutocompleteChoice> {
    categories
        .into_iter()
        .filter(|c| matches(partial, &c.code, &c.name))
        .map(|c| AutocompleteChoice::new(label(&c.emoji, &c.name, &c.code), c.code))
        .take(MAX_CHOICES)
        .collect()
}

/// Suggests country codes, labelled with flag and name.
pub async fn autocomplete_country(ctx: Context<'_>, partial: &str) -> Vec<AutocompleteChoice> {
    let countries = country::load_countries(&ctx.data().store).await;
    country_choices(countries, partial)
}

/// Suggests category codes, labelled with emoji and name.
pub async fn autocomplete_category(ctx: Context<'_>, partial: &str) -> Vec<AutocompleteChoice> {
    let categories = category::load_categories(&ctx.data().store).await;
    category_choices(categories, partial)
}

/// Suggests distinct product names, placeholders excluded.
pub async fn autocomplete_product_name(ctx: Context<'_>, partial: &str) -> Vec<String> {
    let products = product::load_products(&ctx.data().store, None, None).await;
    let partial_lower = partial.to_lowercase();

    let mut matching: Vec<String> = products
        .into_iter()
        .filter(|p| !product::is_placeholder(p))
        .filter(|p| p.name.to_lowercase().contains(&partial_lower))
        .map(|p| p.name)
        .collect();

    // Sort alphabetically for consistent UX
    matching.sort();
    matching.dedup();
    matching.truncate(MAX_CHOICES);
    matching
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_country_choices_match_code_or_name() {
        let countries = country::default_countries();

        let all = country_choices(countries.clone(), "");
        assert_eq!(all.len(), countries.len());

        let by_code = country_choices(countries.clone(), "1");
        assert!(!by_code.is_empty());
        assert!(by_code.iter().all(|c| c.name.contains("(1")));

        let first = &countries[0];
        let by_name = country_choices(countries.clone(), &first.name.to_uppercase());
        assert!(by_name.iter().any(|c| c.name.contains(&first.name)));

        assert!(country_choices(countries, "no such place").is_empty());
    }

    #[test]
    fn test_category_labels() {
        let categories = vec![
            Category {
                code: "car".to_string(),
                name: "Cars".to_string(),
                emoji: "🚗".to_string(),
            },
            Category {
                code: "misc".to_string(),
                name: "Misc".to_string(),
                emoji: String::new(),
            },
        ];

        let choices = category_choices(categories, "");
        let names: Vec<&str> = choices.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["🚗 Cars (car)", "Misc (misc)"]);
    }
}
