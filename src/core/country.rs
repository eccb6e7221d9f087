//! Country business logic.
//!
//! Countries are the top level of the catalogue. The five main countries (`"1"` to
//! `"5"`) always exist; older data may still refer to them by legacy names such as
//! `"thailand"`, which [`resolve_country_code`] maps back to the numeric code.
//! Removing a country also removes every product listed under it.

use crate::{
    core::product,
    entities::{Country as CountryEntity, country},
    errors::{Error, Result},
    models::{CountriesFile, Country},
    store::{Store, files::COUNTRIES_FILE},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{debug, info, instrument, warn};

/// Codes of the main countries, which cannot be removed.
pub const PROTECTED_COUNTRY_CODES: [&str; 5] = ["1", "2", "3", "4", "5"];

const LEGACY_CODES: [(&str, &str); 5] = [
    ("thailand", "1"),
    ("japan", "2"),
    ("usa", "3"),
    ("korea", "4"),
    ("china", "5"),
];

/// The catalogue's built-in countries, used when nothing has been persisted yet.
#[must_use]
pub fn default_countries() -> Vec<Country> {
    [
        ("1", "Thailand", "🇹🇭"),
        ("2", "Japan", "🌸"),
        ("3", "USA", "🦅"),
        ("4", "Korea", "🇰🇷"),
        ("5", "China", "🇨🇳"),
    ]
    .into_iter()
    .map(|(code, name, emoji)| Country {
        code: code.to_string(),
        name: name.to_string(),
        emoji: emoji.to_string(),
    })
    .collect()
}

/// Maps a legacy country name to its numeric code; other inputs are returned trimmed.
#[must_use]
pub fn resolve_country_code(input: &str) -> String {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();
    LEGACY_CODES
        .iter()
        .find(|(legacy, _)| *legacy == lower)
        .map_or_else(|| trimmed.to_string(), |(_, code)| (*code).to_string())
}

/// True for the main countries, which cannot be removed.
#[must_use]
pub fn is_protected(code: &str) -> bool {
    PROTECTED_COUNTRY_CODES.contains(&code)
}

/// Loads all countries: document store, then mirror file, then built-in defaults.
///
/// An unreadable mirror file is logged and the defaults are shown instead; use
/// [`read_countries`] where the result is written back.
#[instrument(skip(store))]
pub async fn load_countries(store: &Store) -> Vec<Country> {
    read_countries(store).await.unwrap_or_else(|e| {
        warn!("Could not load countries from {COUNTRIES_FILE}: {e}");
        default_countries()
    })
}

/// Like [`load_countries`], but fails instead of falling back when the mirror file
/// exists and cannot be parsed.
///
/// # Errors
/// Returns an error if the mirror file cannot be read or parsed.
pub async fn read_countries(store: &Store) -> Result<Vec<Country>> {
    if let Some(db) = store.db() {
        match load_from_db(db).await {
            Ok(countries) if !countries.is_empty() => return Ok(countries),
            Ok(_) => debug!("No countries in the document store, trying the mirror file"),
            Err(e) => warn!("Could not load countries from the document store: {e}"),
        }
    }

    Ok(store
        .files()
        .read::<CountriesFile>(COUNTRIES_FILE)
        .await?
        .map_or_else(default_countries, CountriesFile::into_countries))
}

/// Replaces the whole country collection.
///
/// # Errors
/// Returns an error only if the mirror file cannot be written; document store failures
/// are logged.
pub async fn save_countries(store: &Store, countries: &[Country]) -> Result<()> {
    if let Some(db) = store.db() {
        if let Err(e) = replace_in_db(db, countries).await {
            warn!("Could not save countries to the document store: {e}");
        }
    }
    store.files().write(COUNTRIES_FILE, countries).await
}

/// Looks up one country by code (legacy names accepted).
pub async fn get_country(store: &Store, code: &str) -> Option<Country> {
    let code = resolve_country_code(code);
    load_countries(store)
        .await
        .into_iter()
        .find(|c| c.code == code)
}

/// Adds a new country.
///
/// # Errors
/// Returns [`Error::CountryExists`] if the code (or the code a legacy name maps to) is
/// already taken, or [`Error::Config`] if code or name is blank.
#[instrument(skip(store))]
pub async fn add_country(store: &Store, code: &str, name: &str, emoji: &str) -> Result<Country> {
    let code = code.trim();
    if code.is_empty() || name.trim().is_empty() {
        return Err(Error::Config {
            message: "Country code and name cannot be empty".to_string(),
        });
    }

    let _guard = store.lock_writes().await;
    let mut countries = read_countries(store).await?;
    let resolved = resolve_country_code(code);
    if countries.iter().any(|c| c.code == code || c.code == resolved) {
        return Err(Error::CountryExists {
            code: code.to_string(),
        });
    }

    let country = Country {
        code: code.to_string(),
        name: name.trim().to_string(),
        emoji: emoji.trim().to_string(),
    };
    countries.push(country.clone());
    save_countries(store, &countries).await?;
    info!("Added country {} ({})", country.name, country.code);
    Ok(country)
}

/// Changes the name and/or emoji of a country. Blank values are left untouched.
///
/// # Errors
/// Returns [`Error::CountryNotFound`] if no country has this code.
#[instrument(skip(store))]
pub async fn edit_country(
    store: &Store,
    code: &str,
    new_name: Option<&str>,
    new_emoji: Option<&str>,
) -> Result<Country> {
    let code = resolve_country_code(code);
    let _guard = store.lock_writes().await;
    let mut countries = read_countries(store).await?;

    let country = countries
        .iter_mut()
        .find(|c| c.code == code)
        .ok_or_else(|| Error::CountryNotFound { code: code.clone() })?;

    if let Some(name) = new_name.map(str::trim).filter(|n| !n.is_empty()) {
        country.name = name.to_string();
    }
    if let Some(emoji) = new_emoji.map(str::trim).filter(|e| !e.is_empty()) {
        country.emoji = emoji.to_string();
    }
    let edited = country.clone();

    save_countries(store, &countries).await?;
    Ok(edited)
}

/// Removes a country and every product listed under it.
///
/// Returns the removed country and the number of products deleted with it.
///
/// # Errors
/// Returns [`Error::ProtectedCountry`] for the main countries and
/// [`Error::CountryNotFound`] for unknown codes. In both cases nothing is changed.
#[instrument(skip(store))]
pub async fn remove_country(store: &Store, code: &str) -> Result<(Country, usize)> {
    let code = resolve_country_code(code);
    if is_protected(&code) {
        return Err(Error::ProtectedCountry { code });
    }

    let _guard = store.lock_writes().await;
    let mut countries = read_countries(store).await?;
    let Some(index) = countries.iter().position(|c| c.code == code) else {
        return Err(Error::CountryNotFound { code });
    };
    let removed = countries.remove(index);
    save_countries(store, &countries).await?;

    let products_removed = product::retain_products(store, |p| p.country != code).await?;
    info!(
        "Removed country {} and {} of its products",
        removed.code, products_removed
    );
    Ok((removed, products_removed))
}

async fn load_from_db(db: &DatabaseConnection) -> Result<Vec<Country>> {
    let rows = CountryEntity::find()
        .order_by_asc(country::Column::Position)
        .all(db)
        .await?;
    Ok(rows.into_iter().map(Country::from).collect())
}

async fn replace_in_db(db: &DatabaseConnection, countries: &[Country]) -> Result<()> {
    let txn = db.begin().await?;
    CountryEntity::delete_many().exec(&txn).await?;
    for (position, c) in (0_i32..).zip(countries) {
        country::ActiveModel {
            code: Set(c.code.clone()),
            name: Set(c.name.clone()),
            emoji: Set(c.emoji.clone()),
            position: Set(position),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }
    txn.commit().await?;
    Ok(())
}
