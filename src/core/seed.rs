//! First-start seeding of the document store.
//!
//! On startup every empty table is filled from its mirror file, or from the built-in
//! defaults when there is no mirror yet. Tables that already hold data are left alone.

use crate::{
    core::{
        category, country, product, purchase,
        settings::{self, SettingKey},
    },
    entities::{Category, Country, Product, Purchase, Setting, setting},
    errors::Result,
    models::{self, CategoriesFile, CountriesFile, PurchaseRecord},
    store::{
        Store,
        files::{CATEGORIES_FILE, COUNTRIES_FILE, HISTORY_FILE, PRODUCTS_FILE},
    },
};
use sea_orm::{PaginatorTrait, QueryFilter, prelude::*};
use tracing::{info, instrument, warn};

/// What [`initialize_store`] put into the document store.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedReport {
    /// Countries written
    pub countries: usize,
    /// Categories written
    pub categories: usize,
    /// Products imported from the mirror
    pub products: usize,
    /// Purchases imported from the mirror
    pub purchases: usize,
    /// Keys of the settings written
    pub settings: Vec<&'static str>,
}

/// Seeds empty tables of the document store. Does nothing in file-only mode.
///
/// # Errors
/// Returns an error if a table cannot be counted or a mirror file cannot be written.
#[instrument(skip(store))]
pub async fn initialize_store(store: &Store) -> Result<SeedReport> {
    let Some(db) = store.db() else {
        info!("No document store configured, running from JSON files only");
        return Ok(SeedReport::default());
    };

    let _guard = store.lock_writes().await;
    let mut report = SeedReport::default();

    // An unreadable mirror is left as it is, for someone to fix by hand.
    if Country::find().count(db).await? == 0 {
        match store.files().read::<CountriesFile>(COUNTRIES_FILE).await {
            Ok(file) => {
                let countries =
                    file.map_or_else(country::default_countries, CountriesFile::into_countries);
                country::save_countries(store, &countries).await?;
                report.countries = countries.len();
            }
            Err(e) => warn!("Not seeding countries from {COUNTRIES_FILE}: {e}"),
        }
    }

    if Category::find().count(db).await? == 0 {
        match store.files().read::<CategoriesFile>(CATEGORIES_FILE).await {
            Ok(file) => {
                let categories =
                    file.map_or_else(category::default_categories, CategoriesFile::into_categories);
                category::save_categories(store, &categories).await?;
                report.categories = categories.len();
            }
            Err(e) => warn!("Not seeding categories from {CATEGORIES_FILE}: {e}"),
        }
    }

    if Product::find().count(db).await? == 0 {
        match store.files().read::<Vec<models::Product>>(PRODUCTS_FILE).await {
            Ok(Some(products)) if !products.is_empty() => {
                product::save_products(store, &products).await?;
                report.products = products.len();
            }
            Ok(_) => {}
            Err(e) => warn!("Not importing {PRODUCTS_FILE}: {e}"),
        }
    }

    if Purchase::find().count(db).await? == 0 {
        report.purchases = import_history(store, db).await;
    }

    // Without a configured URL checkout falls back to a generated QR code, so only a
    // mirrored URL is imported. The thank-you message falls through to its default.
    if !has_setting(db, SettingKey::QrCode).await? {
        if let Some(url) = settings::configured_qrcode_url(store).await {
            settings::save_qrcode_url(store, &url).await?;
            report.settings.push(SettingKey::QrCode.key());
        }
    }
    if !has_setting(db, SettingKey::ThankYou).await? {
        let message = settings::load_thank_you_message(store).await;
        settings::save_thank_you_message(store, &message).await?;
        report.settings.push(SettingKey::ThankYou.key());
    }

    info!(
        "Document store seeded: {} countries, {} categories, {} products, {} purchases, settings {:?}",
        report.countries, report.categories, report.products, report.purchases, report.settings
    );
    Ok(report)
}

async fn has_setting(db: &DatabaseConnection, key: SettingKey) -> Result<bool> {
    let count = Setting::find()
        .filter(setting::Column::Key.eq(key.key()))
        .count(db)
        .await?;
    Ok(count > 0)
}

async fn import_history(store: &Store, db: &DatabaseConnection) -> usize {
    let history = match store.files().read::<Vec<PurchaseRecord>>(HISTORY_FILE).await {
        Ok(Some(history)) => history,
        Ok(None) => return 0,
        Err(e) => {
            warn!("Not importing {HISTORY_FILE}: {e}");
            return 0;
        }
    };

    let mut imported = 0;
    for record in &history {
        match purchase::insert_record(db, record).await {
            Ok(()) => imported += 1,
            Err(e) => warn!("Skipping purchase from {}: {e}", record.user_name),
        }
    }
    imported
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_seeds_defaults_into_empty_store() -> Result<()> {
        let (store, _dir) = setup_test_store().await?;

        let report = initialize_store(&store).await?;

        assert_eq!(report.countries, 5);
        assert_eq!(report.categories, 7);
        assert_eq!(report.products, 0);
        assert_eq!(report.settings, ["thank_you"]);
        assert!(!has_setting(store.db().unwrap(), SettingKey::QrCode).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_imports_mirror_files() -> Result<()> {
        let (store, dir) = setup_test_store().await?;
        let mirror = Store::new(None, dir.path());
        product::save_product(&mirror, sample_product("Gold", "1", "money")).await?;
        settings::save_qrcode_url(&mirror, "https://example.com/qr.png").await?;

        let report = initialize_store(&store).await?;

        assert_eq!(report.products, 1);
        assert_eq!(Product::find().count(store.db().unwrap()).await?, 1);
        assert_eq!(
            settings::load_qrcode_url(&store).await,
            "https://example.com/qr.png"
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_second_run_changes_nothing() -> Result<()> {
        let (store, _dir) = setup_test_store().await?;
        initialize_store(&store).await?;
        let report = initialize_store(&store).await?;
        assert_eq!(report, SeedReport::default());
        Ok(())
    }

    #[tokio::test]
    async fn test_file_only_mode_is_a_no_op() -> Result<()> {
        let (store, dir) = setup_file_only_store()?;
        assert_eq!(initialize_store(&store).await?, SeedReport::default());
        assert!(!dir.path().join(COUNTRIES_FILE).exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_unreadable_mirror_is_not_seeded_over() -> Result<()> {
        let (store, _dir) = setup_test_store().await?;
        let path = store.files().path(COUNTRIES_FILE);
        std::fs::write(&path, "{\"countries\": [")?;

        let report = initialize_store(&store).await?;

        assert_eq!(report.countries, 0);
        assert_eq!(report.categories, 7);
        assert_eq!(std::fs::read_to_string(&path)?, "{\"countries\": [");
        Ok(())
    }

    #[tokio::test]
    async fn test_imports_keyed_countries_and_naive_history() -> Result<()> {
        let (store, _dir) = setup_test_store().await?;
        let countries = r#"{"countries": ["1", "8"], "country_names": {"1": "Thailand", "8": "Laos"}, "country_emojis": {}, "country_codes": {}}"#;
        let history = r#"[{"user_id": "9", "user_name": "old", "items": [], "total_price": 0.0, "timestamp": "2024-05-01T12:00:00"}]"#;
        std::fs::write(store.files().path(COUNTRIES_FILE), countries)?;
        std::fs::write(store.files().path(HISTORY_FILE), history)?;

        let report = initialize_store(&store).await?;

        assert_eq!(report.countries, 2);
        assert_eq!(report.purchases, 1);
        assert!(country::get_country(&store, "8").await.is_some());
        Ok(())
    }
}
