//! Product business logic - Handles all product-related operations.
//!
//! Products live in one collection and every change rewrites the whole collection, in
//! the document store when it is connected and always in `products.json`. A product is
//! identified by its `(name, country, category)` slot; saving into an occupied slot
//! replaces the previous record.

use crate::{
    core::{category, country},
    entities::{Product as ProductEntity, product},
    errors::{Error, Result},
    models::{Product, ProductChanges},
    store::{Store, files::PRODUCTS_FILE},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde_json::Value;
use tracing::{info, instrument, warn};

/// Name of the filler product shown in empty catalogue slots.
pub const PLACEHOLDER_NAME: &str = "No products";
const PLACEHOLDER_EMOJI: &str = "❌";

/// Fields every batch entry must carry.
pub const REQUIRED_FIELDS: [&str; 5] = ["name", "price", "emoji", "country", "category"];

/// Whether a save created a new product or replaced one in the same slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// A new product was stored
    Added,
    /// A product in the same slot was replaced
    Updated,
}

/// Result of [`batch_add_products`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchReport {
    /// Entries that created a new product
    pub added: usize,
    /// Entries that replaced an existing product
    pub updated: usize,
    /// One message per rejected entry, prefixed with its 1-based position
    pub errors: Vec<String>,
}

impl BatchReport {
    /// Products added or updated.
    #[must_use]
    pub const fn saved(&self) -> usize {
        self.added + self.updated
    }
}

/// True for the stand-ins inserted by [`add_no_product_placeholders`].
#[must_use]
pub fn is_placeholder(product: &Product) -> bool {
    product.name == PLACEHOLDER_NAME && product.price == 0.0
}

/// Checks name and price of a product before it is stored.
///
/// # Errors
/// Returns [`Error::Config`] for blank text fields and [`Error::InvalidPrice`] for a
/// negative or non-finite price.
pub fn validate_product(product: &Product) -> Result<()> {
    if product.name.trim().is_empty() {
        return Err(Error::Config {
            message: "Product name cannot be empty".to_string(),
        });
    }
    if product.country.trim().is_empty() || product.category.trim().is_empty() {
        return Err(Error::Config {
            message: "Product country and category cannot be empty".to_string(),
        });
    }
    if !product.price.is_finite() || product.price < 0.0 {
        return Err(Error::InvalidPrice {
            price: product.price,
        });
    }
    Ok(())
}

/// Loads products, optionally filtered by country and/or category.
///
/// Country filters accept legacy names. When the document store cannot be queried the
/// mirror file is used; a missing or unreadable file means no products.
#[instrument(skip(store))]
pub async fn load_products(
    store: &Store,
    country: Option<&str>,
    category: Option<&str>,
) -> Vec<Product> {
    read_products(store, country, category)
        .await
        .unwrap_or_else(|e| {
            warn!("Could not load products from {PRODUCTS_FILE}: {e}");
            Vec::new()
        })
}

/// Like [`load_products`], but an unparsable mirror file is an error. Every path that
/// writes the collection back reads it through here.
///
/// # Errors
/// Returns an error if the mirror file cannot be read or parsed.
pub async fn read_products(
    store: &Store,
    country: Option<&str>,
    category: Option<&str>,
) -> Result<Vec<Product>> {
    let country = country.map(country::resolve_country_code);
    let category = category.map(str::trim);

    if let Some(db) = store.db() {
        match load_from_db(db, country.as_deref(), category).await {
            Ok(products) => return Ok(products),
            Err(e) => warn!("Could not load products from the document store: {e}"),
        }
    }

    let products = store
        .files()
        .read::<Vec<Product>>(PRODUCTS_FILE)
        .await?
        .unwrap_or_default();
    Ok(products
        .into_iter()
        .filter(|p| country.as_deref().is_none_or(|c| p.country == c))
        .filter(|p| category.is_none_or(|c| p.category == c))
        .collect())
}

/// Replaces the whole product collection.
///
/// # Errors
/// Returns an error only if the mirror file cannot be written.
pub async fn save_products(store: &Store, products: &[Product]) -> Result<()> {
    if let Some(db) = store.db() {
        if let Err(e) = replace_in_db(db, products).await {
            warn!("Could not save products to the document store: {e}");
        }
    }
    store.files().write(PRODUCTS_FILE, products).await
}

/// Saves one product, replacing any product in the same `(name, country, category)` slot.
///
/// A placeholder occupying the slot's country and category is dropped.
#[instrument(skip(store))]
pub async fn save_product(store: &Store, product: Product) -> Result<SaveOutcome> {
    let product = normalize(product);
    validate_product(&product)?;

    let _guard = store.lock_writes().await;
    let mut products = read_products(store, None, None).await?;
    let outcome = upsert(&mut products, product);
    save_products(store, &products).await?;
    Ok(outcome)
}

/// Adds many products from raw JSON entries.
///
/// Entries missing a required field, with a field of the wrong type, or failing
/// validation are reported in [`BatchReport::errors`]; the remaining entries are still
/// saved.
#[instrument(skip_all, fields(entries = entries.len()))]
pub async fn batch_add_products(store: &Store, entries: &[Value]) -> Result<BatchReport> {
    let mut report = BatchReport::default();
    let mut accepted = Vec::new();

    for (index, entry) in entries.iter().enumerate() {
        match parse_entry(entry) {
            Ok(product) => accepted.push(product),
            Err(message) => report.errors.push(format!("#{}: {message}", index + 1)),
        }
    }

    if accepted.is_empty() {
        return Ok(report);
    }

    let _guard = store.lock_writes().await;
    let mut products = read_products(store, None, None).await?;
    for product in accepted {
        match upsert(&mut products, product) {
            SaveOutcome::Added => report.added += 1,
            SaveOutcome::Updated => report.updated += 1,
        }
    }
    save_products(store, &products).await?;

    info!(
        "Batch import: {} added, {} updated, {} rejected",
        report.added,
        report.updated,
        report.errors.len()
    );
    Ok(report)
}

/// Removes every product called `name`, optionally limited to a category and/or country.
///
/// Returns the number of products removed.
#[instrument(skip(store))]
pub async fn remove_product(
    store: &Store,
    name: &str,
    category: Option<&str>,
    country: Option<&str>,
) -> Result<usize> {
    let country = country.map(country::resolve_country_code);
    let _guard = store.lock_writes().await;
    retain_products(store, |p| {
        !(p.name == name
            && category.is_none_or(|c| p.category == c)
            && country.as_deref().is_none_or(|c| p.country == c))
    })
    .await
}

/// Applies `changes` to the first product called `name` in `country`.
///
/// # Errors
/// Returns [`Error::ProductNotFound`] if there is no such product, and a validation
/// error if the edited product is invalid or would collide with another product.
#[instrument(skip(store))]
pub async fn update_product(
    store: &Store,
    name: &str,
    country: &str,
    changes: ProductChanges,
) -> Result<Product> {
    let country_code = country::resolve_country_code(country);
    let _guard = store.lock_writes().await;
    let mut products = read_products(store, None, None).await?;

    let index = products
        .iter()
        .position(|p| p.name == name && p.country == country_code)
        .ok_or_else(|| Error::ProductNotFound {
            name: name.to_string(),
        })?;

    if changes.is_empty() {
        return Ok(products[index].clone());
    }

    let mut edited = products[index].clone();
    if let Some(emoji) = changes.emoji {
        edited.emoji = emoji;
    }
    if let Some(new_name) = changes.name {
        edited.name = new_name;
    }
    if let Some(price) = changes.price {
        edited.price = price;
    }
    if let Some(category) = changes.category {
        edited.category = category;
    }
    if let Some(new_country) = changes.country {
        edited.country = country::resolve_country_code(&new_country);
    }
    let edited = normalize(edited);
    validate_product(&edited)?;

    let collides = products
        .iter()
        .enumerate()
        .any(|(i, p)| i != index && p.same_slot(&edited));
    if collides {
        return Err(Error::Config {
            message: format!(
                "A product named '{}' already exists in {}/{}",
                edited.name, edited.country, edited.category
            ),
        });
    }

    products[index] = edited.clone();
    save_products(store, &products).await?;
    Ok(edited)
}

/// Removes all products of a category, in one country or in all of them.
#[instrument(skip(store))]
pub async fn clear_category_products(
    store: &Store,
    category: &str,
    country: Option<&str>,
) -> Result<usize> {
    let country = country.map(country::resolve_country_code);
    let _guard = store.lock_writes().await;
    retain_products(store, |p| {
        !(p.category == category && country.as_deref().is_none_or(|c| p.country == c))
    })
    .await
}

/// Removes every product in every country and category.
#[instrument(skip(store))]
pub async fn delete_all_products(store: &Store) -> Result<usize> {
    let _guard = store.lock_writes().await;
    retain_products(store, |_| false).await
}

/// Fills every empty `(country, category)` pair with a placeholder product.
///
/// Returns how many placeholders were inserted.
#[instrument(skip(store))]
pub async fn add_no_product_placeholders(store: &Store) -> Result<usize> {
    let countries = country::load_countries(store).await;
    let categories = category::load_categories(store).await;

    let _guard = store.lock_writes().await;
    let mut products = read_products(store, None, None).await?;
    let mut inserted = 0;

    for country in &countries {
        for category in &categories {
            let occupied = products
                .iter()
                .any(|p| p.country == country.code && p.category == category.code);
            if !occupied {
                products.push(Product {
                    name: PLACEHOLDER_NAME.to_string(),
                    price: 0.0,
                    emoji: PLACEHOLDER_EMOJI.to_string(),
                    country: country.code.clone(),
                    category: category.code.clone(),
                });
                inserted += 1;
            }
        }
    }

    if inserted > 0 {
        save_products(store, &products).await?;
    }
    Ok(inserted)
}

/// Keeps only the products for which `keep` returns true and returns how many were
/// dropped. Does not take the write lock; callers hold it.
pub(crate) async fn retain_products<F>(store: &Store, keep: F) -> Result<usize>
where
    F: Fn(&Product) -> bool,
{
    let mut products = read_products(store, None, None).await?;
    let before = products.len();
    products.retain(|p| keep(p));
    let removed = before - products.len();
    if removed > 0 {
        save_products(store, &products).await?;
    }
    Ok(removed)
}

fn normalize(mut product: Product) -> Product {
    product.name = product.name.trim().to_string();
    product.emoji = product.emoji.trim().to_string();
    product.country = country::resolve_country_code(&product.country);
    product.category = product.category.trim().to_string();
    product
}

fn upsert(products: &mut Vec<Product>, product: Product) -> SaveOutcome {
    if !is_placeholder(&product) {
        products.retain(|p| {
            !(is_placeholder(p) && p.country == product.country && p.category == product.category)
        });
    }

    if let Some(existing) = products.iter_mut().find(|p| p.same_slot(&product)) {
        *existing = product;
        SaveOutcome::Updated
    } else {
        products.push(product);
        SaveOutcome::Added
    }
}

fn parse_entry(entry: &Value) -> std::result::Result<Product, String> {
    let Some(object) = entry.as_object() else {
        return Err("entry is not an object".to_string());
    };

    let missing: Vec<&str> = REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|field| object.get(*field).is_none_or(Value::is_null))
        .collect();
    if !missing.is_empty() {
        return Err(format!("missing field(s): {}", missing.join(", ")));
    }

    let product: Product = serde_json::from_value(entry.clone()).map_err(|e| e.to_string())?;
    let product = normalize(product);
    validate_product(&product).map_err(|e| e.to_string())?;
    Ok(product)
}

async fn load_from_db(
    db: &DatabaseConnection,
    country: Option<&str>,
    category: Option<&str>,
) -> Result<Vec<Product>> {
    let mut query = ProductEntity::find();
    if let Some(country) = country {
        query = query.filter(product::Column::Country.eq(country));
    }
    if let Some(category) = category {
        query = query.filter(product::Column::Category.eq(category));
    }
    let rows = query.order_by_asc(product::Column::Id).all(db).await?;
    Ok(rows.into_iter().map(Product::from).collect())
}

async fn replace_in_db(db: &DatabaseConnection, products: &[Product]) -> Result<()> {
    let txn = db.begin().await?;
    ProductEntity::delete_many().exec(&txn).await?;
    if !products.is_empty() {
        let rows = products.iter().map(|p| product::ActiveModel {
            name: Set(p.name.clone()),
            price: Set(p.price),
            emoji: Set(p.emoji.clone()),
            country: Set(p.country.clone()),
            category: Set(p.category.clone()),
            ..Default::default()
        });
        ProductEntity::insert_many(rows).exec(&txn).await?;
    }
    txn.commit().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_validate_product() {
        let mut product = sample_product("Gold", "1", "money");
        assert!(validate_product(&product).is_ok());

        product.price = -1.0;
        assert!(matches!(
            validate_product(&product),
            Err(Error::InvalidPrice { .. })
        ));

        product.price = f64::NAN;
        assert!(matches!(
            validate_product(&product),
            Err(Error::InvalidPrice { .. })
        ));

        product.price = 1.0;
        product.name = "   ".to_string();
        assert!(matches!(
            validate_product(&product),
            Err(Error::Config { .. })
        ));
    }

    #[tokio::test]
    async fn test_save_then_load_by_country_and_category() -> Result<()> {
        let (store, _dir) = setup_test_store().await?;
        let product = Product {
            name: "AK-47".to_string(),
            price: 1500.0,
            emoji: "🔫".to_string(),
            country: "2".to_string(),
            category: "weapon".to_string(),
        };

        let outcome = save_product(&store, product.clone()).await?;
        assert_eq!(outcome, SaveOutcome::Added);

        let loaded = load_products(&store, Some("2"), Some("weapon")).await;
        assert_eq!(loaded, vec![product]);

        assert!(load_products(&store, Some("1"), Some("weapon")).await.is_empty());
        assert!(load_products(&store, Some("2"), Some("money")).await.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_save_product_same_slot_updates() -> Result<()> {
        let (store, _dir) = setup_test_store().await?;
        create_test_product(&store, "Gold", "1", "money").await?;

        let mut changed = sample_product("Gold", "thailand", "money");
        changed.price = 99.0;
        let outcome = save_product(&store, changed).await?;

        assert_eq!(outcome, SaveOutcome::Updated);
        let loaded = load_products(&store, Some("1"), Some("money")).await;
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].price, 99.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_batch_add_skips_invalid_entries() -> Result<()> {
        let (store, _dir) = setup_test_store().await?;
        let entries = vec![
            json!({"name": "Gold", "price": 10, "emoji": "💰", "country": "1", "category": "money"}),
            json!({"name": "Silver", "price": 5, "country": "1"}),
            json!({"name": "Bad price", "price": "ten", "emoji": "x", "country": "1", "category": "money"}),
            json!("not an object"),
            json!({"name": "Katana", "price": 250.5, "emoji": "🗡️", "country": "2", "category": "weapon"}),
        ];

        let report = batch_add_products(&store, &entries).await?;

        assert_eq!(report.added, 2);
        assert_eq!(report.updated, 0);
        assert_eq!(report.errors.len(), 3);
        assert!(report.errors[0].starts_with("#2: missing field(s): emoji, category"));
        assert!(report.errors[1].starts_with("#3:"));
        assert!(report.errors[2].starts_with("#4:"));

        let names: Vec<String> = load_products(&store, None, None)
            .await
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Gold".to_string(), "Katana".to_string()]);
        Ok(())
    }

    #[tokio::test]
    async fn test_remove_product_with_filters() -> Result<()> {
        let (store, _dir) = setup_test_store().await?;
        create_test_product(&store, "Gold", "1", "money").await?;
        create_test_product(&store, "Gold", "2", "money").await?;
        create_test_product(&store, "Gold", "2", "item").await?;

        assert_eq!(remove_product(&store, "Gold", Some("money"), Some("2")).await?, 1);
        assert_eq!(remove_product(&store, "Gold", None, None).await?, 2);
        assert_eq!(remove_product(&store, "Gold", None, None).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_product() -> Result<()> {
        let (store, _dir) = setup_test_store().await?;
        create_test_product(&store, "Gold", "1", "money").await?;
        create_test_product(&store, "Silver", "1", "money").await?;

        let updated = update_product(
            &store,
            "Gold",
            "1",
            ProductChanges {
                price: Some(42.0),
                emoji: Some("🥇".to_string()),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(updated.price, 42.0);
        assert_eq!(updated.emoji, "🥇");

        let collision = update_product(
            &store,
            "Gold",
            "1",
            ProductChanges {
                name: Some("Silver".to_string()),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(collision, Err(Error::Config { .. })));

        let missing = update_product(&store, "Platinum", "1", ProductChanges::default()).await;
        assert!(matches!(missing, Err(Error::ProductNotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_clear_category_and_delete_all() -> Result<()> {
        let (store, _dir) = setup_test_store().await?;
        create_test_product(&store, "Gold", "1", "money").await?;
        create_test_product(&store, "Yen", "2", "money").await?;
        create_test_product(&store, "Katana", "2", "weapon").await?;

        assert_eq!(clear_category_products(&store, "money", Some("2")).await?, 1);
        assert_eq!(clear_category_products(&store, "money", None).await?, 1);
        assert_eq!(delete_all_products(&store).await?, 1);
        assert!(load_products(&store, None, None).await.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_placeholders_fill_only_empty_slots() -> Result<()> {
        let (store, _dir) = setup_test_store().await?;
        create_test_product(&store, "Gold", "1", "money").await?;

        let inserted = add_no_product_placeholders(&store).await?;
        // 5 countries x 7 categories, one slot already taken
        assert_eq!(inserted, 34);
        assert_eq!(add_no_product_placeholders(&store).await?, 0);

        let weapons = load_products(&store, Some("1"), Some("weapon")).await;
        assert_eq!(weapons.len(), 1);
        assert!(is_placeholder(&weapons[0]));

        // A real product replaces the placeholder in its slot
        create_test_product(&store, "Pistol", "1", "weapon").await?;
        let weapons = load_products(&store, Some("1"), Some("weapon")).await;
        assert_eq!(weapons.len(), 1);
        assert_eq!(weapons[0].name, "Pistol");
        Ok(())
    }

    #[tokio::test]
    async fn test_file_only_products() -> Result<()> {
        let (store, _dir) = setup_file_only_store()?;
        assert!(load_products(&store, None, None).await.is_empty());

        create_test_product(&store, "Gold", "1", "money").await?;
        let loaded = load_products(&store, Some("thailand"), Some("money")).await;
        assert_eq!(loaded.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_unreadable_mirror_is_not_overwritten() -> Result<()> {
        let (store, _dir) = setup_file_only_store()?;
        let path = store.files().path(PRODUCTS_FILE);
        std::fs::write(&path, "[{\"name\": ")?;

        let result = save_product(&store, sample_product("Gold", "1", "money")).await;

        assert!(result.is_err());
        assert_eq!(std::fs::read_to_string(&path)?, "[{\"name\": ");
        assert!(delete_all_products(&store).await.is_err());
        Ok(())
    }
}
