//! Category business logic.
//!
//! Categories are shared by every country. Removing one also removes the products
//! filed under it in all countries.

use crate::{
    core::product,
    entities::{Category as CategoryEntity, category},
    errors::{Error, Result},
    models::{CategoriesFile, Category},
    store::{Store, files::CATEGORIES_FILE},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{debug, info, instrument, warn};

/// The built-in category set.
#[must_use]
pub fn default_categories() -> Vec<Category> {
    [
        ("money", "Money", "💰"),
        ("weapon", "Weapons", "🔫"),
        ("item", "Items", "📦"),
        ("story", "Story", "📖"),
        ("car", "Cars", "🚗"),
        ("fashion", "Fashion", "👕"),
        ("rentcar", "Car rental", "🚙"),
    ]
    .into_iter()
    .map(|(code, name, emoji)| Category {
        code: code.to_string(),
        name: name.to_string(),
        emoji: emoji.to_string(),
    })
    .collect()
}

/// Loads all categories: document store, then mirror file, then built-in defaults.
#[instrument(skip(store))]
pub async fn load_categories(store: &Store) -> Vec<Category> {
    read_categories(store).await.unwrap_or_else(|e| {
        warn!("Could not load categories from {CATEGORIES_FILE}: {e}");
        default_categories()
    })
}

/// Like [`load_categories`], but an unparsable mirror file is an error.
///
/// # Errors
/// Returns an error if the mirror file cannot be read or parsed.
pub async fn read_categories(store: &Store) -> Result<Vec<Category>> {
    if let Some(db) = store.db() {
        match load_from_db(db).await {
            Ok(categories) if !categories.is_empty() => return Ok(categories),
            Ok(_) => debug!("No categories in the document store, trying the mirror file"),
            Err(e) => warn!("Could not load categories from the document store: {e}"),
        }
    }

    Ok(store
        .files()
        .read::<CategoriesFile>(CATEGORIES_FILE)
        .await?
        .map_or_else(default_categories, CategoriesFile::into_categories))
}

/// Replaces the whole category collection.
pub async fn save_categories(store: &Store, categories: &[Category]) -> Result<()> {
    if let Some(db) = store.db() {
        if let Err(e) = replace_in_db(db, categories).await {
            warn!("Could not save categories to the document store: {e}");
        }
    }
    store.files().write(CATEGORIES_FILE, categories).await
}

/// Looks up one category by code.
pub async fn get_category(store: &Store, code: &str) -> Option<Category> {
    let code = code.trim();
    load_categories(store)
        .await
        .into_iter()
        .find(|c| c.code == code)
}

/// Adds a new category.
///
/// # Errors
/// Returns [`Error::CategoryExists`] for a duplicate code.
#[instrument(skip(store))]
pub async fn add_category(store: &Store, code: &str, name: &str, emoji: &str) -> Result<Category> {
    let code = code.trim();
    if code.is_empty() || name.trim().is_empty() {
        return Err(Error::Config {
            message: "Category code and name cannot be empty".to_string(),
        });
    }

    let _guard = store.lock_writes().await;
    let mut categories = read_categories(store).await?;
    if categories.iter().any(|c| c.code == code) {
        return Err(Error::CategoryExists {
            code: code.to_string(),
        });
    }

    let category = Category {
        code: code.to_string(),
        name: name.trim().to_string(),
        emoji: emoji.trim().to_string(),
    };
    categories.push(category.clone());
    save_categories(store, &categories).await?;
    info!("Added category {} ({})", category.name, category.code);
    Ok(category)
}

/// Changes the name and/or emoji of a category. Blank values are left untouched.
#[instrument(skip(store))]
pub async fn edit_category(
    store: &Store,
    code: &str,
    new_name: Option<&str>,
    new_emoji: Option<&str>,
) -> Result<Category> {
    let code = code.trim();
    let _guard = store.lock_writes().await;
    let mut categories = read_categories(store).await?;

    let category = categories
        .iter_mut()
        .find(|c| c.code == code)
        .ok_or_else(|| Error::CategoryNotFound {
            code: code.to_string(),
        })?;

    if let Some(name) = new_name.map(str::trim).filter(|n| !n.is_empty()) {
        category.name = name.to_string();
    }
    if let Some(emoji) = new_emoji.map(str::trim).filter(|e| !e.is_empty()) {
        category.emoji = emoji.to_string();
    }
    let edited = category.clone();

    save_categories(store, &categories).await?;
    Ok(edited)
}

/// Removes a category and its products in every country.
#[instrument(skip(store))]
pub async fn remove_category(store: &Store, code: &str) -> Result<(Category, usize)> {
    let code = code.trim().to_string();
    let _guard = store.lock_writes().await;
    let mut categories = read_categories(store).await?;
    let Some(index) = categories.iter().position(|c| c.code == code) else {
        return Err(Error::CategoryNotFound { code });
    };
    let removed = categories.remove(index);
    save_categories(store, &categories).await?;

    let products_removed = product::retain_products(store, |p| p.category != code).await?;
    info!(
        "Removed category {} and {} of its products",
        removed.code, products_removed
    );
    Ok((removed, products_removed))
}

async fn load_from_db(db: &DatabaseConnection) -> Result<Vec<Category>> {
    let rows = CategoryEntity::find()
        .order_by_asc(category::Column::Position)
        .all(db)
        .await?;
    Ok(rows.into_iter().map(Category::from).collect())
}

async fn replace_in_db(db: &DatabaseConnection, categories: &[Category]) -> Result<()> {
    let txn = db.begin().await?;
    CategoryEntity::delete_many().exec(&txn).await?;
    for (position, c) in (0_i32..).zip(categories) {
        category::ActiveModel {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_default_categories_when_empty() -> Result<()> {
        let (store, _dir) = setup_test_store().await?;
        let categories = load_categories(&store).await;
        let codes: Vec<&str> = categories.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(
            codes,
            ["money", "weapon", "item", "story", "car", "fashion", "rentcar"]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_add_edit_category() -> Result<()> {
        let (store, _dir) = setup_test_store().await?;

        add_category(&store, "boat", "Boats", "⛵").await?;
        let duplicate = add_category(&store, "boat", "Boats", "⛵").await;
        assert!(matches!(duplicate, Err(Error::CategoryExists { .. })));

        let edited = edit_category(&store, "boat", None, Some("🚤")).await?;
        assert_eq!(edited.name, "Boats");
        assert_eq!(edited.emoji, "🚤");

        assert_eq!(load_categories(&store).await.len(), 8);
        Ok(())
    }

    #[tokio::test]
    async fn test_remove_category_removes_products_everywhere() -> Result<()> {
        let (store, _dir) = setup_test_store().await?;
        create_test_product(&store, "Ferrari", "1", "car").await?;
        create_test_product(&store, "Toyota", "2", "car").await?;
        create_test_product(&store, "Gold", "1", "money").await?;

        let (removed, count) = remove_category(&store, "car").await?;

        assert_eq!(removed.code, "car");
        assert_eq!(count, 2);
        assert!(get_category(&store, "car").await.is_none());
        assert_eq!(product::load_products(&store, None, None).await.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_remove_unknown_category() -> Result<()> {
        let (store, _dir) = setup_test_store().await?;
        let result = remove_category(&store, "spaceship").await;
        assert!(matches!(result, Err(Error::CategoryNotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_add_category_keeps_keyed_mirror_entries() -> Result<()> {
        let (store, _dir) = setup_file_only_store()?;
        let keyed = r#"{"category_names": {"boat": "Boats"}, "category_emojis": {"boat": "⛵"}}"#;
        std::fs::write(store.files().path(CATEGORIES_FILE), keyed)?;

        add_category(&store, "plane", "Planes", "✈️").await?;

        let codes: Vec<String> = load_categories(&store)
            .await
            .into_iter()
            .map(|c| c.code)
            .collect();
        assert_eq!(codes, ["boat", "plane"]);
        Ok(())
    }
}
