//! Shared test utilities for the shop bot.
//!
//! This module provides helpers for setting up a store backed by an in-memory database
//! and a temporary mirror directory, and for creating catalogue entries with sensible
//! defaults.

use crate::{
    core::product,
    errors::Result,
    models::Product,
    store::Store,
};
use tempfile::TempDir;

/// Creates a store backed by an in-memory `SQLite` database with all tables initialized,
/// mirroring into a fresh temporary directory.
///
/// Keep the returned [`TempDir`] alive for the duration of the test.
pub async fn setup_test_store() -> Result<(Store, TempDir)> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    let dir = tempfile::tempdir()?;
    let store = Store::new(Some(db), dir.path());
    Ok((store, dir))
}

/// Creates a store without a document store, so everything goes through the mirror files.
pub fn setup_file_only_store() -> Result<(Store, TempDir)> {
    let dir = tempfile::tempdir()?;
    let store = Store::new(None, dir.path());
    Ok((store, dir))
}

/// Builds a product record without saving it.
///
/// # Defaults
/// * price: 10.0
/// * emoji: "📦"
#[must_use]
pub fn sample_product(name: &str, country: &str, category: &str) -> Product {
    Product {
        name: name.to_string(),
        price: 10.0,
        emoji: "📦".to_string(),
        country: country.to_string(),
        category: category.to_string(),
    }
}

/// Saves a product with the defaults of [`sample_product`] and returns it.
pub async fn create_test_product(
    store: &Store,
    name: &str,
    country: &str,
    category: &str,
) -> Result<Product> {
    let product = sample_product(name, country, category);
    product::save_product(store, product.clone()).await?;
    Ok(product)
}
