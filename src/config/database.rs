//! Document store connection and table creation.
//!
//! The store is optional: when no connection string is configured, or the connection
//! fails, the bot runs on the JSON mirror files alone. Tables are generated from the
//! entity definitions with `Schema::create_table_from_entity`.

use crate::entities::{Category, Country, Product, Purchase, Setting};
use crate::errors::Result;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema,
};
use std::time::Duration;
use tracing::{info, warn};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Establishes a connection to the document store at `url`.
pub async fn create_connection(url: &str) -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(url.to_owned());
    options
        .connect_timeout(CONNECT_TIMEOUT)
        .sqlx_logging(false);

    Database::connect(options).await.map_err(Into::into)
}

/// Creates all tables that do not exist yet.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    create_table(db, Country).await?;
    create_table(db, Category).await?;
    create_table(db, Product).await?;
    create_table(db, Purchase).await?;
    create_table(db, Setting).await?;
    Ok(())
}

async fn create_table<E: EntityTrait>(db: &DatabaseConnection, entity: E) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

/// Connects and prepares the document store, or returns `None` to run in file-only mode.
///
/// Failures are logged, never returned: the JSON mirror is always available.
pub async fn connect_document_store(url: Option<&str>) -> Option<DatabaseConnection> {
    let Some(url) = url else {
        warn!("DATABASE_URL is not set, running on JSON files only");
        return None;
    };

    let db = match create_connection(url).await {
        Ok(db) => db,
        Err(e) => {
            warn!("Could not connect to the document store: {e}. Falling back to JSON files");
            return None;
        }
    };

    if let Err(e) = create_tables(&db).await {
        warn!("Could not prepare document store tables: {e}. Falling back to JSON files");
        return None;
    }

    info!("Connected to the document store");
    Some(db)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{CountryModel, ProductModel, PurchaseModel, SettingModel};
    use sea_orm::QuerySelect;

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        let _: Vec<CountryModel> = Country::find().limit(1).all(&db).await?;
        let _: Vec<ProductModel> = Product::find().limit(1).all(&db).await?;
        let _: Vec<PurchaseModel> = Purchase::find().limit(1).all(&db).await?;
        let _: Vec<SettingModel> = Setting::find().limit(1).all(&db).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_connect_without_url_is_file_only() {
        assert!(connect_document_store(None).await.is_none());
    }

    #[tokio::test]
    async fn test_connect_bad_url_falls_back() {
        assert!(
            connect_document_store(Some("notadb://nowhere"))
                .await
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_connect_in_memory() {
        assert!(
            connect_document_store(Some("sqlite::memory:"))
                .await
                .is_some()
        );
    }
}
