//! Purchase history.
//!
//! Purchases are append-only. Each checkout is inserted into the document store and
//! appended to `history.json`.

use crate::{
    entities::{Purchase as PurchaseEntity, purchase},
    errors::{Error, Result},
    models::{PurchaseItem, PurchaseRecord},
    store::{Store, files::HISTORY_FILE},
};
use chrono::Utc;
use sea_orm::{QueryOrder, QuerySelect, Set, prelude::*};
use tracing::{info, instrument, warn};

/// Number of records returned by `history` when no limit is given.
pub const DEFAULT_HISTORY_LIMIT: u64 = 5;

/// Records a checkout and returns the stored record.
///
/// # Errors
/// Returns [`Error::EmptyCart`] when `items` is empty, or an error if the history file
/// cannot be read or written. An unreadable history file is left untouched and nothing
/// is recorded.
#[instrument(skip(store, items), fields(items = items.len()))]
pub async fn log_purchase(
    store: &Store,
    user_id: &str,
    user_name: &str,
    items: Vec<PurchaseItem>,
    total_price: f64,
) -> Result<PurchaseRecord> {
    if items.is_empty() {
        return Err(Error::EmptyCart);
    }

    let record = PurchaseRecord {
        user_id: user_id.to_string(),
        user_name: user_name.to_string(),
        items,
        total_price,
        timestamp: Utc::now(),
    };

    let _guard = store.lock_writes().await;
    let mut history = read_history_file(store).await?;

    if let Some(db) = store.db() {
        if let Err(e) = insert_record(db, &record).await {
            warn!("Could not log purchase to the document store: {e}");
        }
    }

    history.push(record.clone());
    store.files().write(HISTORY_FILE, &history).await?;

    info!(
        "Logged purchase of {} line(s) for {} ({:.2})",
        record.items.len(),
        record.user_name,
        record.total_price
    );
    Ok(record)
}

/// Returns the `limit` most recent purchases, newest first.
#[instrument(skip(store))]
pub async fn get_purchase_history(store: &Store, limit: u64) -> Vec<PurchaseRecord> {
    if let Some(db) = store.db() {
        match load_from_db(db, limit).await {
            Ok(records) => return records,
            Err(e) => warn!("Could not load purchase history from the document store: {e}"),
        }
    }

    let mut history = match read_history_file(store).await {
        Ok(history) => history,
        Err(e) => {
            warn!("Could not read {HISTORY_FILE}: {e}");
            return Vec::new();
        }
    };
    history.reverse();
    history.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    history.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
    history
}

async fn read_history_file(store: &Store) -> Result<Vec<PurchaseRecord>> {
    Ok(store
        .files()
        .read::<Vec<PurchaseRecord>>(HISTORY_FILE)
        .await?
        .unwrap_or_default())
}

pub(crate) async fn insert_record(db: &DatabaseConnection, record: &PurchaseRecord) -> Result<()> {
    purchase::ActiveModel {
        user_id: Set(record.user_id.clone()),
        user_name: Set(record.user_name.clone()),
        items: Set(serde_json::to_string(&record.items)?),
        total_price: Set(record.total_price),
        timestamp: Set(record.timestamp),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(())
}

async fn load_from_db(db: &DatabaseConnection, limit: u64) -> Result<Vec<PurchaseRecord>> {
    let rows = PurchaseEntity::find()
        .order_by_desc(purchase::Column::Timestamp)
        .order_by_desc(purchase::Column::Id)
        .limit(limit)
        .all(db)
        .await?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let id = row.id;
        match PurchaseRecord::try_from(row) {
            Ok(record) => records.push(record),
            Err(e) => warn!("Skipping purchase {id} with unreadable items: {e}"),
        }
    }
    Ok(records)
}
