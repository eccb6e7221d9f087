//! Purchase entity - append-only log of completed checkouts.
//!
//! Line items are stored as a JSON array in `items` so the record keeps the
//! catalogue state at the time of purchase.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Purchase database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "purchases")]
pub struct Model {
    /// Row identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Discord user ID of the buyer
    pub user_id: String,
    /// Discord username of the buyer at purchase time
    pub user_name: String,
    /// JSON encoded `Vec<PurchaseItem>`
    pub items: String,
    /// Sum of all line subtotals
    pub total_price: f64,
    /// When the purchase was logged
    pub timestamp: DateTimeUtc,
}

/// Purchases have no relations
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
