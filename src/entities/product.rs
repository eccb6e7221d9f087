//! Product entity - a sellable item within one country and category.
//!
//! Names are unique inside a `(country, category)` pair. The data-access layer
//! checks this by scanning, the table carries no constraint for it.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Row identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name of the product
    pub name: String,
    /// Unit price
    pub price: f64,
    /// Emoji shown next to the name
    pub emoji: String,
    /// Country code the product is listed under
    pub country: String,
    /// Category code the product is listed under
    pub category: String,
}

/// Products have no declared relations; country and category are plain codes.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
