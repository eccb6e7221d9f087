//! Country entity - top level of the catalogue.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Country database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "countries")]
pub struct Model {
    /// Row identifier
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Short code, e.g. `"1"` or a legacy name
    #[sea_orm(unique)]
    pub code: String,
    /// Display name
    pub name: String,
    /// Emoji shown on buttons
    pub emoji: String,
    /// Display order
    pub position: i32,
}

/// Countries have no relations
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
