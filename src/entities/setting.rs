//! Setting entity - key/value configuration singletons.
//! Used for the QR code URL, thank-you message, target channel and the
//! channel-rename counter. Values are JSON encoded.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Setting database model - one row per configuration key
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "settings")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Configuration key (e.g., `"qrcode"`)
    #[sea_orm(unique)]
    pub key: String,
    /// JSON encoded value
    pub value: String,
    /// When this configuration was last modified
    pub updated_at: DateTime,
}

/// `Setting` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
