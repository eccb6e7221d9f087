//! Entity module - Contains all SeaORM entity definitions for the document store.
//! Each collection of the shop is one table; records are replaced wholesale by the
//! data-access layer rather than patched column by column.

/// Categories table
pub mod category;
/// Countries table
pub mod country;
/// Products table
pub mod product;
/// Purchase history table
pub mod purchase;
/// Key/value settings table
pub mod setting;

// Re-export specific types to avoid conflicts
pub use category::{Column as CategoryColumn, Entity as Category, Model as CategoryModel};
pub use country::{Column as CountryColumn, Entity as Country, Model as CountryModel};
pub use product::{Column as ProductColumn, Entity as Product, Model as ProductModel};
pub use purchase::{Column as PurchaseColumn, Entity as Purchase, Model as PurchaseModel};
pub use setting::{Column as SettingColumn, Entity as Setting, Model as SettingModel};
