//! Core business logic, independent of Discord.
//!
//! Every function takes a [`Store`](crate::store::Store) and works the same way whether
//! a document store is connected or the shop runs from JSON files only.

/// Catalogue export as bot commands
pub mod backup;
/// Shopping cart and paging helpers
pub mod cart;
/// Category CRUD
pub mod category;
/// Message counter in the target channel's name
pub mod channel_counter;
/// Country CRUD and legacy code resolution
pub mod country;
/// Payment QR code: configured image or a generated PNG
pub mod payment_qr;
/// Product CRUD, batch import and placeholders
pub mod product;
/// Purchase history
pub mod purchase;
/// First-start seeding of the document store
pub mod seed;
/// Configuration singletons
pub mod settings;
