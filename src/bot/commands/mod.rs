//! Discord command implementations organized by category.

#![allow(clippy::too_long_first_doc_paragraph)]

/// Category management commands
pub mod category;

/// Country management commands
pub mod country;

/// General utility commands
pub mod general;

/// Purchase history and backup commands
pub mod history;

/// Product management commands
pub mod product;

/// Shop configuration commands
pub mod settings;

/// The shop itself and the payment QR code
pub mod shop;

pub(crate) mod utils;

// Export commands
pub use category::*;
pub use country::*;
pub use general::*;
pub use history::*;
pub use product::*;
pub use settings::*;
pub use shop::*;
