//! Interactive shop: a message whose buttons walk through countries, categories and
//! products, with a per-message cart.

/// Button custom ids
pub mod ids;
/// Session state and transitions
pub mod session;
/// Rendering and the interaction loop
pub mod view;

pub use view::run_shop;
