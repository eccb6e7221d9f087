//! Discord interaction handlers
//!
//! This module provides handlers for autocomplete and for gateway events the
//! commands do not cover.

/// Autocomplete handlers for country codes, category codes and product names
pub mod autocomplete;
/// Gateway event handler (ready state, target channel counter)
pub mod events;
