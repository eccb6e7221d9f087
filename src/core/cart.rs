//! Shopping cart for one shop session, plus the paging helpers the shop view uses.
//!
//! The cart only stores product identifiers (`country_category_name`) and quantities.
//! Prices are always taken from the catalogue at the time the totals are computed.

use crate::{
    errors::{Error, Result},
    models::{Product, PurchaseItem},
};
use std::collections::BTreeMap;

/// Buttons per page of a shop step (four rows of five).
pub const ITEMS_PER_PAGE: usize = 20;

/// Largest quantity accepted for one cart line.
pub const MAX_QUANTITY: u32 = 999;

/// Quantities keyed by [`Product::cart_id`](crate::models::Product::cart_id).
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Cart {
    quantities: BTreeMap<String, u32>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the quantity of a line. Zero removes it.
    pub fn set_quantity(&mut self, product_id: &str, quantity: u32) {
        if quantity == 0 {
            self.quantities.remove(product_id);
        } else {
            self.quantities.insert(product_id.to_string(), quantity);
        }
    }

    /// Quantity of one product; 0 when it is not in the cart.
    #[must_use]
    pub fn quantity(&self, product_id: &str) -> u32 {
        self.quantities.get(product_id).copied().unwrap_or(0)
    }

    /// True when no product has a quantity.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.quantities.is_empty()
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.quantities.len()
    }

    /// Removes every line.
    pub fn clear(&mut self) {
        self.quantities.clear();
    }

    /// Prices the cart against `catalogue`. Lines whose product no longer exists are
    /// skipped.
    #[must_use]
    pub fn lines(&self, catalogue: &[Product]) -> Vec<PurchaseItem> {
        self.quantities
            .iter()
            .filter_map(|(id, &quantity)| {
                let product = catalogue.iter().find(|p| &p.cart_id() == id)?;
                Some(PurchaseItem {
                    name: product.name.clone(),
                    country: product.country.clone(),
                    category: product.category.clone(),
                    quantity,
                    unit_price: product.price,
                    subtotal: product.price * f64::from(quantity),
                })
            })
            .collect()
    }
}

/// Sum of the line subtotals.
#[must_use]
pub fn total_price(lines: &[PurchaseItem]) -> f64 {
    lines.iter().map(|line| line.subtotal).sum()
}

/// Parses the quantity typed into the quantity modal.
///
/// # Errors
/// Returns [`Error::InvalidQuantity`] for anything that is not a whole number between 0
/// and [`MAX_QUANTITY`].
pub fn parse_quantity(input: &str) -> Result<u32> {
    let trimmed = input.trim();
    match trimmed.parse::<u32>() {
        Ok(quantity) if quantity <= MAX_QUANTITY => Ok(quantity),
        _ => Err(Error::InvalidQuantity {
            input: trimmed.to_string(),
        }),
    }
}

/// Number of pages needed for `total` items. Always at least one.
#[must_use]
pub const fn page_count(total: usize) -> usize {
    if total == 0 {
        1
    } else {
        total.div_ceil(ITEMS_PER_PAGE)
    }
}

/// Items on `page` (zero-based). Out of range pages are clamped to the last page.
#[must_use]
pub fn page_slice<T>(items: &[T], page: usize) -> &[T] {
    let page = page.min(page_count(items.len()) - 1);
    let start = page * ITEMS_PER_PAGE;
    let end = (start + ITEMS_PER_PAGE).min(items.len());
    &items[start.min(items.len())..end]
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::sample_product;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_set_quantity_zero_removes_line() {
        let mut cart = Cart::new();
        cart.set_quantity("1_money_Gold", 3);
        cart.set_quantity("1_money_Silver", 1);
        assert_eq!(cart.len(), 2);

        cart.set_quantity("1_money_Gold", 0);
        assert_eq!(cart.quantity("1_money_Gold"), 0);
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn test_lines_use_catalogue_prices_and_drop_missing_products() {
        let mut gold = sample_product("Gold", "1", "money");
        gold.price = 12.5;
        let catalogue = vec![gold.clone()];

        let mut cart = Cart::new();
        cart.set_quantity(&gold.cart_id(), 4);
        cart.set_quantity("2_weapon_Removed", 2);

        let lines = cart.lines(&catalogue);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 4);
        assert_eq!(lines[0].subtotal, 50.0);
        assert_eq!(total_price(&lines), 50.0);
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity(" 3 ").ok(), Some(3));
        assert_eq!(parse_quantity("0").ok(), Some(0));
        assert!(matches!(
            parse_quantity("-1"),
            Err(Error::InvalidQuantity { .. })
        ));
        assert!(parse_quantity("abc").is_err());
        assert!(parse_quantity("1000").is_err());
    }

    #[test]
    fn test_paging() {
        let items: Vec<usize> = (0..45).collect();
        assert_eq!(page_count(items.len()), 3);
        assert_eq!(page_count(0), 1);
        assert_eq!(page_slice(&items, 0).len(), 20);
        assert_eq!(page_slice(&items, 2), &items[40..45]);
        assert_eq!(page_slice(&items, 9), &items[40..45]);

        let empty: Vec<usize> = Vec::new();
        assert!(page_slice(&empty, 0).is_empty());
    }
}
