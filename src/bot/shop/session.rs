//! State of one shop message: where the user is in the catalogue and what is in the cart.

use super::ids::{ShopAction, TRUNCATION_MARK};
use crate::{
    core::{
        cart::{self, Cart},
        category, country, product,
    },
    models::{Category, Country, Product},
    store::Store,
};

/// Catalogue snapshot used to render one update of the shop message.
#[derive(Debug, Clone, Default)]
pub struct ShopCatalogue {
    /// Countries in display order
    pub countries: Vec<Country>,
    /// Categories in display order
    pub categories: Vec<Category>,
    /// Every product of every country and category
    pub products: Vec<Product>,
}

impl ShopCatalogue {
    /// Reads the current catalogue from the store.
    pub async fn load(store: &Store) -> Self {
        Self {
            countries: country::load_countries(store).await,
            categories: category::load_categories(store).await,
            products: product::load_products(store, None, None).await,
        }
    }

    /// Products of one country and category, in catalogue order.
    #[must_use]
    pub fn products_in(&self, country: &str, category: &str) -> Vec<&Product> {
        self.products
            .iter()
            .filter(|p| p.country == country && p.category == category)
            .collect()
    }

    /// The product a button key refers to, as the catalogue stands now.
    ///
    /// An exact name wins. A key cut short with the truncation mark matches a product
    /// whose name starts with it, as long as only one does.
    #[must_use]
    pub fn find_product(&self, country: &str, category: &str, key: &str) -> Option<&Product> {
        let products = self.products_in(country, category);
        if let Some(exact) = products.iter().find(|p| p.name == key) {
            return Some(exact);
        }
        let prefix = key.strip_suffix(TRUNCATION_MARK)?;
        let mut matches = products.into_iter().filter(|p| p.name.starts_with(prefix));
        match (matches.next(), matches.next()) {
            (Some(only), None) => Some(only),
            _ => None,
        }
    }

    /// Country by code.
    #[must_use]
    pub fn country(&self, code: &str) -> Option<&Country> {
        self.countries.iter().find(|c| c.code == code)
    }

    /// Category by code.
    #[must_use]
    pub fn category(&self, code: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.code == code)
    }
}

/// Which list the shop message is showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Country picker
    Countries,
    /// Categories of one country
    Categories {
        /// Chosen country code
        country: String,
    },
    /// Products of one country and category
    Products {
        /// Chosen country code
        country: String,
        /// Chosen category code
        category: String,
    },
}

/// What the view has to do after a press.
#[derive(Debug, Clone, PartialEq)]
pub enum Reaction {
    /// Re-render the message
    Render,
    /// Ask for a quantity of this product, then re-render
    AskQuantity(Product),
    /// Log the purchase and close the session
    Checkout,
}

/// Navigation position and cart of one shop message.
#[derive(Debug, Clone)]
pub struct ShopSession {
    /// Current list
    pub step: Step,
    /// Zero-based page of the current list
    pub page: usize,
    /// Selected quantities
    pub cart: Cart,
}

impl Default for ShopSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ShopSession {
    /// A fresh session at the country picker with an empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self {
            step: Step::Countries,
            page: 0,
            cart: Cart::new(),
        }
    }

    /// Number of entries listed at the current step.
    #[must_use]
    pub fn item_count(&self, catalogue: &ShopCatalogue) -> usize {
        match &self.step {
            Step::Countries => catalogue.countries.len(),
            Step::Categories { .. } => catalogue.categories.len(),
            Step::Products { country, category } => {
                catalogue.products_in(country, category).len()
            }
        }
    }

    /// Pages needed for the current list; at least one.
    #[must_use]
    pub fn page_count(&self, catalogue: &ShopCatalogue) -> usize {
        cart::page_count(self.item_count(catalogue))
    }

    /// Applies a press to the session.
    pub fn apply(&mut self, action: ShopAction, catalogue: &ShopCatalogue) -> Reaction {
        match action {
            ShopAction::Country(code) => {
                if catalogue.country(&code).is_some() {
                    self.step = Step::Categories { country: code };
                    self.page = 0;
                }
                Reaction::Render
            }
            ShopAction::Category(code) => {
                if let Step::Categories { country } = &self.step {
                    if catalogue.category(&code).is_some() {
                        self.step = Step::Products {
                            country: country.clone(),
                            category: code,
                        };
                        self.page = 0;
                    }
                }
                Reaction::Render
            }
            ShopAction::Product(key) => {
                let Step::Products { country, category } = &self.step else {
                    return Reaction::Render;
                };
                catalogue
                    .find_product(country, category, &key)
                    .filter(|p| !product::is_placeholder(p))
                    .map_or(Reaction::Render, |p| Reaction::AskQuantity(p.clone()))
            }
            ShopAction::Back => {
                self.step = match &self.step {
                    Step::Products { country, .. } => Step::Categories {
                        country: country.clone(),
                    },
                    Step::Categories { .. } | Step::Countries => Step::Countries,
                };
                self.page = 0;
                Reaction::Render
            }
            ShopAction::Previous => {
                self.page = self.page.saturating_sub(1);
                Reaction::Render
            }
            ShopAction::Next => {
                self.page = (self.page + 1).min(self.page_count(catalogue) - 1);
                Reaction::Render
            }
            ShopAction::ClearCart => {
                self.cart.clear();
                Reaction::Render
            }
            ShopAction::Checkout => {
                if self.cart.is_empty() {
                    Reaction::Render
                } else {
                    Reaction::Checkout
                }
            }
        }
    }
}
