//! Custom ids of the shop buttons.
//!
//! Every id starts with the session id so that presses on other shop messages are
//! ignored: `"{session}:{action}"`.

/// Discord rejects custom ids longer than this many characters.
pub const MAX_CUSTOM_ID_LEN: usize = 100;

/// Marks a product name cut short to fit in a custom id.
pub const TRUNCATION_MARK: char = '…';

/// A button press decoded from its custom id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShopAction {
    /// Open the categories of a country
    Country(String),
    /// Open the products of a category in the current country
    Category(String),
    /// Product name in the current country and category, ending in
    /// [`TRUNCATION_MARK`] when it was shortened
    Product(String),
    /// Go up one step
    Back,
    /// Previous page
    Previous,
    /// Next page
    Next,
    /// Empty the cart
    ClearCart,
    /// Buy what is in the cart
    Checkout,
}

impl ShopAction {
    /// Encodes the action for a button of session `session`.
    #[must_use]
    pub fn custom_id(&self, session: u64) -> String {
        let action = match self {
            Self::Country(code) => format!("country:{code}"),
            Self::Category(code) => format!("category:{code}"),
            Self::Product(name) => {
                let budget = MAX_CUSTOM_ID_LEN - format!("{session}:product:").chars().count();
                format!("product:{}", shorten(name, budget))
            }
            Self::Back => "back".to_string(),
            Self::Previous => "prev".to_string(),
            Self::Next => "next".to_string(),
            Self::ClearCart => "clear".to_string(),
            Self::Checkout => "checkout".to_string(),
        };
        format!("{session}:{action}")
    }

    /// Decodes a custom id, returning `None` for ids of other sessions or unknown actions.
    #[must_use]
    pub fn parse(custom_id: &str, session: u64) -> Option<Self> {
        let (owner, action) = custom_id.split_once(':')?;
        if owner.parse::<u64>().ok()? != session {
            return None;
        }

        match action.split_once(':') {
            Some(("country", code)) if !code.is_empty() => Some(Self::Country(code.to_string())),
            Some(("category", code)) if !code.is_empty() => Some(Self::Category(code.to_string())),
            Some(("product", name)) if !name.is_empty() => Some(Self::Product(name.to_string())),
            Some(_) => None,
            None => match action {
                "back" => Some(Self::Back),
                "prev" => Some(Self::Previous),
                "next" => Some(Self::Next),
                "clear" => Some(Self::ClearCart),
                "checkout" => Some(Self::Checkout),
                _ => None,
            },
        }
    }
}

fn shorten(name: &str, max_chars: usize) -> String {
    if name.chars().count() <= max_chars {
        return name.to_string();
    }
    let mut short: String = name.chars().take(max_chars.saturating_sub(1)).collect();
    short.push(TRUNCATION_MARK);
    short
}

/// Prefix shared by every button of a session, for collector filters.
#[must_use]
pub fn session_prefix(session: u64) -> String {
    format!("{session}:")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_actions() {
        assert_eq!(
            ShopAction::parse("42:country:1", 42),
            Some(ShopAction::Country("1".to_string()))
        );
        assert_eq!(
            ShopAction::parse("42:category:rentcar", 42),
            Some(ShopAction::Category("rentcar".to_string()))
        );
        assert_eq!(
            ShopAction::parse("42:product:Desert Eagle: gold", 42),
            Some(ShopAction::Product("Desert Eagle: gold".to_string()))
        );
        assert_eq!(ShopAction::parse("42:checkout", 42), Some(ShopAction::Checkout));
        assert_eq!(ShopAction::parse("42:prev", 42), Some(ShopAction::Previous));
    }

    #[test]
    fn test_parse_rejects_foreign_and_malformed_ids() {
        assert_eq!(ShopAction::parse("7:back", 42), None);
        assert_eq!(ShopAction::parse("42:product:", 42), None);
        assert_eq!(ShopAction::parse("42:country:", 42), None);
        assert_eq!(ShopAction::parse("42:dance", 42), None);
        assert_eq!(ShopAction::parse("no-session", 42), None);
    }

    #[test]
    fn test_custom_id_matches_parse() {
        let action = ShopAction::Category("car".to_string());
        let id = action.custom_id(9);
        assert!(id.starts_with(&session_prefix(9)));
        assert_eq!(ShopAction::parse(&id, 9), Some(action));
    }

    #[test]
    fn test_long_product_names_fit_in_custom_id() {
        let session = u64::MAX;
        let name = "Limited edition ".repeat(10);

        let id = ShopAction::Product(name.clone()).custom_id(session);

        assert_eq!(id.chars().count(), MAX_CUSTOM_ID_LEN);
        let Some(ShopAction::Product(key)) = ShopAction::parse(&id, session) else {
            panic!("product id did not parse: {id}");
        };
        assert!(key.ends_with(TRUNCATION_MARK));
        assert!(name.starts_with(key.trim_end_matches(TRUNCATION_MARK)));
    }
}
