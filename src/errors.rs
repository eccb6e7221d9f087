//! Unified error type for the shop bot.
//!
//! Store and file failures are usually logged and skipped by the data-access layer,
//! so most variants here surface either from validation or from the bot framework.

use thiserror::Error;

/// All errors produced by the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or missing configuration
    #[error("Configuration error: {message}")]
    Config {
        /// Human readable description
        message: String,
    },

    /// Document store failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// File system failure while reading or writing a JSON mirror
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON in a mirror file or in user supplied input
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Missing environment variable
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// A product price that is negative or not a finite number
    #[error("Invalid price: {price}")]
    InvalidPrice {
        /// The rejected price
        price: f64,
    },

    /// A cart quantity that could not be parsed
    #[error("Invalid quantity: {input}")]
    InvalidQuantity {
        /// Raw user input
        input: String,
    },

    /// Product lookup failed
    #[error("Product '{name}' not found")]
    ProductNotFound {
        /// Name that was searched for
        name: String,
    },

    /// Country lookup failed
    #[error("Country '{code}' not found")]
    CountryNotFound {
        /// Code that was searched for
        code: String,
    },

    /// A country with this code already exists
    #[error("Country '{code}' already exists")]
    CountryExists {
        /// Duplicate code
        code: String,
    },

    /// One of the main countries was targeted for removal
    #[error("Country '{code}' is a main country and cannot be removed")]
    ProtectedCountry {
        /// Protected code
        code: String,
    },

    /// Category lookup failed
    #[error("Category '{code}' not found")]
    CategoryNotFound {
        /// Code that was searched for
        code: String,
    },

    /// A category with this code already exists
    #[error("Category '{code}' already exists")]
    CategoryExists {
        /// Duplicate code
        code: String,
    },

    /// A Discord request did not finish in time
    #[error("Timed out while trying to {operation}")]
    Timeout {
        /// What was being attempted
        operation: String,
    },

    /// A payment QR code could not be generated
    #[error("QR code error: {message}")]
    QrCode {
        /// What went wrong
        message: String,
    },

    /// Checkout was attempted with nothing in the cart
    #[error("Cart is empty")]
    EmptyCart,

    /// Serenity/Poise framework error
    #[error("Serenity/Poise framework error: {0}")]
    Framework(Box<poise::serenity_prelude::Error>),
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::Framework(Box::new(value))
    }
}

impl From<qrcode::types::QrError> for Error {
    fn from(value: qrcode::types::QrError) -> Self {
        Self::QrCode {
            message: value.to_string(),
        }
    }
}

impl From<image::ImageError> for Error {
    fn from(value: image::ImageError) -> Self {
        Self::QrCode {
            message: value.to_string(),
        }
    }
}

impl Error {
    /// True for errors caused by user input, which are reported back to the user
    /// instead of being logged as failures.
    #[must_use]
    pub const fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::Config { .. }
                | Self::Json(_)
                | Self::InvalidPrice { .. }
                | Self::InvalidQuantity { .. }
                | Self::ProductNotFound { .. }
                | Self::CountryNotFound { .. }
                | Self::CountryExists { .. }
                | Self::ProtectedCountry { .. }
                | Self::CategoryNotFound { .. }
                | Self::CategoryExists { .. }
                | Self::EmptyCart
        )
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_facing_errors() {
        assert!(Error::ProtectedCountry { code: "1".to_string() }.is_user_facing());
        assert!(Error::InvalidPrice { price: -1.0 }.is_user_facing());
        assert!(!Error::Database(sea_orm::DbErr::Custom("down".to_string())).is_user_facing());
        assert!(
            !Error::Timeout {
                operation: "rename channel".to_string()
            }
            .is_user_facing()
        );
    }

    #[test]
    fn test_error_messages() {
        let err = Error::ProtectedCountry { code: "2".to_string() };
        assert_eq!(
            err.to_string(),
            "Country '2' is a main country and cannot be removed"
        );
        assert_eq!(Error::EmptyCart.to_string(), "Cart is empty");
    }
}
