//! Payment QR code shown by `qrcode` and on receipts.
//!
//! A URL set with `setqrcode` that points at an image is embedded as is. Any other
//! configured URL is turned into a generated QR code that encodes it, and with nothing
//! configured a QR code carrying a short payment memo is generated instead.

use crate::{core::settings, errors::Result, store::Store};
use image::{DynamicImage, ImageFormat, Luma};
use qrcode::QrCode;
use std::io::Cursor;
use tracing::{debug, instrument};

/// File name of a generated QR code attachment.
pub const GENERATED_FILE_NAME: &str = "qr-payment.png";

/// Text encoded when no QR code URL is configured.
pub const SHOP_MEMO: &str = "DUCKY SHOP";

const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];
const MIN_SIZE: u32 = 256;

/// What to show as the payment QR code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentQr {
    /// Image URL to embed directly
    Url(String),
    /// Generated PNG to attach as [`GENERATED_FILE_NAME`]
    Generated(Vec<u8>),
}

impl PaymentQr {
    /// The embed image reference: the URL itself, or `attachment://` for a generated PNG.
    #[must_use]
    pub fn embed_url(&self) -> String {
        match self {
            Self::Url(url) => url.clone(),
            Self::Generated(_) => format!("attachment://{GENERATED_FILE_NAME}"),
        }
    }
}

/// True when the URL path ends in a common image extension. Query and fragment are
/// ignored, so signed CDN links still count.
#[must_use]
pub fn is_image_url(url: &str) -> bool {
    let Some(rest) = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
    else {
        return false;
    };
    let path = rest.split(['?', '#']).next().unwrap_or_default();
    let Some((_, file)) = path.rsplit_once('/') else {
        return false;
    };
    file.rsplit_once('.').is_some_and(|(_, ext)| {
        IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
    })
}

/// Renders `data` as a black-on-white QR code PNG.
///
/// # Errors
/// Returns [`Error::QrCode`](crate::errors::Error::QrCode) if the data does not fit in a
/// QR code or the PNG cannot be encoded.
pub fn render_png(data: &str) -> Result<Vec<u8>> {
    let code = QrCode::new(data.as_bytes())?;
    let pixels = code
        .render::<Luma<u8>>()
        .min_dimensions(MIN_SIZE, MIN_SIZE)
        .build();

    let mut png = Vec::new();
    DynamicImage::ImageLuma8(pixels).write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    Ok(png)
}

/// Picks the payment QR code for the current settings.
///
/// `memo` is encoded when no URL is configured, e.g. the shop name and order total.
///
/// # Errors
/// Returns an error if a QR code has to be generated and rendering fails.
#[instrument(skip(store))]
pub async fn payment_qr(store: &Store, memo: &str) -> Result<PaymentQr> {
    match settings::configured_qrcode_url(store).await {
        Some(url) if is_image_url(&url) => Ok(PaymentQr::Url(url)),
        Some(url) => {
            debug!("QR code URL is not an image, encoding it instead");
            Ok(PaymentQr::Generated(render_png(&url)?))
        }
        None => Ok(PaymentQr::Generated(render_png(memo)?)),
    }
}
