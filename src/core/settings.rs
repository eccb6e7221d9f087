//! Configuration singletons: QR code URL, thank-you message, target channel and the
//! channel-rename counter state.
//!
//! Each singleton is one row of the `settings` table (JSON value) and one mirror file.
//! Writes are last-write-wins.

use crate::{
    entities::{Setting as SettingEntity, setting},
    errors::Result,
    models::ChannelState,
    store::Store,
};
use chrono::Utc;
use sea_orm::{IntoActiveModel, Set, prelude::*};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, instrument, warn};

/// QR code shown when nothing has been configured.
pub const DEFAULT_QRCODE_URL: &str = "https://promptpay.io/1234567890";
/// Message shown after checkout when nothing has been configured.
pub const DEFAULT_THANK_YOU_MESSAGE: &str =
    "✅ Thank you for your order! Your items will be delivered soon.";

/// The configuration singletons and where each one is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    /// Payment QR code URL
    QrCode,
    /// Message shown after checkout
    ThankYou,
    /// Channel carrying the message counter
    TargetChannel,
    /// Counter state of that channel
    ChannelState,
}

impl SettingKey {
    /// Key of the row in the `settings` table.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::QrCode => "qrcode",
            Self::ThankYou => "thank_you",
            Self::TargetChannel => "target_channel",
            Self::ChannelState => "channel_state",
        }
    }

    /// Name of the mirror file.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::QrCode => "qrcode_config.json",
            Self::ThankYou => "thank_you_config.json",
            Self::TargetChannel => "target_channel_config.json",
            Self::ChannelState => "channel_state.json",
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct QrCodeConfig {
    url: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ThankYouConfig {
    message: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct TargetChannelConfig {
    target_channel_id: Option<u64>,
}

/// Loads one singleton: document store, then mirror file. `None` means neither has it.
#[instrument(skip(store), fields(key = key.key()))]
pub async fn load_setting<T: DeserializeOwned>(store: &Store, key: SettingKey) -> Option<T> {
    read_setting(store, key).await.unwrap_or_else(|e| {
        warn!("Could not load {}: {e}", key.file_name());
        None
    })
}

/// Like [`load_setting`], but an unparsable mirror file is an error.
///
/// # Errors
/// Returns an error if the mirror file cannot be read or parsed.
pub async fn read_setting<T: DeserializeOwned>(store: &Store, key: SettingKey) -> Result<Option<T>> {
    if let Some(db) = store.db() {
        match load_from_db(db, key).await {
            Ok(Some(value)) => return Ok(Some(value)),
            Ok(None) => debug!("Setting not in the document store, trying the mirror file"),
            Err(e) => warn!("Could not load setting from the document store: {e}"),
        }
    }
    store.files().read(key.file_name()).await
}

/// Saves one singleton to the document store (if connected) and its mirror file.
///
/// # Errors
/// Returns an error if the mirror file cannot be written.
#[instrument(skip(store, value), fields(key = key.key()))]
pub async fn save_setting<T: Serialize + Sync>(
    store: &Store,
    key: SettingKey,
    value: &T,
) -> Result<()> {
    if let Some(db) = store.db() {
        if let Err(e) = upsert_in_db(db, key, value).await {
            warn!("Could not save setting to the document store: {e}");
        }
    }
    store.files().write(key.file_name(), value).await
}

/// The payment QR code URL, or [`DEFAULT_QRCODE_URL`] when none is configured.
pub async fn load_qrcode_url(store: &Store) -> String {
    configured_qrcode_url(store)
        .await
        .unwrap_or_else(|| DEFAULT_QRCODE_URL.to_string())
}

/// The payment QR code URL set with `setqrcode`, if any.
pub async fn configured_qrcode_url(store: &Store) -> Option<String> {
    load_setting::<QrCodeConfig>(store, SettingKey::QrCode)
        .await
        .map(|c| c.url)
        .filter(|url| !url.trim().is_empty())
}

/// Stores the payment QR code URL.
pub async fn save_qrcode_url(store: &Store, url: &str) -> Result<()> {
    let config = QrCodeConfig {
        url: url.trim().to_string(),
    };
    save_setting(store, SettingKey::QrCode, &config).await
}

/// The thank-you message, or [`DEFAULT_THANK_YOU_MESSAGE`].
pub async fn load_thank_you_message(store: &Store) -> String {
    load_setting::<ThankYouConfig>(store, SettingKey::ThankYou)
        .await
        .map(|c| c.message)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_THANK_YOU_MESSAGE.to_string())
}

/// Stores the thank-you message.
pub async fn save_thank_you_message(store: &Store, message: &str) -> Result<()> {
    let config = ThankYouConfig {
        message: message.to_string(),
    };
    save_setting(store, SettingKey::ThankYou, &config).await
}

/// The channel whose name carries the message counter, if one is configured.
pub async fn load_target_channel_id(store: &Store) -> Option<u64> {
    load_setting::<TargetChannelConfig>(store, SettingKey::TargetChannel)
        .await
        .and_then(|c| c.target_channel_id)
}

/// Stores the counter channel; `None` turns the counter off.
pub async fn save_target_channel_id(store: &Store, channel_id: Option<u64>) -> Result<()> {
    let config = TargetChannelConfig {
        target_channel_id: channel_id,
    };
    save_setting(store, SettingKey::TargetChannel, &config).await
}

/// Counter state for display; an unreadable mirror reads as the default.
pub async fn load_channel_state(store: &Store) -> ChannelState {
    load_setting(store, SettingKey::ChannelState)
        .await
        .unwrap_or_default()
}

/// Channel state for a read-modify-write; fails on an unparsable mirror file.
///
/// # Errors
/// Returns an error if the mirror file cannot be read or parsed.
pub async fn read_channel_state(store: &Store) -> Result<ChannelState> {
    Ok(read_setting(store, SettingKey::ChannelState)
        .await?
        .unwrap_or_default())
}

/// Stores the counter state.
pub async fn save_channel_state(store: &Store, state: &ChannelState) -> Result<()> {
    save_setting(store, SettingKey::ChannelState, state).await
}

async fn load_from_db<T: DeserializeOwned>(
    db: &DatabaseConnection,
    key: SettingKey,
) -> Result<Option<T>> {
    let row = SettingEntity::find()
        .filter(setting::Column::Key.eq(key.key()))
        .one(db)
        .await?;
    match row {
        Some(row) => Ok(Some(serde_json::from_str(&row.value)?)),
        None => Ok(None),
    }
}

async fn upsert_in_db<T: Serialize>(
    db: &DatabaseConnection,
    key: SettingKey,
    value: &T,
) -> Result<()> {
    let value = serde_json::to_string(value)?;
    let now = Utc::now().naive_utc();

    let existing = SettingEntity::find()
        .filter(setting::Column::Key.eq(key.key()))
        .one(db)
        .await?;

    if let Some(row) = existing {
        let mut active = row.into_active_model();
        active.value = Set(value);
        active.updated_at = Set(now);
        active.update(db).await?;
    } else {
        setting::ActiveModel {
            key: Set(key.key().to_string()),
            value: Set(value),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }
    Ok(())
}
