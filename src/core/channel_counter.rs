//! Message counter spliced into the name of the target channel.
//!
//! Every non-bot message in the target channel bumps `pending_number` by one, then the
//! channel is renamed to carry that number. Discord rate limits channel renames hard, so
//! a failed rename leaves `pending_number` ahead of `current_number` and the next
//! message retries with the newer number.

use crate::{
    core::settings::{read_channel_state, save_channel_state},
    errors::Result,
    models::ChannelState,
    store::Store,
};
use regex::Regex;
use std::future::Future;
use std::sync::LazyLock;
use tracing::{info, instrument, warn};

#[allow(clippy::expect_used)]
static TRAILING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)$").expect("trailing number regex"));

/// Renames the target channel. Implemented over the Discord HTTP client by the bot layer.
pub trait ChannelRenamer {
    /// Renames the channel to `new_name`.
    fn rename(&self, new_name: &str) -> impl Future<Output = Result<()>> + Send;
}

/// What happened to the counter for one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterUpdate {
    /// Counter value after this message
    pub pending_number: u64,
    /// New channel name if the rename went through
    pub renamed_to: Option<String>,
}

/// The number at the end of a channel name, if any.
#[must_use]
pub fn trailing_number(name: &str) -> Option<u64> {
    TRAILING_NUMBER
        .captures(name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Replaces the trailing number of `name` with `number`, or appends `-number`.
#[must_use]
pub fn apply_number(name: &str, number: u64) -> String {
    if TRAILING_NUMBER.is_match(name) {
        TRAILING_NUMBER
            .replace(name, number.to_string().as_str())
            .into_owned()
    } else {
        format!("{name}-{number}")
    }
}

/// Adds one to the pending counter and returns the new value.
pub async fn update_pending_number(store: &Store) -> Result<u64> {
    let _guard = store.lock_writes().await;
    let mut state = read_channel_state(store).await?;
    state.pending_number += 1;
    save_channel_state(store, &state).await?;
    Ok(state.pending_number)
}

/// Adopts the trailing number of the real channel name when it differs from the stored
/// `current_number`, e.g. after someone renamed the channel by hand while the bot was down.
///
/// Only call this with a name fresh from the API (on connect, or when the target channel
/// changes). The cached name lags behind our own renames, so syncing against it on every
/// message would roll the counter back.
///
/// Returns true if the stored state changed.
#[instrument(skip(store))]
pub async fn sync_channel_numbers(store: &Store, actual_name: &str) -> Result<bool> {
    let Some(actual) = trailing_number(actual_name) else {
        return Ok(false);
    };

    let _guard = store.lock_writes().await;
    let state = read_channel_state(store).await?;
    if state.current_number == actual {
        return Ok(false);
    }

    info!(
        "Syncing channel counter: {} -> {}",
        state.current_number, actual
    );
    let synced = ChannelState {
        channel_name: actual_name.to_string(),
        current_number: actual,
        pending_number: actual,
    };
    save_channel_state(store, &synced).await?;
    Ok(true)
}

/// Counts one message in the target channel and tries to rename it.
///
/// `current_name` only supplies the text around the number; the number itself always
/// comes from the stored counter. The increment is persisted before the rename is
/// attempted, so a failed rename never loses or double counts a message.
#[instrument(skip(store, renamer))]
pub async fn record_message<R: ChannelRenamer + Sync>(
    store: &Store,
    renamer: &R,
    current_name: &str,
) -> Result<CounterUpdate> {
    let pending_number = update_pending_number(store).await?;

    let new_name = apply_number(current_name, pending_number);
    if let Err(e) = renamer.rename(&new_name).await {
        warn!("Could not rename channel to {new_name}, will retry on the next message: {e}");
        return Ok(CounterUpdate {
            pending_number,
            renamed_to: None,
        });
    }

    let _guard = store.lock_writes().await;
    let mut state = read_channel_state(store).await?;
    // A newer message may have renamed the channel while this one was waiting.
    if pending_number >= state.current_number {
        state.current_number = pending_number;
        state.channel_name.clone_from(&new_name);
        save_channel_state(store, &state).await?;
    }

    Ok(CounterUpdate {
        pending_number,
        renamed_to: Some(new_name),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::settings::{SettingKey, load_channel_state};
    use crate::errors::Error;
    use crate::test_utils::*;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingRenamer {
        fail: bool,
        names: Mutex<Vec<String>>,
    }

    impl ChannelRenamer for RecordingRenamer {
        async fn rename(&self, new_name: &str) -> Result<()> {
            if let Ok(mut names) = self.names.lock() {
                names.push(new_name.to_string());
            }
            if self.fail {
                Err(Error::Config {
                    message: "rate limited".to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_apply_number() {
        assert_eq!(apply_number("orders-12", 13), "orders-13");
        assert_eq!(apply_number("orders", 1), "orders-1");
        assert_eq!(apply_number("room7", 8), "room8");
        assert_eq!(apply_number("2024-sales-9", 10), "2024-sales-10");
    }

    #[test]
    fn test_trailing_number() {
        assert_eq!(trailing_number("orders-12"), Some(12));
        assert_eq!(trailing_number("orders"), None);
        assert_eq!(trailing_number("12-orders"), None);
    }

    #[tokio::test]
    async fn test_successful_rename_updates_state() -> Result<()> {
        let (store, _dir) = setup_test_store().await?;
        let renamer = RecordingRenamer::default();

        let update = record_message(&store, &renamer, "orders").await?;

        assert_eq!(update.pending_number, 1);
        assert_eq!(update.renamed_to.as_deref(), Some("orders-1"));
        let state = load_channel_state(&store).await;
        assert_eq!(state.current_number, 1);
        assert_eq!(state.pending_number, 1);
        assert_eq!(state.channel_name, "orders-1");
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_rename_still_counts_each_message_once() -> Result<()> {
        let (store, _dir) = setup_file_only_store()?;
        let renamer = RecordingRenamer {
            fail: true,
            ..Default::default()
        };

        for expected in 1..=3 {
            let update = record_message(&store, &renamer, "orders").await?;
            assert_eq!(update.pending_number, expected);
            assert!(update.renamed_to.is_none());
        }

        let state = load_channel_state(&store).await;
        assert_eq!(state.pending_number, 3);
        assert_eq!(state.current_number, 0);
        let attempted = renamer.names.lock().map(|n| n.clone()).unwrap_or_default();
        assert_eq!(attempted, ["orders-1", "orders-2", "orders-3"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_sync_adopts_manual_rename() -> Result<()> {
        let (store, _dir) = setup_test_store().await?;
        save_channel_state(
            &store,
            &ChannelState {
                channel_name: "orders-5".to_string(),
                current_number: 5,
                pending_number: 7,
            },
        )
        .await?;

        assert!(!sync_channel_numbers(&store, "orders-5").await?);
        assert!(!sync_channel_numbers(&store, "orders").await?);
        assert!(sync_channel_numbers(&store, "orders-40").await?);

        let state = load_channel_state(&store).await;
        assert_eq!(state.current_number, 40);
        assert_eq!(state.pending_number, 40);
        Ok(())
    }

    #[tokio::test]
    async fn test_stale_channel_name_does_not_roll_back_counter() -> Result<()> {
        let (store, _dir) = setup_test_store().await?;
        save_channel_state(
            &store,
            &ChannelState {
                channel_name: "orders-3".to_string(),
                current_number: 3,
                pending_number: 3,
            },
        )
        .await?;
        let renamer = RecordingRenamer::default();

        // The cache still reports the name from before each rename.
        let first = record_message(&store, &renamer, "orders-3").await?;
        let second = record_message(&store, &renamer, "orders-3").await?;

        assert_eq!(first.renamed_to.as_deref(), Some("orders-4"));
        assert_eq!(second.renamed_to.as_deref(), Some("orders-5"));
        let state = load_channel_state(&store).await;
        assert_eq!(state.current_number, 5);
        assert_eq!(state.pending_number, 5);
        assert_eq!(state.channel_name, "orders-5");
        Ok(())
    }

    #[tokio::test]
    async fn test_unreadable_state_is_not_reset() -> Result<()> {
        let (store, _dir) = setup_file_only_store()?;
        let path = store.files().path(SettingKey::ChannelState.file_name());
        std::fs::write(&path, "{\"pending_number\": ")?;
        let renamer = RecordingRenamer::default();

        assert!(record_message(&store, &renamer, "orders-9").await.is_err());
        assert_eq!(std::fs::read_to_string(&path)?, "{\"pending_number\": ");
        assert!(renamer.names.lock().map(|n| n.is_empty()).unwrap_or(false));
        Ok(())
    }
}
