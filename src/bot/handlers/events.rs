//! Gateway events handled outside of commands.

use crate::{
    bot::BotData,
    core::{
        channel_counter::{self, ChannelRenamer},
        settings,
    },
    errors::{Error, Result},
    store::Store,
};
use poise::serenity_prelude as serenity;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Serenity waits out rate limits instead of failing, which for channel renames can
/// mean ten minutes. Give up sooner and let the next message retry.
const RENAME_TIMEOUT: Duration = Duration::from_secs(10);

/// Renames one channel through the Discord HTTP API.
pub struct SerenityRenamer {
    http: Arc<serenity::Http>,
    channel_id: serenity::ChannelId,
}

impl SerenityRenamer {
    /// Renamer for `channel_id`.
    #[must_use]
    pub const fn new(http: Arc<serenity::Http>, channel_id: serenity::ChannelId) -> Self {
        Self { http, channel_id }
    }
}

impl ChannelRenamer for SerenityRenamer {
    fn rename(&self, new_name: &str) -> impl Future<Output = Result<()>> + Send {
        async move {
            let edit = self
                .channel_id
                .edit(self.http.as_ref(), serenity::EditChannel::new().name(new_name));
            match tokio::time::timeout(RENAME_TIMEOUT, edit).await {
                Ok(result) => {
                    result?;
                    Ok(())
                }
                Err(_) => Err(Error::Timeout {
                    operation: format!("rename channel {}", self.channel_id),
                }),
            }
        }
    }
}

/// Entry point for gateway events, registered with the framework.
pub async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, BotData, Error>,
    data: &BotData,
) -> Result<()> {
    match event {
        serenity::FullEvent::Ready { data_about_bot } => {
            info!("Connected to Discord as {}", data_about_bot.user.name);
            data.connected.store(true, Ordering::Relaxed);
            if let Some(target) = settings::load_target_channel_id(&data.store).await {
                sync_target_channel(ctx, &data.store, serenity::ChannelId::new(target)).await;
            }
        }
        serenity::FullEvent::Message { new_message } => {
            on_message(ctx, new_message, data).await?;
        }
        _ => {}
    }
    Ok(())
}

/// Fetches the current name of the target channel and adopts its number.
///
/// Failures are logged; the counter keeps its stored state.
pub async fn sync_target_channel(
    cache_http: impl serenity::CacheHttp,
    store: &Store,
    channel_id: serenity::ChannelId,
) {
    let channel = match channel_id.to_channel(cache_http).await {
        Ok(channel) => channel,
        Err(e) => {
            warn!("Could not fetch target channel {}: {}", channel_id, e);
            return;
        }
    };
    let Some(channel) = channel.guild() else {
        debug!("Target channel {} is not a guild channel", channel_id);
        return;
    };
    match channel_counter::sync_channel_numbers(store, &channel.name).await {
        Ok(true) => info!("Channel counter synced to #{}", channel.name),
        Ok(false) => {}
        Err(e) => warn!("Failed to sync channel counter: {}", e),
    }
}

/// Whether a message counts towards the target channel counter.
fn counts_message(author_is_bot: bool, channel_id: u64, target: Option<u64>) -> bool {
    !author_is_bot && target == Some(channel_id)
}

async fn on_message(ctx: &serenity::Context, message: &serenity::Message, data: &BotData) -> Result<()> {
    let target = settings::load_target_channel_id(&data.store).await;
    if !counts_message(message.author.bot, message.channel_id.get(), target) {
        return Ok(());
    }

    let channel = message.channel_id.to_channel(ctx).await?;
    let Some(channel) = channel.guild() else {
        debug!("Target channel {} is not a guild channel", message.channel_id);
        return Ok(());
    };

    let renamer = SerenityRenamer::new(ctx.http.clone(), message.channel_id);
    match channel_counter::record_message(&data.store, &renamer, &channel.name).await {
        Ok(update) => {
            if let Some(name) = update.renamed_to {
                info!("Renamed target channel to {}", name);
            }
        }
        Err(e) => warn!("Failed to update channel counter: {}", e),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_message() {
        assert!(counts_message(false, 10, Some(10)));
        assert!(!counts_message(true, 10, Some(10)));
        assert!(!counts_message(false, 11, Some(10)));
        assert!(!counts_message(false, 10, None));
    }
}
