//! Restart loop around the bot process.
//!
//! Discord answers a burst of reconnects with long rate limits, so restarts are spread
//! out: every retry first waits a random 30-60 seconds, and every failure adds an
//! exponential backoff of `min(60 * 2^failures, 300)` seconds. After five failed
//! attempts the supervisor gives up.

use rand::Rng;
use std::future::Future;
use std::io;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn};

/// Name of the bot binary looked up next to the supervisor.
pub const BOT_BINARY_NAME: &str = "ducky-shop";

/// Retry limits and delays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Total launches, including the first one
    pub max_attempts: u32,
    /// Random delay in seconds before every launch after the first
    pub jitter_secs: RangeInclusive<u64>,
    /// Backoff after the first failure, doubled for each further failure
    pub base_backoff_secs: u64,
    /// Upper bound of the backoff
    pub max_backoff_secs: u64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            jitter_secs: 30..=60,
            base_backoff_secs: 60,
            max_backoff_secs: 300,
        }
    }
}

impl BackoffPolicy {
    /// Backoff after `failures` failed launches: `min(base * 2^failures, max)`.
    #[must_use]
    pub fn backoff(&self, failures: u32) -> Duration {
        let secs = 2_u64
            .checked_pow(failures)
            .and_then(|factor| factor.checked_mul(self.base_backoff_secs))
            .map_or(self.max_backoff_secs, |secs| secs.min(self.max_backoff_secs));
        Duration::from_secs(secs)
    }

    /// Random pre-launch delay. The first attempt starts immediately.
    #[must_use]
    pub fn launch_delay(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 {
            return None;
        }
        let secs = rand::thread_rng().gen_range(self.jitter_secs.clone());
        Some(Duration::from_secs(secs))
    }
}

/// How the supervisor loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The bot exited with status 0
    CleanExit {
        /// Launches it took
        attempts: u32,
    },
    /// Every attempt failed
    GaveUp {
        /// Launches made
        attempts: u32,
    },
}

impl Outcome {
    /// Process exit code for the supervisor itself.
    #[must_use]
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::CleanExit { .. } => 0,
            Self::GaveUp { .. } => 1,
        }
    }
}

/// Runs `launch` until it reports exit code 0 or the attempts run out.
///
/// `launch` receives the zero-based attempt number and resolves to the bot's exit code;
/// an `Err` counts as a failed attempt. `sleep` performs the waits.
pub async fn supervise<L, LFut, S, SFut>(policy: &BackoffPolicy, mut launch: L, mut sleep: S) -> Outcome
where
    L: FnMut(u32) -> LFut,
    LFut: Future<Output = io::Result<i32>>,
    S: FnMut(Duration) -> SFut,
    SFut: Future<Output = ()>,
{
    let mut failures = 0;

    while failures < policy.max_attempts {
        let attempt = failures;
        info!("Starting bot (attempt {})", attempt + 1);

        if let Some(delay) = policy.launch_delay(attempt) {
            info!("Waiting {}s before restarting to avoid rate limits", delay.as_secs());
            sleep(delay).await;
        }

        match launch(attempt).await {
            Ok(0) => {
                info!("Bot exited cleanly");
                return Outcome::CleanExit {
                    attempts: attempt + 1,
                };
            }
            Ok(code) => warn!("Bot stopped with exit code {code}"),
            Err(e) => error!("Could not start bot: {e}"),
        }
        failures += 1;

        if failures < policy.max_attempts {
            let wait = policy.backoff(failures);
            info!("Waiting {}s before the next attempt", wait.as_secs());
            sleep(wait).await;
        }
    }

    error!("Bot failed {} times, giving up", failures);
    Outcome::GaveUp { attempts: failures }
}

/// Path of the bot binary: `BOT_BINARY` if set, otherwise next to the running executable.
///
/// # Errors
/// Returns an error if the current executable cannot be located.
pub fn bot_binary_path(env_override: Option<String>) -> io::Result<PathBuf> {
    if let Some(path) = env_override.filter(|p| !p.trim().is_empty()) {
        return Ok(PathBuf::from(path));
    }
    let exe = std::env::current_exe()?;
    let dir = exe.parent().map(PathBuf::from).unwrap_or_default();
    Ok(dir.join(format!("{BOT_BINARY_NAME}{}", std::env::consts::EXE_SUFFIX)))
}

/// Launches the bot binary once and waits for it to exit.
///
/// The child is killed if the returned future is dropped.
pub async fn launch_bot(binary: &Path) -> io::Result<i32> {
    let status = tokio::process::Command::new(binary)
        .kill_on_drop(true)
        .status()
        .await?;
    Ok(status.code().unwrap_or(-1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn no_jitter() -> BackoffPolicy {
        BackoffPolicy {
            jitter_secs: 0..=0,
            ..BackoffPolicy::default()
        }
    }

    #[test]
    fn test_backoff_is_capped() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.backoff(0), Duration::from_secs(60));
        assert_eq!(policy.backoff(1), Duration::from_secs(120));
        assert_eq!(policy.backoff(2), Duration::from_secs(240));
        assert_eq!(policy.backoff(3), Duration::from_secs(300));
        assert_eq!(policy.backoff(80), Duration::from_secs(300));
    }

    #[test]
    fn test_launch_delay_within_range() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.launch_delay(0), None);
        for attempt in 1..20 {
            let delay = policy.launch_delay(attempt).map(|d| d.as_secs());
            assert!(matches!(delay, Some(30..=60)), "delay {delay:?} out of range");
        }
    }

    #[tokio::test]
    async fn test_clean_exit_stops_loop() {
        let mut launches = 0;
        let outcome = supervise(
            &no_jitter(),
            |_| {
                launches += 1;
                async { Ok(0) }
            },
            |_| async {},
        )
        .await;

        assert_eq!(outcome, Outcome::CleanExit { attempts: 1 });
        assert_eq!(launches, 1);
        assert_eq!(outcome.exit_code(), 0);
    }

    #[tokio::test]
    async fn test_gives_up_after_five_failures() {
        let mut sleeps = Vec::new();
        let outcome = supervise(
            &no_jitter(),
            |attempt| async move {
                if attempt % 2 == 0 {
                    Ok(1)
                } else {
                    Err(io::Error::new(io::ErrorKind::NotFound, "missing binary"))
                }
            },
            |d| {
                sleeps.push(d.as_secs());
                async {}
            },
        )
        .await;

        assert_eq!(outcome, Outcome::GaveUp { attempts: 5 });
        assert_eq!(outcome.exit_code(), 1);
        // backoff after failures 1..=4, interleaved with the zero jitter before launches 2..=5
        assert_eq!(sleeps, [120, 0, 240, 0, 300, 0, 300, 0]);
    }

    #[tokio::test]
    async fn test_recovers_after_failure() {
        let outcome = supervise(
            &no_jitter(),
            |attempt| async move { Ok(if attempt < 2 { 1 } else { 0 }) },
            |_| async {},
        )
        .await;
        assert_eq!(outcome, Outcome::CleanExit { attempts: 3 });
    }

    #[test]
    fn test_bot_binary_override() -> io::Result<()> {
        assert_eq!(
            bot_binary_path(Some("/opt/shop/bot".to_string()))?,
            PathBuf::from("/opt/shop/bot")
        );
        assert!(bot_binary_path(None)?.ends_with(format!(
            "{BOT_BINARY_NAME}{}",
            std::env::consts::EXE_SUFFIX
        )));
        Ok(())
    }
}
