//! Deployment health check.
//!
//! Verifies that the environment the bot needs is present and records the result in
//! `health_status.json`.

use crate::errors::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Environment variables the bot cannot run without.
pub const REQUIRED_ENV_VARS: [&str; 2] = ["DISCORD_TOKEN", "DATABASE_URL"];

/// File the result is written to.
pub const HEALTH_STATUS_FILE: &str = "health_status.json";

/// Outcome of a health check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Health {
    /// Every check passed
    Healthy,
    /// At least one check failed
    Unhealthy,
}

/// Contents of `health_status.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Unix time of the check, in seconds
    pub timestamp: f64,
    /// Overall result
    pub status: Health,
    /// `production` on a hosting platform, `development` otherwise
    pub environment: String,
}

impl HealthStatus {
    /// True when every check passed.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.status == Health::Healthy
    }
}

/// Names of the required variables that are unset or empty.
pub fn missing_env_vars<F>(env: F) -> Vec<&'static str>
where
    F: Fn(&str) -> Option<String>,
{
    REQUIRED_ENV_VARS
        .into_iter()
        .filter(|var| env(var).is_none_or(|v| v.trim().is_empty()))
        .collect()
}

/// Required files that do not exist.
#[must_use]
pub fn missing_files(required: &[PathBuf]) -> Vec<PathBuf> {
    required.iter().filter(|p| !p.exists()).cloned().collect()
}

/// Runs every check and logs what is missing.
pub fn check<F>(env: F, required_files: &[PathBuf]) -> HealthStatus
where
    F: Fn(&str) -> Option<String>,
{
    let missing_vars = missing_env_vars(&env);
    let missing = missing_files(required_files);

    let healthy = if !missing_vars.is_empty() {
        error!("Missing environment variables: {:?}", missing_vars);
        false
    } else if !missing.is_empty() {
        error!("Missing required files: {:?}", missing);
        false
    } else {
        info!("All health checks passed");
        true
    };

    let environment = if env("RENDER").is_some() {
        "production"
    } else {
        "development"
    };

    #[allow(clippy::cast_precision_loss)]
    let timestamp = Utc::now().timestamp_millis() as f64 / 1000.0;

    HealthStatus {
        timestamp,
        status: if healthy {
            Health::Healthy
        } else {
            Health::Unhealthy
        },
        environment: environment.to_string(),
    }
}

/// Writes `status` as pretty JSON to `path`.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn write_status(path: &Path, status: &HealthStatus) -> Result<()> {
    let body = serde_json::to_string_pretty(status)?;
    std::fs::write(path, body)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_env_vars() {
        let env = env_from(&[("DISCORD_TOKEN", "abc"), ("DATABASE_URL", " ")]);
        assert_eq!(missing_env_vars(env), ["DATABASE_URL"]);
    }

    #[test]
    fn test_healthy_in_production() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let binary = dir.path().join("ducky-shop");
        std::fs::write(&binary, "")?;
        let env = env_from(&[
            ("DISCORD_TOKEN", "abc"),
            ("DATABASE_URL", "sqlite://shop.db"),
            ("RENDER", "true"),
        ]);

        let status = check(env, &[binary]);

        assert!(status.is_healthy());
        assert_eq!(status.environment, "production");
        Ok(())
    }

    #[test]
    fn test_missing_file_is_unhealthy() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let env = env_from(&[("DISCORD_TOKEN", "abc"), ("DATABASE_URL", "sqlite://shop.db")]);

        let status = check(env, &[dir.path().join("missing-binary")]);

        assert_eq!(status.status, Health::Unhealthy);
        assert_eq!(status.environment, "development");
        Ok(())
    }

    #[test]
    fn test_write_status_json_shape() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join(HEALTH_STATUS_FILE);
        let status = HealthStatus {
            timestamp: 1.5,
            status: Health::Unhealthy,
            environment: "development".to_string(),
        };

        write_status(&path, &status)?;

        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
        assert_eq!(value["status"], "unhealthy");
        assert_eq!(value["environment"], "development");
        assert_eq!(value["timestamp"], 1.5);
        Ok(())
    }
}
