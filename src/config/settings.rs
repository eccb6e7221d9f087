//! Application settings loaded from the environment with an optional config.toml overlay.
//!
//! Environment variables always win over values from the file, so deployments on
//! platforms that only expose env vars need no file at all.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_PREFIX: &str = "!";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_STATIC_DIR: &str = "static";

/// Optional values read from config.toml. Every field may be omitted.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Document store connection string
    pub database_url: Option<String>,
    /// Directory holding the JSON mirror files
    pub data_dir: Option<PathBuf>,
    /// Directory served under `/static`
    pub static_dir: Option<PathBuf>,
    /// Prefix for text commands
    pub command_prefix: Option<String>,
    /// Guild used for fast command registration during development
    pub dev_guild_id: Option<u64>,
    /// Status server port
    pub port: Option<u16>,
    /// Force the status server on even outside a hosted platform
    pub start_web_server: Option<bool>,
}

/// Settings for the HTTP status server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebConfig {
    /// Whether the server should be started at all
    pub enabled: bool,
    /// Port to bind on 0.0.0.0
    pub port: u16,
}

/// Fully resolved application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Document store connection string, `None` means file-only mode
    pub database_url: Option<String>,
    /// Directory holding the JSON mirror files
    pub data_dir: PathBuf,
    /// Directory served under `/static`
    pub static_dir: PathBuf,
    /// Prefix for text commands
    pub command_prefix: String,
    /// Guild used for fast command registration during development
    pub dev_guild_id: Option<u64>,
    /// Status server settings
    pub web: WebConfig,
    /// True when running on the hosting platform (`RENDER` is set)
    pub hosted: bool,
}

impl AppConfig {
    /// Resolves configuration from an optional file and an environment lookup.
    ///
    /// `env` returns the value of a variable or `None` when it is unset or empty.
    pub fn from_sources<F>(file: FileConfig, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = env("DATABASE_URL").or(file.database_url);

        let data_dir = env("DATA_DIR")
            .map(PathBuf::from)
            .or(file.data_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

        let static_dir = env("STATIC_DIR")
            .map(PathBuf::from)
            .or(file.static_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR));

        let command_prefix = env("COMMAND_PREFIX")
            .or(file.command_prefix)
            .unwrap_or_else(|| DEFAULT_PREFIX.to_string());

        let dev_guild_id = match env("DEV_GUILD_ID") {
            Some(raw) => Some(raw.parse::<u64>().map_err(|e| Error::Config {
                message: format!("DEV_GUILD_ID must be a number: {e}"),
            })?),
            None => file.dev_guild_id,
        };

        let port = match env("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| Error::Config {
                message: format!("PORT must be a valid port number: {e}"),
            })?,
            None => file.port.unwrap_or(DEFAULT_PORT),
        };

        let hosted = env("RENDER").is_some();
        let enabled =
            hosted || env("START_WEB_SERVER").is_some() || file.start_web_server.unwrap_or(false);

        Ok(Self {
            database_url,
            data_dir,
            static_dir,
            command_prefix,
            dev_guild_id,
            web: WebConfig { enabled, port },
            hosted,
        })
    }
}

/// Reads config.toml if it exists. A missing file yields the empty default.
///
/// # Errors
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_file_config<P: AsRef<Path>>(path: P) -> Result<FileConfig> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::debug!("No config file at {:?}, using environment only", path);
        return Ok(FileConfig::default());
    }

    let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path.display()),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse {}: {e}", path.display()),
    })
}

/// Loads the application configuration from `CONFIG_PATH` (default `config.toml`)
/// and the process environment.
pub fn load_app_configuration() -> Result<AppConfig> {
    let path = process_env("CONFIG_PATH").unwrap_or_else(|| "config.toml".to_string());
    let file = load_file_config(&path)?;
    AppConfig::from_sources(file, process_env)
}

/// Environment lookup treating empty values as unset.
#[must_use]
pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_file_or_env() -> Result<()> {
        let config = AppConfig::from_sources(FileConfig::default(), env_from(&[]))?;

        assert!(config.database_url.is_none());
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.command_prefix, "!");
        assert_eq!(
            config.web,
            WebConfig {
                enabled: false,
                port: 8080
            }
        );
        assert!(!config.hosted);
        Ok(())
    }

    #[test]
    fn test_env_overrides_file() -> Result<()> {
        let file = FileConfig {
            database_url: Some("sqlite://from-file.sqlite".to_string()),
            port: Some(9000),
            command_prefix: Some("?".to_string()),
            ..Default::default()
        };
        let env = env_from(&[
            ("DATABASE_URL", "sqlite://from-env.sqlite"),
            ("PORT", "10000"),
        ]);

        let config = AppConfig::from_sources(file, env)?;

        assert_eq!(
            config.database_url.as_deref(),
            Some("sqlite://from-env.sqlite")
        );
        assert_eq!(config.web.port, 10000);
        assert_eq!(config.command_prefix, "?");
        Ok(())
    }

    #[test]
    fn test_render_enables_web_server() -> Result<()> {
        let config =
            AppConfig::from_sources(FileConfig::default(), env_from(&[("RENDER", "true")]))?;
        assert!(config.hosted);
        assert!(config.web.enabled);

        let config = AppConfig::from_sources(
            FileConfig::default(),
            env_from(&[("START_WEB_SERVER", "1")]),
        )?;
        assert!(!config.hosted);
        assert!(config.web.enabled);
        Ok(())
    }

    #[test]
    fn test_invalid_port_is_config_error() {
        let result = AppConfig::from_sources(FileConfig::default(), env_from(&[("PORT", "http")]));
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_load_file_config_missing_file_is_default() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let config = load_file_config(dir.path().join("absent.toml"))?;
        assert!(config.database_url.is_none());
        Ok(())
    }

    #[test]
    fn test_load_file_config_parses_toml() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path)?;
        writeln!(file, "data_dir = \"/srv/shop\"\nport = 3000\ndev_guild_id = 42")?;

        let config = load_file_config(&path)?;
        assert_eq!(config.data_dir, Some(PathBuf::from("/srv/shop")));
        assert_eq!(config.port, Some(3000));
        assert_eq!(config.dev_guild_id, Some(42));
        Ok(())
    }
}
