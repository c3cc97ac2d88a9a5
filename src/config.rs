//! Startup configuration.
//!
//! Values come from an optional TOML file, overridden by environment
//! variables (a `.env` file is loaded first by the binary). Missing store or
//! Telegram credentials stop the process before anything starts.

use std::path::Path;
use std::time::Duration;

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::Deserialize;
use tracing::{debug, info, instrument};

const DEFAULT_ORIGINS: [&str; 2] = ["http://localhost:5173", "http://127.0.0.1:5173"];
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;
const DEFAULT_STORE_TIMEOUT_SECS: u64 = 15;

/// Configuration as written in the TOML file. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    database_url: Option<String>,
    telegram_bot_token: Option<String>,
    allowed_origins: Option<Vec<String>>,
    host: Option<String>,
    port: Option<u16>,
    ops_chat_id: Option<i64>,
    poll_interval_ms: Option<u64>,
    store_timeout_secs: Option<u64>,
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        Self::from_toml_str(&content)
    }

    /// Parses configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))
    }
}

/// Where the store lives and how long a call may take.
#[derive(Debug, Clone, Getters)]
pub struct StoreSettings {
    /// SQLite database path.
    database_url: String,
    /// Upper bound on a single store call.
    store_timeout: Duration,
}

impl StoreSettings {
    /// Resolves store settings; `env` looks up an environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `DATABASE_URL` is missing or a number
    /// does not parse.
    pub fn resolve(
        file: &FileConfig,
        env: &impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let database_url = lookup(env, "DATABASE_URL")
            .or_else(|| file.database_url.as_deref().map(normalize_value))
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ConfigError::new("DATABASE_URL is missing".to_string()))?;
        let store_timeout_secs = parse_number(env, "STORE_TIMEOUT_SECS")?
            .or(file.store_timeout_secs)
            .unwrap_or(DEFAULT_STORE_TIMEOUT_SECS);

        Ok(Self {
            database_url,
            store_timeout: Duration::from_secs(store_timeout_secs),
        })
    }
}

/// Everything the server needs to start.
#[derive(Clone, Getters)]
pub struct AppConfig {
    /// Store settings.
    store: StoreSettings,
    /// Telegram bot token.
    telegram_bot_token: String,
    /// Browser origins allowed by CORS.
    allowed_origins: Vec<String>,
    /// Listen host.
    host: String,
    /// Listen port.
    port: u16,
    /// Chat that receives loss notifications.
    ops_chat_id: Option<i64>,
    /// Pause between polling iterations.
    poll_interval: Duration,
}

impl AppConfig {
    /// Loads configuration from the optional file and the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file is unreadable or a required value
    /// is missing.
    #[instrument(skip(path))]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => FileConfig::from_file(path)?,
            None => FileConfig::default(),
        };
        let config = Self::resolve(&file, &|key: &str| std::env::var(key).ok())?;
        info!(
            host = %config.host,
            port = config.port,
            origins = ?config.allowed_origins,
            ops_chat = config.ops_chat_id.is_some(),
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Resolves configuration; environment values win over file values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the token or database URL is missing, or a
    /// number does not parse.
    pub fn resolve(
        file: &FileConfig,
        env: &impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let store = StoreSettings::resolve(file, env)?;
        let telegram_bot_token = lookup(env, "TELEGRAM_BOT_TOKEN")
            .or_else(|| file.telegram_bot_token.as_deref().map(normalize_value))
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ConfigError::new("TELEGRAM_BOT_TOKEN is missing".to_string()))?;

        let allowed_origins = lookup(env, "ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(normalize_value)
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .or_else(|| file.allowed_origins.clone())
            .unwrap_or_else(|| DEFAULT_ORIGINS.iter().map(|o| o.to_string()).collect());

        let host = lookup(env, "HOST")
            .or_else(|| file.host.clone())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = parse_number(env, "PORT")?
            .or(file.port)
            .unwrap_or(DEFAULT_PORT);
        let ops_chat_id = parse_number(env, "OPS_CHAT_ID")?.or(file.ops_chat_id);
        let poll_interval_ms = parse_number(env, "POLL_INTERVAL_MS")?
            .or(file.poll_interval_ms)
            .unwrap_or(DEFAULT_POLL_INTERVAL_MS);

        Ok(Self {
            store,
            telegram_bot_token,
            allowed_origins,
            host,
            port,
            ops_chat_id,
            poll_interval: Duration::from_millis(poll_interval_ms),
        })
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("store", &self.store)
            .field("telegram_bot_token", &"<redacted>")
            .field("allowed_origins", &self.allowed_origins)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("ops_chat_id", &self.ops_chat_id)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

/// Cleans a value pasted into an env file or dashboard.
///
/// Strips a byte-order mark, line breaks, surrounding whitespace and one
/// pair of matching outer quotes.
pub fn normalize_value(raw: &str) -> String {
    let cleaned: String = raw
        .trim_start_matches('\u{feff}')
        .chars()
        .filter(|c| *c != '\r' && *c != '\n')
        .collect();
    let trimmed = cleaned.trim();
    let unquoted = ['"', '\'']
        .iter()
        .find_map(|&q| {
            trimmed
                .strip_prefix(q)
                .and_then(|rest| rest.strip_suffix(q))
        })
        .map(str::trim)
        .unwrap_or(trimmed);
    unquoted.to_string()
}

/// Normalised environment value; blank counts as unset.
fn lookup(env: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    env(key)
        .map(|v| normalize_value(&v))
        .filter(|v| !v.is_empty())
}

fn parse_number<T: std::str::FromStr>(
    env: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, ConfigError> {
    match lookup(env, key) {
        None => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::new(format!("{} is not a valid number: '{}'", key, value))),
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_normalize_strips_quotes_and_line_breaks() {
        assert_eq!(normalize_value("\u{feff} \"abc:def\"\r\n"), "abc:def");
        assert_eq!(normalize_value("'  spaced '"), "spaced");
        assert_eq!(normalize_value("plain"), "plain");
        assert_eq!(normalize_value("\"unbalanced"), "\"unbalanced");
    }

    #[test]
    fn test_missing_token_is_fatal() {
        let env = env_of(&[("DATABASE_URL", "promo.db")]);
        let err = AppConfig::resolve(&FileConfig::default(), &env).unwrap_err();
        assert!(err.message.contains("TELEGRAM_BOT_TOKEN"));
    }

    #[test]
    fn test_missing_database_is_fatal() {
        let env = env_of(&[("TELEGRAM_BOT_TOKEN", "123:abc")]);
        let err = AppConfig::resolve(&FileConfig::default(), &env).unwrap_err();
        assert!(err.message.contains("DATABASE_URL"));
    }

    #[test]
    fn test_blank_token_counts_as_missing() {
        let env = env_of(&[("DATABASE_URL", "promo.db"), ("TELEGRAM_BOT_TOKEN", " \"\" ")]);
        assert!(AppConfig::resolve(&FileConfig::default(), &env).is_err());
    }

    #[test]
    fn test_defaults_apply() {
        let env = env_of(&[("DATABASE_URL", "promo.db"), ("TELEGRAM_BOT_TOKEN", "123:abc")]);
        let config = AppConfig::resolve(&FileConfig::default(), &env).unwrap();
        assert_eq!(*config.port(), 3000);
        assert_eq!(config.host(), "0.0.0.0");
        assert_eq!(config.allowed_origins().len(), 2);
        assert_eq!(*config.poll_interval(), Duration::from_secs(2));
        assert_eq!(*config.store().store_timeout(), Duration::from_secs(15));
        assert_eq!(*config.ops_chat_id(), None);
    }

    #[test]
    fn test_env_overrides_file() {
        let file = FileConfig::from_toml_str(
            r#"
            database_url = "file.db"
            telegram_bot_token = "file-token"
            port = 8080
            allowed_origins = ["https://game.example"]
            ops_chat_id = -42
            "#,
        )
        .unwrap();
        let env = env_of(&[("PORT", "9090"), ("ALLOWED_ORIGINS", "https://a.example, https://b.example")]);
        let config = AppConfig::resolve(&file, &env).unwrap();
        assert_eq!(config.store().database_url(), "file.db");
        assert_eq!(config.telegram_bot_token(), "file-token");
        assert_eq!(*config.port(), 9090);
        assert_eq!(
            config.allowed_origins(),
            &vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
        assert_eq!(*config.ops_chat_id(), Some(-42));
    }

    #[test]
    fn test_blank_env_falls_back_to_file() {
        let file = FileConfig::from_toml_str(
            r#"
            database_url = "file.db"
            telegram_bot_token = "file-token"
            "#,
        )
        .unwrap();
        let env = env_of(&[
            ("DATABASE_URL", ""),
            ("TELEGRAM_BOT_TOKEN", " \"\" "),
            ("ALLOWED_ORIGINS", "  "),
        ]);
        let config = AppConfig::resolve(&file, &env).unwrap();
        assert_eq!(config.store().database_url(), "file.db");
        assert_eq!(config.telegram_bot_token(), "file-token");
        assert_eq!(config.allowed_origins().len(), 2);
    }

    #[test]
    fn test_bad_port_is_rejected() {
        let env = env_of(&[
            ("DATABASE_URL", "promo.db"),
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("PORT", "eighty"),
        ]);
        let err = AppConfig::resolve(&FileConfig::default(), &env).unwrap_err();
        assert!(err.message.contains("PORT"));
    }

    #[test]
    fn test_debug_hides_token() {
        let env = env_of(&[("DATABASE_URL", "promo.db"), ("TELEGRAM_BOT_TOKEN", "123:secret")]);
        let config = AppConfig::resolve(&FileConfig::default(), &env).unwrap();
        assert!(!format!("{:?}", config).contains("secret"));
    }
}
