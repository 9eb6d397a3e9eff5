//! `stock_tracker.toml` loading.
//!
//! Every section is optional and every field has a default, so an empty or
//! missing file is a valid configuration. Secrets never live here: Alpaca
//! keys are read from the environment by the provider itself.
//!
//! ```toml
//! [server]
//! bind = "0.0.0.0:3000"
//!
//! [market_data]
//! provider = "yahoo"
//! display_timezone = "America/New_York"
//!
//! [quotes]
//! poll_interval_secs = 5
//!
//! [store]
//! kind = "fallback"
//! database_url = "sqlite://stock_tracker.db"
//! backend_url = "http://localhost:8080"
//! page_size = 100
//! ```

use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    time::Duration,
};

use chrono_tz::Tz;
use market_data::providers::{
    DEFAULT_ALPACA_DATA_URL, DEFAULT_YAHOO_CHART_URL, DEFAULT_YAHOO_SEARCH_URL, Endpoints,
    ProviderId,
};
use portfolio::store::config::StoreConfig;
use serde::{Deserialize, Serialize};
use shared_utils::env::get_env_var_opt;
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "stock_tracker.toml";
pub const BIND_ENV: &str = "STOCK_TRACKER_BIND";
pub const STORE_URL_ENV: &str = "STOCK_TRACKER_STORE_URL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("unknown display_timezone {0:?}")]
    InvalidTimezone(String),

    #[error("invalid bind address {0:?}")]
    InvalidBind(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarketDataConfig {
    /// Vendor for bar history.
    pub provider: ProviderId,
    pub alpaca_data_url: String,
    pub yahoo_chart_url: String,
    pub yahoo_search_url: String,
    /// IANA zone used for chart labels.
    pub display_timezone: String,
}

impl Default for MarketDataConfig {
    fn default() -> Self {
        Self {
            provider: ProviderId::default(),
            alpaca_data_url: DEFAULT_ALPACA_DATA_URL.to_string(),
            yahoo_chart_url: DEFAULT_YAHOO_CHART_URL.to_string(),
            yahoo_search_url: DEFAULT_YAHOO_SEARCH_URL.to_string(),
            display_timezone: "UTC".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QuotesConfig {
    pub poll_interval_secs: u64,
}

impl Default for QuotesConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub market_data: MarketDataConfig,
    pub quotes: QuotesConfig,
    pub store: StoreConfig,
}

impl AppConfig {
    /// Loads `path`, or the default file when `path` is `None`. Only the
    /// default file may be absent.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };

        let mut config = match std::fs::read_to_string(&path) {
            Ok(text) => toml::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.clone(),
                source,
            })?,
            Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(source) => return Err(ConfigError::Read { path, source }),
        };

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// `STOCK_TRACKER_BIND` replaces `server.bind`; `STOCK_TRACKER_STORE_URL`
    /// replaces `store.backend_url`.
    pub fn apply_env(&mut self) {
        if let Some(bind) = get_env_var_opt(BIND_ENV) {
            self.server.bind = bind;
        }
        if let Some(url) = get_env_var_opt(STORE_URL_ENV) {
            self.store.backend_url = url;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.display_tz()?;
        self.bind_addr()?;
        if self.quotes.poll_interval_secs == 0 {
            return Err(ConfigError::Zero("quotes.poll_interval_secs"));
        }
        if self.store.page_size == 0 {
            return Err(ConfigError::Zero("store.page_size"));
        }
        Ok(())
    }

    pub fn display_tz(&self) -> Result<Tz, ConfigError> {
        let name = self.market_data.display_timezone.trim();
        name.parse::<Tz>()
            .map_err(|_| ConfigError::InvalidTimezone(name.to_string()))
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server
            .bind
            .parse()
            .map_err(|_| ConfigError::InvalidBind(self.server.bind.clone()))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.quotes.poll_interval_secs)
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints {
            alpaca_data_url: self.market_data.alpaca_data_url.clone(),
            yahoo_chart_url: self.market_data.yahoo_chart_url.clone(),
            yahoo_search_url: self.market_data.yahoo_search_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portfolio::store::config::StoreKind;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    fn empty_file_is_all_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.display_tz().unwrap(), Tz::UTC);
        assert_eq!(config.poll_interval(), Duration::from_secs(5));
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [market_data]
            provider = "yahoo"
            display_timezone = "America/New_York"

            [store]
            kind = "fallback"
            "#,
        )
        .unwrap();
        assert_eq!(config.market_data.provider, ProviderId::Yahoo);
        assert_eq!(config.store.kind, StoreKind::Fallback);
        assert_eq!(config.store.page_size, 100);
        assert_eq!(config.display_tz().unwrap(), chrono_tz::America::New_York);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(toml::from_str::<AppConfig>("[server]\nport = 1").is_err());
        assert!(toml::from_str::<AppConfig>("[market_data]\nprovider = \"polygon\"").is_err());
    }

    #[test]
    fn bad_timezone_fails_validation() {
        let mut config = AppConfig::default();
        config.market_data.display_timezone = "Mars/Olympus".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTimezone(_))
        ));
    }

    #[test]
    #[serial]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            AppConfig::load(Some(&missing)),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    #[serial]
    fn env_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nbind = \"127.0.0.1:4000\"").unwrap();
        // SAFETY: env mutation is serialized across this crate's tests.
        unsafe {
            std::env::set_var(BIND_ENV, "0.0.0.0:8081");
            std::env::set_var(STORE_URL_ENV, "http://backend:9000");
        }
        let config = AppConfig::load(Some(file.path()));
        unsafe {
            std::env::remove_var(BIND_ENV);
            std::env::remove_var(STORE_URL_ENV);
        }
        let config = config.unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:8081");
        assert_eq!(config.store.backend_url, "http://backend:9000");
    }
}
