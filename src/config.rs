use chrono::{Local, NaiveDate};
use std::{env, time::Duration};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("BACKEND_TIMEOUT_SECS must be a whole number of seconds, got '{0}'")]
    InvalidTimeout(String),

    #[error("COLLECTION_DATE must be YYYY-MM-DD, got '{0}'")]
    InvalidCollectionDate(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub backend_base_url: String,
    /// `None` leaves backend requests without a deadline.
    pub backend_timeout: Option<Duration>,
    pub collection_date: NaiveDate,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = lookup("PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        let backend_base_url = lookup("BACKEND_BASE_URL")
            .map(|value| value.trim().trim_end_matches('/').to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());

        let backend_timeout = match lookup("BACKEND_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| ConfigError::InvalidTimeout(raw.clone()))?;
                (secs > 0).then(|| Duration::from_secs(secs))
            }
            None => Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
        };

        let collection_date = match lookup("COLLECTION_DATE") {
            Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .map_err(|_| ConfigError::InvalidCollectionDate(raw.clone()))?,
            None => Local::now().date_naive(),
        };

        Ok(Self {
            port,
            backend_base_url,
            backend_timeout,
            collection_date,
        })
    }
}
