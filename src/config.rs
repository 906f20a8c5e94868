//! Process configuration, read once at startup.
//!
//! Everything comes from environment variables (optionally via `.env`). The
//! lookup function is injectable so tests never touch the real environment.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

pub const ENV_SERVICE_ACCOUNT_EMAIL: &str = "GOOGLE_SERVICE_ACCOUNT_EMAIL";
pub const ENV_SERVICE_ACCOUNT_KEY: &str = "GOOGLE_SERVICE_ACCOUNT_KEY";
pub const ENV_SPREADSHEET_ID: &str = "GOOGLE_SHEETS_SPREADSHEET_ID";

const DEFAULT_RANGE: &str = "Sheet1!A:Z";
const DEFAULT_SINK_TIMEOUT_SECS: u64 = 15;
const DEFAULT_MAX_BODY_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Settings for the Google Sheets row sink.
#[derive(Clone)]
pub struct SheetsConfig {
    pub service_account_email: String,
    pub private_key: String,
    pub spreadsheet_id: String,
    pub range: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for SheetsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetsConfig")
            .field("service_account_email", &self.service_account_email)
            .field("private_key", &"[REDACTED]")
            .field("spreadsheet_id", &self.spreadsheet_id)
            .field("range", &self.range)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Whether accepted enquiries can be appended to the row store.
#[derive(Debug, Clone)]
pub enum SinkConfig {
    Configured(SheetsConfig),
    /// One or more credentials are missing; names the missing variables.
    Unconfigured { missing: Vec<&'static str> },
}

impl SinkConfig {
    pub fn is_configured(&self) -> bool {
        matches!(self, SinkConfig::Configured(_))
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub testimonials_path: PathBuf,
    pub max_body_bytes: usize,
    pub sink: SinkConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup. Empty values
    /// count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        info!("Loading application configuration");
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let host = get("APP_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or(get("APP_PORT"), "APP_PORT", 3000u16)?;
        let testimonials_path = get("TESTIMONIALS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data/testimonials.json"));
        let max_body_bytes = parse_or(get("MAX_BODY_BYTES"), "MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES)?;
        let timeout_secs = parse_or(get("SINK_TIMEOUT_SECS"), "SINK_TIMEOUT_SECS", DEFAULT_SINK_TIMEOUT_SECS)?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidValue("SINK_TIMEOUT_SECS must be positive".to_string()));
        }
        let range = get("SHEETS_RANGE").unwrap_or_else(|| DEFAULT_RANGE.to_string());

        let email = get(ENV_SERVICE_ACCOUNT_EMAIL);
        let key = get(ENV_SERVICE_ACCOUNT_KEY);
        let spreadsheet_id = get(ENV_SPREADSHEET_ID);
        debug!(
            email = email.is_some(),
            key = key.is_some(),
            spreadsheet_id = spreadsheet_id.is_some(),
            "Sink credentials present"
        );

        let sink = match (email, key, spreadsheet_id) {
            (Some(service_account_email), Some(key), Some(spreadsheet_id)) => {
                SinkConfig::Configured(SheetsConfig {
                    service_account_email,
                    // Keys pasted into .env files usually carry escaped newlines.
                    private_key: key.replace("\\n", "\n"),
                    spreadsheet_id,
                    range,
                    timeout: Duration::from_secs(timeout_secs),
                })
            }
            (email, key, spreadsheet_id) => {
                let missing = [
                    (ENV_SERVICE_ACCOUNT_EMAIL, email.is_none()),
                    (ENV_SERVICE_ACCOUNT_KEY, key.is_none()),
                    (ENV_SPREADSHEET_ID, spreadsheet_id.is_none()),
                ]
                .into_iter()
                .filter_map(|(name, absent)| absent.then_some(name))
                .collect::<Vec<_>>();
                warn!("Row sink disabled, missing: {}", missing.join(", "));
                SinkConfig::Unconfigured { missing }
            }
        };

        Ok(AppConfig {
            host,
            port,
            testimonials_path,
            max_body_bytes,
            sink,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T: std::str::FromStr>(raw: Option<String>, key: &str, default: T) -> Result<T, ConfigError> {
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(format!("{key}={value}"))),
        None => Ok(default),
    }
}
