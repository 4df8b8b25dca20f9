use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::application::permission_channel::ReconnectPolicy;
use crate::errors::AppError;

pub const DEFAULT_WS_BASE_URL: &str = "ws://localhost:8001";
pub const DEFAULT_STORE_DIR: &str = ".order-desk";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Only commands that talk to the backend need it.
    api_base_url: Option<String>,
    pub ws_base_url: String,
    pub store_dir: PathBuf,
    pub request_timeout: Duration,
    pub reconnect_delay: Duration,
    pub reconnect_max_delay: Duration,
}

impl AppConfig {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick
    /// up a `.env` file.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let api_base_url = lookup("API_BASE_URL").filter(|v| !v.trim().is_empty());
        let ws_base_url =
            lookup("WS_BASE_URL").unwrap_or_else(|| DEFAULT_WS_BASE_URL.to_string());
        let store_dir = lookup("STORE_DIR").unwrap_or_else(|| DEFAULT_STORE_DIR.to_string());

        let reconnect_delay = positive_seconds(&lookup, "RECONNECT_DELAY_SECS", 5)?;
        let reconnect_max_delay = seconds(&lookup, "RECONNECT_MAX_DELAY_SECS", 60)?;
        if reconnect_max_delay < reconnect_delay {
            return Err(AppError::Config(
                "RECONNECT_MAX_DELAY_SECS must not be below RECONNECT_DELAY_SECS".to_string(),
            ));
        }

        Ok(Self {
            api_base_url,
            ws_base_url,
            store_dir: PathBuf::from(store_dir),
            request_timeout: positive_seconds(&lookup, "REQUEST_TIMEOUT_SECS", 30)?,
            reconnect_delay,
            reconnect_max_delay,
        })
    }

    pub fn api_base_url(&self) -> Result<&str, AppError> {
        self.api_base_url
            .as_deref()
            .ok_or_else(|| AppError::Config("API_BASE_URL must be set".to_string()))
    }

    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            initial_delay: self.reconnect_delay,
            max_delay: self.reconnect_max_delay,
            ..ReconnectPolicy::default()
        }
    }
}

fn seconds(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: u64,
) -> Result<Duration, AppError> {
    match lookup(key) {
        None => Ok(Duration::from_secs(default)),
        Some(raw) => u64::from_str(raw.trim())
            .map(Duration::from_secs)
            .map_err(|_| AppError::Config(format!("{} must be a whole number of seconds", key))),
    }
}

fn positive_seconds(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: u64,
) -> Result<Duration, AppError> {
    let value = seconds(lookup, key, default)?;
    if value.is_zero() {
        return Err(AppError::Config(format!("{} must be greater than zero", key)));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, AppError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_api_is_set() {
        let config = config(&[("API_BASE_URL", "http://localhost:8000/api")]).unwrap();
        assert_eq!(config.api_base_url().unwrap(), "http://localhost:8000/api");
        assert_eq!(config.ws_base_url, DEFAULT_WS_BASE_URL);
        assert_eq!(config.store_dir, PathBuf::from(DEFAULT_STORE_DIR));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.reconnect_policy(), ReconnectPolicy::default());
    }

    #[test]
    fn local_settings_load_without_api_base_url() {
        let local = config(&[("STORE_DIR", "/tmp/desk")]).unwrap();
        assert_eq!(local.store_dir, PathBuf::from("/tmp/desk"));
        assert!(matches!(local.api_base_url(), Err(AppError::Config(_))));

        let blank = config(&[("API_BASE_URL", " ")]).unwrap();
        assert!(matches!(blank.api_base_url(), Err(AppError::Config(_))));
    }

    #[test]
    fn rejects_non_numeric_durations() {
        let result = config(&[("API_BASE_URL", "http://x"), ("REQUEST_TIMEOUT_SECS", "soon")]);
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn rejects_zero_timeout_and_reconnect_delay() {
        for key in ["REQUEST_TIMEOUT_SECS", "RECONNECT_DELAY_SECS"] {
            let result = config(&[("API_BASE_URL", "http://x"), (key, "0")]);
            assert!(matches!(result, Err(AppError::Config(_))), "{} = 0 accepted", key);
        }

        let result = config(&[
            ("API_BASE_URL", "http://x"),
            ("REQUEST_TIMEOUT_SECS", "0"),
            ("RECONNECT_DELAY_SECS", "0"),
            ("RECONNECT_MAX_DELAY_SECS", "0"),
        ]);
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn rejects_inverted_reconnect_bounds() {
        let result = config(&[
            ("API_BASE_URL", "http://x"),
            ("RECONNECT_DELAY_SECS", "30"),
            ("RECONNECT_MAX_DELAY_SECS", "10"),
        ]);
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
