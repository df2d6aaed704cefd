use std::path::PathBuf;

use crate::messages::Locale;

/// Application-level constants
pub const APP_NAME: &str = "MedLink";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Role dashboards live under this prefix: `/dashboard/<role>`.
pub const DASHBOARD_PREFIX: &str = "/dashboard";
/// Entry point shown after logout or session expiry.
pub const LOGIN_SELECTION_PATH: &str = "/login-selection";

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Cached query results older than this are refetched.
pub const DEFAULT_STALE_SECS: u64 = 60;

pub const ENV_API_URL: &str = "MEDLINK_API_URL";
pub const ENV_API_TIMEOUT: &str = "MEDLINK_API_TIMEOUT_SECS";
pub const ENV_LOCALE: &str = "MEDLINK_LOCALE";

/// Filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "medlink=info,medlink_lib=info"
}

/// Get the application data directory.
/// Falls back to the system temp dir when the platform has no data dir.
pub fn app_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_NAME)
}

/// Directory holding one token file per tab.
pub fn tab_storage_dir() -> PathBuf {
    app_data_dir().join("tabs")
}

/// Errors from reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be a positive integer, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },
    #[error("Unsupported locale: {0}")]
    InvalidLocale(String),
}

/// Backend connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ApiConfig {
    /// Read `MEDLINK_API_URL` and `MEDLINK_API_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_API_URL).filter(|u| !u.trim().is_empty()) {
            config.base_url = url.trim().trim_end_matches('/').to_string();
        }

        if let Some(raw) = lookup(ENV_API_TIMEOUT) {
            config.timeout_secs = match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    return Err(ConfigError::InvalidNumber {
                        var: ENV_API_TIMEOUT,
                        value: raw,
                    })
                }
            };
        }

        Ok(config)
    }
}

/// Read `MEDLINK_LOCALE`, defaulting to English.
pub fn locale_from_env() -> Result<Locale, ConfigError> {
    match std::env::var(ENV_LOCALE) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| ConfigError::InvalidLocale(raw)),
        Err(_) => Ok(Locale::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn tab_storage_dir_under_app_data() {
        let tabs = tab_storage_dir();
        assert!(tabs.starts_with(app_data_dir()));
        assert!(tabs.ends_with("tabs"));
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn api_config_defaults_without_env() {
        let config = ApiConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ApiConfig::default());
    }

    #[test]
    fn api_config_reads_url_and_timeout() {
        let config = ApiConfig::from_lookup(lookup(&[
            (ENV_API_URL, "https://api.medlink.example/v1/"),
            (ENV_API_TIMEOUT, "12"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "https://api.medlink.example/v1");
        assert_eq!(config.timeout_secs, 12);
    }

    #[test]
    fn api_config_rejects_bad_timeout() {
        let err = ApiConfig::from_lookup(lookup(&[(ENV_API_TIMEOUT, "soon")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { value, .. } if value == "soon"));

        let err = ApiConfig::from_lookup(lookup(&[(ENV_API_TIMEOUT, "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { .. }));
    }
}
