use std::time::Duration;
use std::{env, fmt};

use serde::{Deserialize, Serialize};

use thiserror::Error;

/// Prefix shared by every environment variable read by [`HttpServiceConfig::from_env`].
pub const ENV_PREFIX: &str = "TOOLKIT_HTTP_";

#[derive(Debug, Error)]
/// # Config Error
///
/// Raised when an environment overlay holds a value that cannot be parsed
/// into the target field.
pub enum ConfigError {
    /// The variable was present but not a valid value for its field.
    #[error("Environment variable {name} has invalid value {value:?}: expected {expected}")]
    InvalidValue {
        /// Full variable name, prefix included.
        name: String,
        /// Raw value as found in the environment.
        value: String,
        /// Human readable description of what was expected.
        expected: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
/// # HTTP Service Config
///
/// Settings for the shared connection pool and the executor built on top of it.
///
/// `accept_invalid_certs` defaults to `true`: certificates are NOT validated,
/// so self-signed and expired certificates are accepted. Turn it off for any
/// traffic that crosses an untrusted network.
pub struct HttpServiceConfig {
    /// Overall per-request timeout in seconds, from dispatch to the last body byte.
    pub timeout_secs: u64,
    /// Maximum idle connections kept per destination host.
    pub max_idle_per_host: usize,
    /// Seconds an idle connection is kept before it is closed.
    pub idle_timeout_secs: u64,
    /// Skip TLS certificate validation.
    pub accept_invalid_certs: bool,
    /// Service-wide debug echo of every request and response.
    pub debug: bool,
    /// Content type sent when a call ends up with no headers at all.
    pub default_content_type: String,
}

impl Default for HttpServiceConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 180,
            max_idle_per_host: 2000,
            idle_timeout_secs: 600,
            accept_invalid_certs: true,
            debug: false,
            default_content_type: "application/json".to_string(),
        }
    }
}

impl HttpServiceConfig {
    /// Overall request timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Idle connection expiry as a `Duration`.
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    /// Builds a config from the defaults overlaid with `TOOLKIT_HTTP_*` variables.
    ///
    /// Recognised variables: `TOOLKIT_HTTP_TIMEOUT_SECS`, `TOOLKIT_HTTP_MAX_IDLE_PER_HOST`,
    /// `TOOLKIT_HTTP_IDLE_TIMEOUT_SECS`, `TOOLKIT_HTTP_ACCEPT_INVALID_CERTS`,
    /// `TOOLKIT_HTTP_DEBUG` and `TOOLKIT_HTTP_DEFAULT_CONTENT_TYPE`.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidValue` for the first variable that fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reads values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |suffix: &str| {
            let name = format!("{}{}", ENV_PREFIX, suffix);
            lookup(&name).map(|value| (name, value))
        };

        if let Some((name, value)) = get("TIMEOUT_SECS") {
            config.timeout_secs = parse_number(name, value)?;
        }
        if let Some((name, value)) = get("MAX_IDLE_PER_HOST") {
            config.max_idle_per_host = parse_number(name, value)?;
        }
        if let Some((name, value)) = get("IDLE_TIMEOUT_SECS") {
            config.idle_timeout_secs = parse_number(name, value)?;
        }
        if let Some((name, value)) = get("ACCEPT_INVALID_CERTS") {
            config.accept_invalid_certs = parse_flag(name, value)?;
        }
        if let Some((name, value)) = get("DEBUG") {
            config.debug = parse_flag(name, value)?;
        }
        if let Some((_, value)) = get("DEFAULT_CONTENT_TYPE") {
            config.default_content_type = value;
        }

        Ok(config)
    }
}

impl fmt::Display for HttpServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HttpServiceConfig
    Timeout: {}s,
    Max idle per host: {},
    Idle timeout: {}s,
    Accept invalid certs: {},
    Debug: {},
    Default content type: {}",
            self.timeout_secs,
            self.max_idle_per_host,
            self.idle_timeout_secs,
            self.accept_invalid_certs,
            self.debug,
            self.default_content_type
        )
    }
}

fn parse_number<T: std::str::FromStr>(name: String, value: String) -> Result<T, ConfigError> {
    value.trim().parse::<T>().map_err(|_| ConfigError::InvalidValue {
        name,
        value,
        expected: "an unsigned integer",
    })
}

fn parse_flag(name: String, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            name,
            value,
            expected: "a boolean (true/false, 1/0, yes/no, on/off)",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_match_production_values() {
        let config = HttpServiceConfig::default();
        assert_eq!(config.timeout(), Duration::from_secs(180));
        assert_eq!(config.max_idle_per_host, 2000);
        assert_eq!(config.idle_timeout(), Duration::from_secs(600));
        assert!(config.accept_invalid_certs);
        assert!(!config.debug);
        assert_eq!(config.default_content_type, "application/json");
    }

    #[test]
    fn test_env_overlay() {
        let config = HttpServiceConfig::from_lookup(lookup_from(&[
            ("TOOLKIT_HTTP_TIMEOUT_SECS", "5"),
            ("TOOLKIT_HTTP_DEBUG", "yes"),
            ("TOOLKIT_HTTP_ACCEPT_INVALID_CERTS", "false"),
        ]))
        .unwrap();

        assert_eq!(config.timeout_secs, 5);
        assert!(config.debug);
        assert!(!config.accept_invalid_certs);
        // Untouched fields keep their defaults
        assert_eq!(config.max_idle_per_host, 2000);
    }

    #[test]
    fn test_env_overlay_rejects_garbage() {
        let err = HttpServiceConfig::from_lookup(lookup_from(&[(
            "TOOLKIT_HTTP_MAX_IDLE_PER_HOST",
            "lots",
        )]))
        .unwrap_err();

        match err {
            ConfigError::InvalidValue { name, value, .. } => {
                assert_eq!(name, "TOOLKIT_HTTP_MAX_IDLE_PER_HOST");
                assert_eq!(value, "lots");
            }
        }
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: HttpServiceConfig = serde_json::from_str(r#"{"debug": true}"#).unwrap();
        assert!(config.debug);
        assert_eq!(config.timeout_secs, 180);
    }
}
