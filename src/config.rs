//! Process configuration from environment variables.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `GITHUB_APP_ID` | required |
//! | `GITHUB_APP_PRIVATE_KEY_PATH` | required |
//! | `GITHUB_WEBHOOK_SECRET` | required |
//! | `PORT` | `8080` |
//! | `MERGE_READINESS_EVALUATION_TIMEOUT_SECS` | `30` |
//! | `MERGE_READINESS_INFLIGHT_TTL_SECS` | `10` (`0` disables) |
//! | `MERGE_READINESS_MERGE_METHOD` | repository default |

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::dispatch::{DEFAULT_EVALUATION_TIMEOUT, DEFAULT_INFLIGHT_TTL, DispatcherConfig};
use crate::effects::MergeMethod;

pub const APP_ID: &str = "GITHUB_APP_ID";
pub const PRIVATE_KEY_PATH: &str = "GITHUB_APP_PRIVATE_KEY_PATH";
pub const WEBHOOK_SECRET: &str = "GITHUB_WEBHOOK_SECRET";
pub const PORT: &str = "PORT";
pub const EVALUATION_TIMEOUT_SECS: &str = "MERGE_READINESS_EVALUATION_TIMEOUT_SECS";
pub const INFLIGHT_TTL_SECS: &str = "MERGE_READINESS_INFLIGHT_TTL_SECS";
pub const MERGE_METHOD: &str = "MERGE_READINESS_MERGE_METHOD";

const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Everything the binary needs to start.
#[derive(Clone)]
pub struct Config {
    pub app_id: u64,
    pub private_key_path: PathBuf,
    pub webhook_secret: String,
    pub port: u16,
    pub evaluation_timeout: Duration,
    pub inflight_ttl: Duration,
    pub merge_method: Option<MergeMethod>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("app_id", &self.app_id)
            .field("private_key_path", &self.private_key_path)
            .field("webhook_secret", &"<redacted>")
            .field("port", &self.port)
            .field("evaluation_timeout", &self.evaluation_timeout)
            .field("inflight_ttl", &self.inflight_ttl)
            .field("merge_method", &self.merge_method)
            .finish()
    }
}

impl Config {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads configuration through `lookup`. Empty or whitespace-only values
    /// count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let app_id = parse_number(APP_ID, &require(APP_ID)?)?;
        let private_key_path = PathBuf::from(require(PRIVATE_KEY_PATH)?);
        let webhook_secret = require(WEBHOOK_SECRET)?;

        let port = match get(PORT) {
            Some(v) => parse_number(PORT, &v)?,
            None => DEFAULT_PORT,
        };
        let evaluation_timeout = match get(EVALUATION_TIMEOUT_SECS) {
            Some(v) => match parse_number(EVALUATION_TIMEOUT_SECS, &v)? {
                0 => {
                    return Err(ConfigError::Invalid {
                        name: EVALUATION_TIMEOUT_SECS,
                        value: v,
                        reason: "must be positive",
                    });
                }
                secs => Duration::from_secs(secs),
            },
            None => DEFAULT_EVALUATION_TIMEOUT,
        };
        let inflight_ttl = match get(INFLIGHT_TTL_SECS) {
            Some(v) => Duration::from_secs(parse_number(INFLIGHT_TTL_SECS, &v)?),
            None => DEFAULT_INFLIGHT_TTL,
        };
        let merge_method = get(MERGE_METHOD)
            .map(|v| {
                MergeMethod::parse(&v).ok_or(ConfigError::Invalid {
                    name: MERGE_METHOD,
                    value: v,
                    reason: "expected merge, squash or rebase",
                })
            })
            .transpose()?;

        Ok(Config {
            app_id,
            private_key_path,
            webhook_secret,
            port,
            evaluation_timeout,
            inflight_ttl,
            merge_method,
        })
    }

    pub fn dispatcher_config(&self) -> DispatcherConfig {
        DispatcherConfig::new()
            .with_timeout(self.evaluation_timeout)
            .with_inflight_ttl(self.inflight_ttl)
            .with_merge_method(self.merge_method)
    }
}

fn parse_number<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::Invalid {
        name,
        value: value.to_string(),
        reason: "not a valid number",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    const REQUIRED: [(&str, &str); 3] = [
        (APP_ID, "1234"),
        (PRIVATE_KEY_PATH, "/etc/app.pem"),
        (WEBHOOK_SECRET, "s3cret"),
    ];

    #[test]
    fn defaults() {
        let config = load(&REQUIRED).unwrap();
        assert_eq!(config.app_id, 1234);
        assert_eq!(config.port, 8080);
        assert_eq!(config.evaluation_timeout, Duration::from_secs(30));
        assert_eq!(config.inflight_ttl, Duration::from_secs(10));
        assert_eq!(config.merge_method, None);
    }

    #[test]
    fn overrides() {
        let mut vars = REQUIRED.to_vec();
        vars.extend([
            (PORT, "9000"),
            (EVALUATION_TIMEOUT_SECS, "5"),
            (INFLIGHT_TTL_SECS, "0"),
            (MERGE_METHOD, "Squash"),
        ]);
        let config = load(&vars).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.evaluation_timeout, Duration::from_secs(5));
        assert_eq!(config.inflight_ttl, Duration::ZERO);
        assert_eq!(config.merge_method, Some(MergeMethod::Squash));

        let dispatcher = config.dispatcher_config();
        assert_eq!(dispatcher.evaluation_timeout, Duration::from_secs(5));
        assert_eq!(dispatcher.merge_method, Some(MergeMethod::Squash));
    }

    #[test]
    fn missing_required() {
        assert_eq!(
            load(&REQUIRED[..2]).unwrap_err(),
            ConfigError::Missing(WEBHOOK_SECRET)
        );
    }

    #[test]
    fn blank_counts_as_missing() {
        let mut vars = REQUIRED.to_vec();
        vars[0] = (APP_ID, "  ");
        assert_eq!(load(&vars).unwrap_err(), ConfigError::Missing(APP_ID));
    }

    #[test]
    fn invalid_values() {
        for (name, value) in [
            (APP_ID, "abc"),
            (PORT, "70000"),
            (EVALUATION_TIMEOUT_SECS, "0"),
            (MERGE_METHOD, "fast-forward"),
        ] {
            let mut vars = REQUIRED.to_vec();
            vars.retain(|(k, _)| *k != name);
            vars.push((name, value));
            assert!(
                matches!(load(&vars), Err(ConfigError::Invalid { name: n, .. }) if n == name),
                "{} = {}",
                name,
                value
            );
        }
    }

    #[test]
    fn debug_redacts_secret() {
        let config = load(&REQUIRED).unwrap();
        assert!(!format!("{:?}", config).contains("s3cret"));
    }
}
