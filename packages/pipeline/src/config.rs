//! Runtime settings read from the environment.

use std::time::Duration;

use flood_risk_cache::CachePolicy;
use thiserror::Error;

/// Outbound request timeout when `FLOOD_RISK_HTTP_TIMEOUT_SECS` is unset.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(15);

/// `User-Agent` sent to upstream services when `FLOOD_RISK_USER_AGENT` is
/// unset.
pub const DEFAULT_USER_AGENT: &str = concat!("flood-risk/", env!("CARGO_PKG_VERSION"));

/// An environment variable held a value that could not be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The value did not parse.
    #[error("{name} must be {expected}, got \"{value}\"")]
    InvalidValue {
        /// Variable name.
        name: &'static str,
        /// The raw value.
        value: String,
        /// What was expected instead.
        expected: &'static str,
    },
}

/// Settings shared by every assessment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Bound on every outbound request.
    pub http_timeout: Duration,
    /// `User-Agent` for upstream data services.
    pub user_agent: String,
    /// Result cache bounds.
    pub cache_policy: CachePolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            cache_policy: CachePolicy::default(),
        }
    }
}

impl PipelineConfig {
    /// Reads settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set to an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads settings through `env`, falling back to defaults for unset
    /// or blank variables.
    ///
    /// `FLOOD_RISK_CACHE_MAX_ENTRIES=0` disables the capacity bound.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set to an unusable value.
    pub fn from_lookup(env: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| env(name).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(raw) = get("FLOOD_RISK_HTTP_TIMEOUT_SECS") {
            config.http_timeout = parse_seconds("FLOOD_RISK_HTTP_TIMEOUT_SECS", raw)?;
        }

        if let Some(user_agent) = get("FLOOD_RISK_USER_AGENT") {
            config.user_agent = user_agent.trim().to_string();
        }

        if let Some(raw) = get("FLOOD_RISK_CACHE_MAX_ENTRIES") {
            let max = parse_u64("FLOOD_RISK_CACHE_MAX_ENTRIES", &raw)?;
            config.cache_policy.max_entries = if max == 0 {
                None
            } else {
                Some(usize::try_from(max).unwrap_or(usize::MAX))
            };
        }

        if let Some(raw) = get("FLOOD_RISK_CACHE_TTL_SECS") {
            config.cache_policy.ttl = Some(parse_seconds("FLOOD_RISK_CACHE_TTL_SECS", raw)?);
        }

        Ok(config)
    }
}

/// Parses a strictly positive number of seconds.
fn parse_seconds(name: &'static str, raw: String) -> Result<Duration, ConfigError> {
    match parse_u64(name, &raw)? {
        0 => Err(ConfigError::InvalidValue {
            name,
            value: raw,
            expected: "a positive number of seconds",
        }),
        secs => Ok(Duration::from_secs(secs)),
    }
}

fn parse_u64(name: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        name,
        value: raw.to_string(),
        expected: "a whole number",
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<PipelineConfig, ConfigError> {
        let vars: BTreeMap<&str, &str> = vars.iter().copied().collect();
        PipelineConfig::from_lookup(|name| vars.get(name).map(|v| (*v).to_string()))
    }

    #[test]
    fn defaults_when_unset() {
        let config = load(&[]).unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.http_timeout, Duration::from_secs(15));
        assert_eq!(config.cache_policy.max_entries, Some(1024));
        assert_eq!(config.cache_policy.ttl, None);
    }

    #[test]
    fn reads_overrides() {
        let config = load(&[
            ("FLOOD_RISK_HTTP_TIMEOUT_SECS", "5"),
            ("FLOOD_RISK_USER_AGENT", " floods@example.org "),
            ("FLOOD_RISK_CACHE_MAX_ENTRIES", "0"),
            ("FLOOD_RISK_CACHE_TTL_SECS", "3600"),
        ])
        .unwrap();
        assert_eq!(config.http_timeout, Duration::from_secs(5));
        assert_eq!(config.user_agent, "floods@example.org");
        assert_eq!(config.cache_policy, CachePolicy {
            max_entries: None,
            ttl: Some(Duration::from_secs(3600)),
        });
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            load(&[("FLOOD_RISK_HTTP_TIMEOUT_SECS", "soon")]),
            Err(ConfigError::InvalidValue {
                name: "FLOOD_RISK_HTTP_TIMEOUT_SECS",
                ..
            })
        ));
        assert!(load(&[("FLOOD_RISK_HTTP_TIMEOUT_SECS", "0")]).is_err());
        assert!(load(&[("FLOOD_RISK_CACHE_MAX_ENTRIES", "-1")]).is_err());
        assert!(matches!(
            load(&[("FLOOD_RISK_CACHE_TTL_SECS", "0")]),
            Err(ConfigError::InvalidValue {
                name: "FLOOD_RISK_CACHE_TTL_SECS",
                ..
            })
        ));
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = load(&[("FLOOD_RISK_USER_AGENT", "  ")]).unwrap();
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
    }
}
