//! Engine configuration.

use crate::graph::DEFAULT_FOOTPATH_SECS;
use crate::reach::{BufferScope, TransferRule};

/// Error reading configuration from the environment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A variable is set but could not be parsed
    #[error("invalid value {value:?} for {name}: {reason}")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Configuration parameters for reachability queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Minimum transfer buffer and which trip changes it applies to.
    pub transfer: TransferRule,

    /// Timeline step used when a request does not name one (minutes).
    pub default_step_minutes: u32,

    /// Largest time budget a request may ask for (minutes).
    pub max_budget_minutes: u32,

    /// Report the origin stop as a zero-minute entry.
    pub include_origin: bool,

    /// Walking time for footpaths the feed gives no duration for (seconds).
    pub default_footpath_secs: u32,
}

impl EngineConfig {
    /// Environment variable overriding the transfer buffer in seconds.
    pub const MIN_TRANSFER_SECS_VAR: &'static str = "REACH_MIN_TRANSFER_SECS";
    /// Environment variable selecting the buffer scope: `trip` or `route`.
    pub const TRANSFER_SCOPE_VAR: &'static str = "REACH_TRANSFER_SCOPE";
    pub const DEFAULT_STEP_MINUTES_VAR: &'static str = "REACH_DEFAULT_STEP_MINUTES";
    pub const MAX_BUDGET_MINUTES_VAR: &'static str = "REACH_MAX_BUDGET_MINUTES";

    /// Create a new configuration with the given parameters.
    pub fn new(
        transfer: TransferRule,
        default_step_minutes: u32,
        max_budget_minutes: u32,
        include_origin: bool,
        default_footpath_secs: u32,
    ) -> Self {
        Self {
            transfer,
            default_step_minutes,
            max_budget_minutes,
            include_origin,
            default_footpath_secs,
        }
    }

    /// Defaults overlaid with any `REACH_*` variables from the process
    /// environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overlaid with values from `lookup`. Unset or blank values
    /// keep their default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(value) = get(Self::MIN_TRANSFER_SECS_VAR) {
            config.transfer.min_transfer_secs = parse_number(Self::MIN_TRANSFER_SECS_VAR, &value)?;
        }
        if let Some(value) = get(Self::TRANSFER_SCOPE_VAR) {
            config.transfer.scope = parse_scope(&value)?;
        }
        if let Some(value) = get(Self::DEFAULT_STEP_MINUTES_VAR) {
            config.default_step_minutes = parse_positive(Self::DEFAULT_STEP_MINUTES_VAR, &value)?;
        }
        if let Some(value) = get(Self::MAX_BUDGET_MINUTES_VAR) {
            config.max_budget_minutes = parse_positive(Self::MAX_BUDGET_MINUTES_VAR, &value)?;
        }

        Ok(config)
    }

    /// Returns the maximum budget in seconds.
    pub fn max_budget_secs(&self) -> i64 {
        i64::from(self.max_budget_minutes) * 60
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            transfer: TransferRule::new(180), // 3 minutes
            default_step_minutes: 5,
            max_budget_minutes: 120,
            include_origin: false,
            default_footpath_secs: DEFAULT_FOOTPATH_SECS,
        }
    }
}

fn parse_number(name: &'static str, value: &str) -> Result<u32, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|e: std::num::ParseIntError| ConfigError::InvalidValue {
            name,
            value: value.to_string(),
            reason: e.to_string(),
        })
}

fn parse_positive(name: &'static str, value: &str) -> Result<u32, ConfigError> {
    match parse_number(name, value)? {
        0 => Err(ConfigError::InvalidValue {
            name,
            value: value.to_string(),
            reason: "must be at least 1".to_string(),
        }),
        n => Ok(n),
    }
}

fn parse_scope(value: &str) -> Result<BufferScope, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "trip" => Ok(BufferScope::EveryTripChange),
        "route" => Ok(BufferScope::RouteChangeOnly),
        _ => Err(ConfigError::InvalidValue {
            name: EngineConfig::TRANSFER_SCOPE_VAR,
            value: value.to_string(),
            reason: "expected trip or route".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn default_config() {
        let config = EngineConfig::default();

        assert_eq!(config.transfer.min_transfer_secs, 180);
        assert_eq!(config.transfer.scope, BufferScope::EveryTripChange);
        assert_eq!(config.default_step_minutes, 5);
        assert_eq!(config.max_budget_minutes, 120);
        assert!(!config.include_origin);
        assert_eq!(config.default_footpath_secs, 180);
        assert_eq!(config.max_budget_secs(), 7200);
    }

    #[test]
    fn custom_config() {
        let config = EngineConfig::new(TransferRule::new(60).route_change_only(), 10, 60, true, 90);

        assert_eq!(config.transfer.min_transfer_secs, 60);
        assert_eq!(config.transfer.scope, BufferScope::RouteChangeOnly);
        assert_eq!(config.default_step_minutes, 10);
        assert_eq!(config.max_budget_minutes, 60);
        assert!(config.include_origin);
        assert_eq!(config.default_footpath_secs, 90);
    }

    #[test]
    fn overlay_from_lookup() {
        let config = EngineConfig::from_lookup(lookup(&[
            ("REACH_MIN_TRANSFER_SECS", "240"),
            ("REACH_TRANSFER_SCOPE", "Route"),
            ("REACH_DEFAULT_STEP_MINUTES", " 10 "),
        ]))
        .unwrap();

        assert_eq!(config.transfer, TransferRule::new(240).route_change_only());
        assert_eq!(config.default_step_minutes, 10);
        assert_eq!(config.max_budget_minutes, 120);
    }

    #[test]
    fn blank_values_keep_defaults() {
        let config = EngineConfig::from_lookup(lookup(&[("REACH_MAX_BUDGET_MINUTES", "  ")])).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn rejects_bad_values() {
        let err = EngineConfig::from_lookup(lookup(&[("REACH_MIN_TRANSFER_SECS", "soon")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { name: "REACH_MIN_TRANSFER_SECS", .. }
        ));

        let err = EngineConfig::from_lookup(lookup(&[("REACH_DEFAULT_STEP_MINUTES", "0")])).unwrap_err();
        assert!(err.to_string().contains("must be at least 1"));

        let err = EngineConfig::from_lookup(lookup(&[("REACH_TRANSFER_SCOPE", "line")])).unwrap_err();
        assert!(err.to_string().contains("expected trip or route"));
    }
}
