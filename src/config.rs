use std::env;
use std::path::PathBuf;

use thiserror::Error;
use youth_progress::trend::UnknownWindowPolicy;
use youth_progress::{LevelTable, LevelTableError, TrendConfig, WindowPolicy};

pub const LEVELS_PATH_VAR: &str = "YOUTH_PROGRESS_LEVELS";
pub const WEEKLY_THRESHOLD_VAR: &str = "WEEKLY_TREND_THRESHOLD";
pub const DAILY_THRESHOLD_VAR: &str = "DAILY_TREND_THRESHOLD";
pub const DAILY_POLICY_VAR: &str = "DAILY_WINDOW_POLICY";
pub const LOG_LEVEL_VAR: &str = "YOUTH_PROGRESS_LOG_LEVEL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be a number between 0 and 4, got '{value}'")]
    InvalidThreshold { name: &'static str, value: String },

    #[error(transparent)]
    WindowPolicy(#[from] UnknownWindowPolicy),

    #[error("failed to read level table {}: {source}", path.display())]
    ReadLevels {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid level table {}: {source}", path.display())]
    Levels {
        path: PathBuf,
        source: LevelTableError,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub levels_path: Option<PathBuf>,
    pub weekly_trend: TrendConfig,
    pub daily_trend: TrendConfig,
    pub log_level: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            levels_path: None,
            weekly_trend: TrendConfig::weekly(),
            daily_trend: TrendConfig::daily(),
            log_level: "info".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let levels_path = lookup(LEVELS_PATH_VAR)
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        let weekly_threshold = match lookup(WEEKLY_THRESHOLD_VAR) {
            Some(value) => parse_threshold(WEEKLY_THRESHOLD_VAR, &value)?,
            None => defaults.weekly_trend.threshold,
        };
        let daily_threshold = match lookup(DAILY_THRESHOLD_VAR) {
            Some(value) => parse_threshold(DAILY_THRESHOLD_VAR, &value)?,
            None => defaults.daily_trend.threshold,
        };
        let daily_policy = match lookup(DAILY_POLICY_VAR) {
            Some(value) => value.parse::<WindowPolicy>()?,
            None => defaults.daily_trend.policy,
        };

        let log_level = lookup(LOG_LEVEL_VAR).unwrap_or(defaults.log_level);

        Ok(Self {
            levels_path,
            weekly_trend: TrendConfig::new(weekly_threshold, defaults.weekly_trend.policy),
            daily_trend: TrendConfig::new(daily_threshold, daily_policy),
            log_level,
        })
    }

    pub fn level_table(&self) -> Result<LevelTable, ConfigError> {
        let Some(path) = &self.levels_path else {
            return Ok(LevelTable::standard());
        };

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadLevels {
            path: path.clone(),
            source,
        })?;
        LevelTable::from_json(&raw).map_err(|source| ConfigError::Levels {
            path: path.clone(),
            source,
        })
    }
}

fn parse_threshold(name: &'static str, value: &str) -> Result<f64, ConfigError> {
    match value.trim().parse::<f64>() {
        Ok(parsed) if parsed.is_finite() && (0.0..=4.0).contains(&parsed) => Ok(parsed),
        _ => Err(ConfigError::InvalidThreshold {
            name,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Mutex, OnceLock};

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = EngineConfig::from_lookup(lookup_from(&[])).expect("defaults load");
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.daily_trend.policy, WindowPolicy::Daily);
        assert_eq!(
            config.level_table().expect("standard ladder"),
            LevelTable::standard()
        );
    }

    #[test]
    fn reads_thresholds_and_policy() {
        let config = EngineConfig::from_lookup(lookup_from(&[
            (WEEKLY_THRESHOLD_VAR, "0.25"),
            (DAILY_THRESHOLD_VAR, " 0.1 "),
            (DAILY_POLICY_VAR, "fixed:7"),
            (LOG_LEVEL_VAR, "debug"),
        ]))
        .expect("config loads");

        assert_eq!(config.weekly_trend.threshold, 0.25);
        assert_eq!(config.weekly_trend.policy, WindowPolicy::Weekly);
        assert_eq!(config.daily_trend.threshold, 0.1);
        assert_eq!(config.daily_trend.policy, WindowPolicy::Fixed(7));
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn rejects_bad_values() {
        let err = EngineConfig::from_lookup(lookup_from(&[(WEEKLY_THRESHOLD_VAR, "abc")]))
            .expect_err("threshold must parse");
        assert!(matches!(err, ConfigError::InvalidThreshold { .. }));

        let err = EngineConfig::from_lookup(lookup_from(&[(DAILY_THRESHOLD_VAR, "-1")]))
            .expect_err("threshold must be in range");
        assert!(matches!(err, ConfigError::InvalidThreshold { .. }));

        let err = EngineConfig::from_lookup(lookup_from(&[(DAILY_POLICY_VAR, "hourly")]))
            .expect_err("policy must be known");
        assert!(matches!(err, ConfigError::WindowPolicy(_)));
    }

    #[test]
    fn missing_level_file_is_reported() {
        let config = EngineConfig::from_lookup(lookup_from(&[(
            LEVELS_PATH_VAR,
            "/nonexistent/youth-progress/levels.json",
        )]))
        .expect("path is accepted");
        assert!(matches!(
            config.level_table(),
            Err(ConfigError::ReadLevels { .. })
        ));
    }

    #[test]
    fn load_reads_process_environment() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        env::set_var(DAILY_POLICY_VAR, "legacy");
        let config = EngineConfig::load();
        env::remove_var(DAILY_POLICY_VAR);

        let config = config.expect("config loads from env");
        assert_eq!(config.daily_trend.policy, WindowPolicy::Legacy);
    }
}
