//! Runtime configuration.
//!
//! Values come from an optional TOML file, then environment overrides:
//! `LIFEHUB_DB_PATH`, `LIFEHUB_LOG_LEVEL`, `LIFEHUB_LOG_DIR`.

use crate::derive::progress::{LevelTable, DEFAULT_LEVEL_THRESHOLDS};
use crate::derive::streak::DEFAULT_LOOKBACK_DAYS;
use crate::logging::default_log_level;
use crate::service::habit_service::HabitSettings;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const ENV_DB_PATH: &str = "LIFEHUB_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "LIFEHUB_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "LIFEHUB_LOG_DIR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    /// SQLite file; `None` keeps all data in memory.
    pub db_path: Option<PathBuf>,
    pub log_level: String,
    /// Absolute directory for log files; `None` disables file logging.
    pub log_dir: Option<PathBuf>,
    pub streak_lookback_days: u32,
    /// XP for completing a habit whose definition is missing.
    pub xp_per_completion: u32,
    pub level_thresholds: Vec<u64>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            log_level: default_log_level().to_string(),
            log_dir: None,
            streak_lookback_days: DEFAULT_LOOKBACK_DAYS,
            xp_per_completion: 10,
            level_thresholds: DEFAULT_LEVEL_THRESHOLDS.to_vec(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(toml::de::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "cannot read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "malformed config: {err}"),
            Self::Invalid(details) => write!(f, "invalid config: {details}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

impl CoreConfig {
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&source)
    }

    /// File (when given) plus process environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        let config = config.with_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Applies overrides from `lookup`; blank values are ignored.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        if let Some(db_path) = value(ENV_DB_PATH) {
            self.db_path = Some(PathBuf::from(db_path));
        }
        if let Some(level) = value(ENV_LOG_LEVEL) {
            self.log_level = level.trim().to_string();
        }
        if let Some(log_dir) = value(ENV_LOG_DIR) {
            self.log_dir = Some(PathBuf::from(log_dir));
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.streak_lookback_days == 0 {
            return Err(ConfigError::Invalid(
                "streak_lookback_days must be positive".to_string(),
            ));
        }
        LevelTable::new(self.level_thresholds.clone()).map_err(ConfigError::Invalid)?;
        Ok(())
    }

    pub fn level_table(&self) -> Result<LevelTable, ConfigError> {
        LevelTable::new(self.level_thresholds.clone()).map_err(ConfigError::Invalid)
    }

    pub fn habit_settings(&self) -> HabitSettings {
        HabitSettings {
            lookback_days: self.streak_lookback_days,
            xp_per_completion: self.xp_per_completion,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig, ENV_DB_PATH, ENV_LOG_LEVEL};
    use std::path::PathBuf;

    #[test]
    fn empty_document_yields_defaults() {
        let config = CoreConfig::from_toml("").unwrap();
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.streak_lookback_days, 30);
        assert_eq!(config.xp_per_completion, 10);
    }

    #[test]
    fn toml_values_are_read() {
        let config = CoreConfig::from_toml(
            r#"
            db_path = "/tmp/lifehub.sqlite3"
            streak_lookback_days = 14
            level_thresholds = [0, 50, 150]
            "#,
        )
        .unwrap();
        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/lifehub.sqlite3")));
        assert_eq!(config.streak_lookback_days, 14);
        assert_eq!(config.level_table().unwrap().max_level(), 3);
    }

    #[test]
    fn zero_lookback_and_flat_thresholds_are_rejected() {
        assert!(matches!(
            CoreConfig::from_toml("streak_lookback_days = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            CoreConfig::from_toml("level_thresholds = [0, 10, 10]"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn unknown_keys_fail_to_parse() {
        assert!(matches!(
            CoreConfig::from_toml("colour = \"red\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn overrides_replace_file_values_and_skip_blanks() {
        let config = CoreConfig::default().with_overrides(|key| match key {
            ENV_DB_PATH => Some("/data/hub.db".to_string()),
            ENV_LOG_LEVEL => Some("  ".to_string()),
            _ => None,
        });
        assert_eq!(config.db_path, Some(PathBuf::from("/data/hub.db")));
        assert_eq!(config.log_level, CoreConfig::default().log_level);
    }
}
