//! Runtime configuration resolved from the process environment.
//!
//! # Invariants
//! - Blank variables behave as unset.
//! - Unknown log levels or display policies are errors, never silently
//!   replaced by defaults.

use crate::logging::{default_log_level, normalize_level};
use crate::reconcile::filter::{DisplayPolicy, ParseModeError};
use std::env;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "TODOLIST_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "TODOLIST_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "TODOLIST_LOG_DIR";
pub const ENV_DISPLAY_POLICY: &str = "TODOLIST_DISPLAY_POLICY";

/// Database file used when `TODOLIST_DB_PATH` is unset.
pub const DEFAULT_DB_FILE_NAME: &str = "todolist.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidLogLevel(String),
    InvalidDisplayPolicy(ParseModeError),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLogLevel(message) => write!(f, "{ENV_LOG_LEVEL}: {message}"),
            Self::InvalidDisplayPolicy(err) => write!(f, "{ENV_DISPLAY_POLICY}: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidDisplayPolicy(err) => Some(err),
            Self::InvalidLogLevel(_) => None,
        }
    }
}

/// Settings shared by the FFI bridge and the CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub log_level: &'static str,
    /// File logging stays off when `None`.
    pub log_dir: Option<PathBuf>,
    pub display_policy: DisplayPolicy,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level(),
            log_dir: None,
            display_policy: DisplayPolicy::default(),
        }
    }
}

impl CoreConfig {
    /// Resolves configuration from `TODOLIST_*` environment variables.
    ///
    /// # Errors
    /// - Returns an error for an unsupported log level or display policy.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(|key| env::var(key).ok())
    }

    /// Same as [`CoreConfig::from_env`] with an injectable lookup.
    pub fn from_env_with(
        mut fetch: impl FnMut(&'static str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut value = |key: &'static str| {
            fetch(key)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };

        let mut config = Self::default();
        if let Some(path) = value(ENV_DB_PATH) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(level) = value(ENV_LOG_LEVEL) {
            config.log_level = normalize_level(&level).map_err(ConfigError::InvalidLogLevel)?;
        }
        config.log_dir = value(ENV_LOG_DIR).map(PathBuf::from);
        if let Some(policy) = value(ENV_DISPLAY_POLICY) {
            config.display_policy =
                DisplayPolicy::parse(&policy).map_err(ConfigError::InvalidDisplayPolicy)?;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ConfigError, CoreConfig, DEFAULT_DB_FILE_NAME, ENV_DB_PATH, ENV_DISPLAY_POLICY,
        ENV_LOG_DIR, ENV_LOG_LEVEL,
    };
    use crate::reconcile::filter::DisplayPolicy;
    use std::path::PathBuf;

    #[test]
    fn empty_environment_yields_defaults() {
        let config = CoreConfig::from_env_with(|_| None).unwrap();
        assert!(config.db_path.ends_with(DEFAULT_DB_FILE_NAME));
        assert_eq!(config.log_dir, None);
        assert_eq!(config.display_policy, DisplayPolicy::StoreOrder);
    }

    #[test]
    fn explicit_values_override_defaults_and_blank_values_do_not() {
        let config = CoreConfig::from_env_with(|key| match key {
            ENV_DB_PATH => Some(" /data/todos.db ".to_string()),
            ENV_LOG_LEVEL => Some("WARNING".to_string()),
            ENV_LOG_DIR => Some("   ".to_string()),
            ENV_DISPLAY_POLICY => Some("completed_first".to_string()),
            _ => None,
        })
        .unwrap();

        assert_eq!(config.db_path, PathBuf::from("/data/todos.db"));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir, None);
        assert_eq!(config.display_policy, DisplayPolicy::CompletedFirst);
    }

    #[test]
    fn unknown_values_are_rejected() {
        let err = CoreConfig::from_env_with(|key| match key {
            ENV_LOG_LEVEL => Some("verbose".to_string()),
            _ => None,
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLogLevel(_)));

        let err = CoreConfig::from_env_with(|key| match key {
            ENV_DISPLAY_POLICY => Some("newest_first".to_string()),
            _ => None,
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDisplayPolicy(_)));
    }
}
