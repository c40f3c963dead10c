//! Client configuration.
//!
//! Settings come from an optional RON file (`promptdesk.ron` in the working
//! directory unless a path is given) and are then overridden by environment
//! variables.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::LevelFilter;
use promptdesk_core::PollSettings;
use promptdesk_engine::ApiSettings;
use promptdesk_logging::LogDestination;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILE: &str = "promptdesk.ron";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_url: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub poll_period_secs: u64,
    /// `None` keeps polling a stuck job forever.
    pub max_polls: Option<u32>,
    pub credential_path: PathBuf,
    pub log_destination: String,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let api = ApiSettings::default();
        let poll = PollSettings::default();
        Self {
            api_url: api.base_url,
            connect_timeout_secs: api.connect_timeout.as_secs(),
            request_timeout_secs: api.request_timeout.as_secs(),
            poll_period_secs: poll.period.as_secs(),
            max_polls: poll.max_polls,
            credential_path: PathBuf::from(".promptdesk/credentials.json"),
            log_destination: "terminal".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

impl AppConfig {
    /// Loads `path`, or the default file if it exists, then applies the
    /// process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::from_file(default)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        ron::from_str(&content).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    }

    /// Applies `PROMPTDESK_*` overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("PROMPTDESK_API_URL") {
            self.api_url = url;
        }
        if let Some(path) = lookup("PROMPTDESK_CREDENTIALS") {
            self.credential_path = PathBuf::from(path);
        }
        if let Some(raw) = lookup("PROMPTDESK_POLL_SECS") {
            self.poll_period_secs = raw.trim().parse().map_err(|_| {
                ConfigError::InvalidValue("PROMPTDESK_POLL_SECS".to_string(), raw.clone())
            })?;
        }
        if let Some(level) = lookup("PROMPTDESK_LOG") {
            self.log_level = level;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        url::Url::parse(&self.api_url)
            .map_err(|err| ConfigError::InvalidValue("api_url".to_string(), err.to_string()))?;
        if self.poll_period_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "poll_period_secs".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        if LogDestination::parse(&self.log_destination).is_none() {
            return Err(ConfigError::InvalidValue(
                "log_destination".to_string(),
                self.log_destination.clone(),
            ));
        }
        if self.log_level.parse::<LevelFilter>().is_err() {
            return Err(ConfigError::InvalidValue(
                "log_level".to_string(),
                self.log_level.clone(),
            ));
        }
        Ok(())
    }

    pub fn api_settings(&self) -> ApiSettings {
        ApiSettings {
            base_url: self.api_url.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            period: Duration::from_secs(self.poll_period_secs),
            max_polls: self.max_polls,
        }
    }

    pub fn log_destination(&self) -> LogDestination {
        LogDestination::parse(&self.log_destination).unwrap_or_default()
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::Warn)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::fs;
    use std::path::PathBuf;
    use std::time::Duration;

    use super::{AppConfig, ConfigError};

    #[test]
    fn defaults_match_engine_defaults() {
        let config = AppConfig::default();
        config.validate().expect("defaults are valid");
        assert_eq!(config.poll_settings().period, Duration::from_secs(3));
        assert_eq!(config.poll_settings().max_polls, Some(200));
        assert_eq!(
            config.api_settings().request_timeout,
            Duration::from_secs(30)
        );
    }

    #[test]
    fn ron_file_fills_missing_fields_with_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("promptdesk.ron");
        fs::write(
            &path,
            r#"(api_url: "https://learn.example.com/api", max_polls: None)"#,
        )
        .expect("write");

        let config = AppConfig::from_file(&path).expect("parse");

        assert_eq!(config.api_url, "https://learn.example.com/api");
        assert_eq!(config.max_polls, None);
        assert_eq!(config.poll_period_secs, 3);
    }

    #[test]
    fn malformed_file_reports_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.ron");
        fs::write(&path, "(api_url: ").expect("write");

        let err = AppConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn env_overrides_file_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("PROMPTDESK_API_URL", "http://127.0.0.1:9000"),
            ("PROMPTDESK_POLL_SECS", "5"),
            ("PROMPTDESK_CREDENTIALS", "/tmp/creds.json"),
        ]);
        let mut config = AppConfig::default();

        config
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .expect("overrides apply");

        assert_eq!(config.api_url, "http://127.0.0.1:9000");
        assert_eq!(config.poll_period_secs, 5);
        assert_eq!(config.credential_path, PathBuf::from("/tmp/creds.json"));
    }

    #[test]
    fn bad_values_are_rejected() {
        let mut config = AppConfig::default();
        let err = config
            .apply_env(|key| (key == "PROMPTDESK_POLL_SECS").then(|| "soon".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(..)));

        let config = AppConfig {
            poll_period_secs: 0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());

        let config = AppConfig {
            api_url: "::".to_string(),
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
