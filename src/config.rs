//! Configuration loading and management
//!
//! Handles parsing of `td.toml` configuration files. The file is looked up
//! at `TD_CONFIG` if set, otherwise in the OS config directory for td.
//! Everything has a default; a missing file is not an error.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{Priority, Reminder};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Where the local store keeps its data. Overridden by `--data-dir`
    /// or `TD_DATA_DIR`.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Defaults applied to new tasks
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Event emission configuration
    #[serde(default)]
    pub events: EventsConfig,
}

/// Defaults applied to new tasks when the flag is omitted
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Default priority for new tasks (urgent, normal, low)
    #[serde(default)]
    pub priority: Option<String>,

    /// Default reminder lead time for new tasks (30m, 1h, 2h)
    #[serde(default)]
    pub reminder: Option<String>,
}

/// Event emission configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Default event destination: "-" for stdout or a file path
    #[serde(default)]
    pub destination: Option<String>,
}

impl Config {
    /// Load configuration, falling back to defaults when no file exists.
    pub fn load(explicit: Option<&Path>) -> Result<Config> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => default_config_path(),
        };

        let Some(path) = path else {
            return Ok(Config::default());
        };
        if !path.exists() {
            if explicit.is_some() {
                return Err(Error::InvalidConfig(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if let Some(priority) = &self.defaults.priority {
            priority
                .parse::<Priority>()
                .map_err(|_| Error::InvalidConfig(format!("defaults.priority: '{priority}'")))?;
        }
        if let Some(reminder) = &self.defaults.reminder {
            reminder
                .parse::<Reminder>()
                .map_err(|_| Error::InvalidConfig(format!("defaults.reminder: '{reminder}'")))?;
        }
        Ok(())
    }

    /// Parsed default priority for new tasks, if configured.
    pub fn default_priority(&self) -> Option<Priority> {
        self.defaults
            .priority
            .as_deref()
            .and_then(|value| value.parse().ok())
    }

    /// Parsed default reminder for new tasks, if configured.
    pub fn default_reminder(&self) -> Option<Reminder> {
        self.defaults
            .reminder
            .as_deref()
            .and_then(|value| value.parse().ok())
    }

    /// Resolve the data directory: CLI/env override, then config, then the
    /// OS data directory.
    pub fn resolve_data_dir(&self, override_dir: Option<&Path>) -> Result<PathBuf> {
        if let Some(dir) = override_dir {
            return Ok(dir.to_path_buf());
        }
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        ProjectDirs::from("", "", "td")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or_else(|| {
                Error::InvalidConfig("could not determine a data directory".to_string())
            })
    }
}

fn default_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("TD_CONFIG") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }
    ProjectDirs::from("", "", "td").map(|dirs| dirs.config_dir().join("td.toml"))
}
