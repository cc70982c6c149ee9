use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::mates::DiscordantThresholds;
use crate::resolution::{ResolutionTable, ScheduleError};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid resolution table: {0}")]
    Schedule(#[from] ScheduleError),
    #[error("discordant bounds are inverted: min {min} > max {max}")]
    Discordant { min: i64, max: i64 },
}

/// Everything the layout core reads from the enclosing application.
///
/// Passed explicitly to every plan build; nothing is read from globals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub resolution: ResolutionTable,
    /// Bases kept free after each record on a packed row.
    pub breathing_room: u64,
    pub discordant: DiscordantThresholds,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            resolution: ResolutionTable::default(),
            breathing_room: 2,
            discordant: DiscordantThresholds::default(),
        }
    }
}

impl RenderConfig {
    /// Load a JSON config. Omitted fields keep their defaults; a `resolution`
    /// list replaces the default table, with built-in schedules still used
    /// for any track kind it leaves out.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: RenderConfig = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.resolution.validate()?;
        if self.discordant.min > self.discordant.max {
            return Err(ConfigError::Discordant {
                min: self.discordant.min,
                max: self.discordant.max,
            });
        }
        Ok(())
    }
}
