use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Settings for one run of the command line tool.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// How many timed contrast passes to run.
    pub repeat: usize,
    pub report_timing: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            repeat: 1,
            report_timing: true,
        }
    }
}

impl RunConfig {
    pub fn from_toml_str(data: &str) -> Result<RunConfig, ConfigError> {
        let mut config: RunConfig = toml::from_str(data)?;
        config.repeat = config.repeat.max(1);
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<RunConfig, ConfigError> {
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = RunConfig::from_toml_str(&data)?;
        tracing::debug!(path = %path.display(), ?config, "loaded run config");
        Ok(config)
    }
}
