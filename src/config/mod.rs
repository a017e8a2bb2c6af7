// Configuration module for the oracles client
// Layered settings: preset defaults, optional TOML file, ORACLES_* environment

pub mod presets;
pub mod validation;

pub use presets::Network;
pub use validation::{ConfigValidationError, ConfigValidator, ValidationResult};

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::errors::OraclesError;
use crate::list::ListOptions;

/// Prefix of environment overrides, e.g. `ORACLES_LIST__PAGE_SIZE=20`
pub const ENV_PREFIX: &str = "ORACLES";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OraclesConfig {
    pub network: Network,
    /// File the list filter is kept in; in memory only when unset
    pub preferences_path: Option<PathBuf>,
    pub log_level: String,
    pub backend: BackendConfig,
    pub list: ListConfig,
    pub voting: VotingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub url: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListConfig {
    pub page_size: usize,
    /// After this long a fetch shows loading placeholders
    pub late_after_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VotingConfig {
    /// 0 disables polling
    pub poll_interval_secs: u64,
}

impl Default for OraclesConfig {
    fn default() -> Self {
        Self::mainnet()
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        OraclesConfig::mainnet().backend
    }
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            late_after_ms: 300,
        }
    }
}

impl Default for VotingConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 10,
        }
    }
}

impl VotingConfig {
    pub fn poll_interval(&self) -> Option<Duration> {
        match self.poll_interval_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

impl OraclesConfig {
    /// Loads the preset of `network`, then `path` if given, then the environment
    pub fn load(network: Network, path: Option<&Path>) -> Result<Self, OraclesError> {
        let defaults = Self::for_network(network);
        let mut builder = config::Config::builder().add_source(config::Config::try_from(&defaults)?);
        if let Some(path) = path {
            debug!("Reading configuration from {}", path.display());
            builder = builder.add_source(config::File::from(path));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: OraclesConfig = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    pub fn from_toml_str(data: &str) -> Result<Self, OraclesError> {
        toml::from_str(data).map_err(|e| OraclesError::Config(e.to_string()))
    }

    pub fn to_toml(&self) -> Result<String, OraclesError> {
        toml::to_string_pretty(self).map_err(|e| OraclesError::Config(e.to_string()))
    }

    pub fn list_options(&self) -> ListOptions {
        ListOptions::from(&self.list)
    }

    pub fn validate(&self) -> ValidationResult {
        ConfigValidator::new().validate(self)
    }
}
