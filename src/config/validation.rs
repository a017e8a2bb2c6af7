use std::collections::HashMap;
use std::str::FromStr;

use log::{debug, error};
use reqwest::Url;
use thiserror::Error;

use super::{Network, OraclesConfig};

pub const MAX_PAGE_SIZE: usize = 100;
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Error type for configuration validation issues
#[derive(Debug, Error)]
pub enum ConfigValidationError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    #[error("Value out of range: {0}")]
    ValueOutOfRange(String),

    #[error("Security risk: {0}")]
    SecurityRisk(String),
}

/// Result of configuration validation
#[derive(Debug)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ConfigValidationError>,
    /// Valid but not recommended
    pub warnings: Vec<String>,
    pub suggested_fixes: HashMap<String, String>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            suggested_fixes: HashMap::new(),
        }
    }

    pub fn add_error(&mut self, error: ConfigValidationError) {
        self.is_valid = false;
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    pub fn add_suggested_fix(&mut self, setting: &str, suggestion: String) {
        self.suggested_fixes.insert(setting.to_string(), suggestion);
    }

    /// Return a summary of validation issues
    pub fn get_summary(&self) -> String {
        if self.is_valid && self.warnings.is_empty() {
            return "Configuration is valid with no warnings.".to_string();
        }

        let mut result = String::new();
        if !self.is_valid {
            result.push_str(&format!("Configuration has {} errors:\n", self.errors.len()));
            for (i, error) in self.errors.iter().enumerate() {
                result.push_str(&format!("  {}. {}\n", i + 1, error));
            }
        } else {
            result.push_str("Configuration is valid but has warnings.\n");
        }

        if !self.warnings.is_empty() {
            result.push_str(&format!("\nWarnings ({}):\n", self.warnings.len()));
            for (i, warning) in self.warnings.iter().enumerate() {
                result.push_str(&format!("  {}. {}\n", i + 1, warning));
            }
        }

        if !self.suggested_fixes.is_empty() {
            result.push_str("\nSuggested fixes:\n");
            let mut fixes: Vec<_> = self.suggested_fixes.iter().collect();
            fixes.sort();
            for (setting, suggestion) in fixes {
                result.push_str(&format!("  - {}: {}\n", setting, suggestion));
            }
        }

        result
    }
}

pub trait ValidationRule {
    fn name(&self) -> &str;

    fn validate(&self, config: &OraclesConfig) -> Result<(), ConfigValidationError>;

    fn suggest_fix(&self, config: &OraclesConfig) -> Option<(String, String)>;
}

struct BackendUrlRule;

impl ValidationRule for BackendUrlRule {
    fn name(&self) -> &str {
        "BackendUrl"
    }

    fn validate(&self, config: &OraclesConfig) -> Result<(), ConfigValidationError> {
        let url = Url::parse(&config.backend.url).map_err(|e| {
            ConfigValidationError::InvalidValue(format!("backend.url {}: {}", config.backend.url, e))
        })?;
        match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(ConfigValidationError::InvalidValue(format!(
                "backend.url must use http or https, not {}",
                scheme
            ))),
        }
    }

    fn suggest_fix(&self, config: &OraclesConfig) -> Option<(String, String)> {
        Some((
            "backend.url".to_string(),
            format!("use the preset url {}", OraclesConfig::for_network(config.network).backend.url),
        ))
    }
}

struct RequestTimeoutRule;

impl ValidationRule for RequestTimeoutRule {
    fn name(&self) -> &str {
        "RequestTimeout"
    }

    fn validate(&self, config: &OraclesConfig) -> Result<(), ConfigValidationError> {
        let timeout = config.backend.request_timeout_secs;
        if timeout == 0 || timeout > MAX_REQUEST_TIMEOUT_SECS {
            return Err(ConfigValidationError::ValueOutOfRange(format!(
                "backend.request_timeout_secs must be within 1..={}, got {}",
                MAX_REQUEST_TIMEOUT_SECS, timeout
            )));
        }
        Ok(())
    }

    fn suggest_fix(&self, _config: &OraclesConfig) -> Option<(String, String)> {
        Some(("backend.request_timeout_secs".to_string(), "30".to_string()))
    }
}

struct PageSizeRule;

impl ValidationRule for PageSizeRule {
    fn name(&self) -> &str {
        "PageSize"
    }

    fn validate(&self, config: &OraclesConfig) -> Result<(), ConfigValidationError> {
        let size = config.list.page_size;
        if size == 0 || size > MAX_PAGE_SIZE {
            return Err(ConfigValidationError::ValueOutOfRange(format!(
                "list.page_size must be within 1..={}, got {}",
                MAX_PAGE_SIZE, size
            )));
        }
        Ok(())
    }

    fn suggest_fix(&self, _config: &OraclesConfig) -> Option<(String, String)> {
        Some(("list.page_size".to_string(), "10".to_string()))
    }
}

struct LogLevelRule;

impl ValidationRule for LogLevelRule {
    fn name(&self) -> &str {
        "LogLevel"
    }

    fn validate(&self, config: &OraclesConfig) -> Result<(), ConfigValidationError> {
        log::LevelFilter::from_str(&config.log_level)
            .map(|_| ())
            .map_err(|_| {
                ConfigValidationError::InvalidValue(format!("unknown log_level {}", config.log_level))
            })
    }

    fn suggest_fix(&self, _config: &OraclesConfig) -> Option<(String, String)> {
        Some((
            "log_level".to_string(),
            "one of off, error, warn, info, debug, trace".to_string(),
        ))
    }
}

/// Applies every rule and collects warnings for settings that work but hurt
pub struct ConfigValidator {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl Default for ConfigValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigValidator {
    pub fn new() -> Self {
        let mut validator = Self { rules: Vec::new() };
        validator.add_rule(Box::new(BackendUrlRule));
        validator.add_rule(Box::new(RequestTimeoutRule));
        validator.add_rule(Box::new(PageSizeRule));
        validator.add_rule(Box::new(LogLevelRule));
        validator
    }

    pub fn add_rule(&mut self, rule: Box<dyn ValidationRule>) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &[Box<dyn ValidationRule>] {
        &self.rules
    }

    pub fn validate(&self, config: &OraclesConfig) -> ValidationResult {
        let mut result = ValidationResult::new();

        for rule in &self.rules {
            match rule.validate(config) {
                Ok(()) => debug!("Validation rule '{}' passed", rule.name()),
                Err(err) => {
                    error!("Validation rule '{}' failed: {}", rule.name(), err);
                    result.add_error(err);
                    if let Some((setting, suggestion)) = rule.suggest_fix(config) {
                        result.add_suggested_fix(&setting, suggestion);
                    }
                }
            }
        }

        if config.network != Network::Local && config.backend.url.starts_with("http://") {
            result.add_warning(
                ConfigValidationError::SecurityRisk(format!(
                    "{} backend is reached over plain http",
                    config.network
                ))
                .to_string(),
            );
        }

        if config.list.late_after_ms >= config.backend.request_timeout_secs.saturating_mul(1000) {
            result.add_warning(
                "list.late_after_ms is not shorter than the request timeout; loading placeholders will never show"
                    .to_string(),
            );
        }

        if config.voting.poll_interval_secs == 0 {
            result.add_warning("voting.poll_interval_secs is 0; votings are only refreshed after transactions".to_string());
        }

        result
    }
}
