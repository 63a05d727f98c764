//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::calculate::ScoringPolicy;
use crate::models::{ClanTag, PromotionRules, PromotionTable};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Game API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the game API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Environment variable holding the API token
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_base_url() -> String {
    "https://api.clashofclans.com/v1/".to_string()
}

fn default_token_env() -> String {
    "COC_API_TOKEN".to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token_env: default_token_env(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl ApiConfig {
    /// Read the API token from the configured environment variable.
    pub fn token(&self) -> Result<String, ConfigError> {
        std::env::var(&self.token_env).map_err(|_| {
            ConfigError::ValidationError(format!("{} is not set", self.token_env))
        })
    }
}

/// A clan to analyze.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedClan {
    /// Short name used for file names, e.g. "bc"
    pub alias: String,

    pub tag: ClanTag,

    /// Display name
    pub name: String,
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Rebuild leagues even when a cached copy exists
    #[serde(default)]
    pub recheck: bool,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub scoring: ScoringPolicy,

    #[serde(default)]
    pub promotion: PromotionTable,

    #[serde(default)]
    pub clans: Vec<TrackedClan>,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            recheck: false,
            api: ApiConfig::default(),
            scoring: ScoringPolicy::default(),
            promotion: PromotionTable::default(),
            clans: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "API timeout must be greater than 0".to_string(),
            ));
        }

        if url::Url::parse(&self.api.base_url).is_err() {
            return Err(ConfigError::ValidationError(format!(
                "API base URL is not a valid URL: {}",
                self.api.base_url
            )));
        }

        if self.scoring.missed_attack_penalty < 0.0 {
            return Err(ConfigError::ValidationError(
                "Missed attack penalty is a magnitude and must not be negative".to_string(),
            ));
        }

        self.promotion_rules()?;

        let mut aliases = HashSet::new();
        for clan in &self.clans {
            if clan.alias.is_empty() || clan.alias.contains(['/', '\\']) {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid clan alias: {:?}",
                    clan.alias
                )));
            }
            if !aliases.insert(clan.alias.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "Duplicate clan alias: {}",
                    clan.alias
                )));
            }
        }

        Ok(())
    }

    /// Compile the promotion table.
    pub fn promotion_rules(&self) -> Result<PromotionRules, ConfigError> {
        PromotionRules::compile(&self.promotion)
            .map_err(|e| ConfigError::ValidationError(format!("Invalid tier pattern: {}", e)))
    }

    /// Look up a tracked clan by alias.
    pub fn clan(&self, alias: &str) -> Option<&TrackedClan> {
        self.clans.iter().find(|c| c.alias == alias)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TierRule;

    const SAMPLE: &str = r##"
data_dir = "/var/lib/cwl"
recheck = true

[scoring]
missed_attack_penalty = 150.0

[[promotion.demotions]]
pattern = "Champion League I"
slots = 3

[[promotion.demotions]]
pattern = ".*"
slots = 2

[[clans]]
alias = "bc"
tag = "pj2uvurc"
name = "The Black Cabin"

[[clans]]
alias = "tbc"
tag = "#2PRG8V0G2"
name = "TBC"
"##;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.log_level, "info");
        assert!(!config.recheck);
        assert_eq!(config.api.token_env, "COC_API_TOKEN");
        assert_eq!(config.scoring.missed_attack_penalty, 100.0);
        assert!(!config.scoring.number_difference_check);
        assert_eq!(config.promotion, PromotionTable::default());
        assert!(config.clans.is_empty());
    }

    #[test]
    fn test_parse_sample() {
        let config: AppConfig = toml::from_str(SAMPLE).unwrap();
        assert!(config.validate().is_ok());

        assert_eq!(config.data_dir, PathBuf::from("/var/lib/cwl"));
        assert!(config.recheck);
        assert_eq!(config.scoring.missed_attack_penalty, 150.0);
        assert_eq!(config.api.timeout_seconds, 30);
        // Promotions keep their defaults when only demotions are given
        assert_eq!(config.promotion.promotions.len(), 5);
        assert_eq!(config.promotion.demotions[0], TierRule::new("Champion League I", 3));

        let bc = config.clan("bc").unwrap();
        assert_eq!(bc.tag.as_str(), "#PJ2UVURC");
        assert_eq!(bc.name, "The Black Cabin");
        assert!(config.clan("fever").is_none());

        let rules = config.promotion_rules().unwrap();
        assert_eq!(rules.demotion_slots("Champion League I"), Some(3));
        assert_eq!(rules.demotion_slots("Champion League II"), Some(2));
    }

    #[test]
    fn test_config_validation_ok() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_bad_timeout() {
        let mut config = AppConfig::default();
        config.api.timeout_seconds = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_negative_penalty() {
        let mut config = AppConfig::default();
        config.scoring.missed_attack_penalty = -5.0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_bad_pattern() {
        let mut config = AppConfig::default();
        config.promotion.promotions.push(TierRule::new("[", 1));

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_duplicate_alias() {
        let mut config: AppConfig = toml::from_str(SAMPLE).unwrap();
        config.clans[1].alias = "bc".to_string();

        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, SAMPLE).unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.clans.len(), 2);

        assert!(matches!(
            AppConfig::from_file(&temp_dir.path().join("missing.toml")),
            Err(ConfigError::ReadError(_))
        ));
    }

    #[test]
    fn test_config_serialization() {
        let config: AppConfig = toml::from_str(SAMPLE).unwrap();
        let toml_str = toml::to_string(&config).unwrap();

        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.data_dir, parsed.data_dir);
        assert_eq!(config.clans, parsed.clans);
    }
}
