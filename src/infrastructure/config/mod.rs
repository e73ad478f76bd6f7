//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use crate::application::errors::ConfigError;

/// Bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub bot: BotConfig,
    pub gateway: GatewayConfig,
    pub rate_limit: RateLimitsConfig,
    pub image: ImageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BotConfig {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct GatewayConfig {
    pub token: Option<String>,
    pub app_id: u64,
}

/// Both admission scopes
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RateLimitsConfig {
    /// Keyed by (guild, user)
    pub user: RateLimitConfig,
    /// Keyed by (guild, channel)
    pub channel: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RateLimitConfig {
    pub capacity: u32,
    pub interval_seconds: u64,
    /// Drop entries once they drain to zero
    #[serde(default)]
    pub evict_drained: bool,
}

impl RateLimitConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ImageConfig {
    pub token: Option<String>,
    pub model: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bot: BotConfig {
                name: "replicator".to_string(),
            },
            gateway: GatewayConfig {
                token: None,
                app_id: 1,
            },
            rate_limit: RateLimitsConfig {
                user: RateLimitConfig {
                    capacity: 5,
                    interval_seconds: 10,
                    evict_drained: false,
                },
                channel: RateLimitConfig {
                    capacity: 10,
                    interval_seconds: 10,
                    evict_drained: false,
                },
            },
            image: ImageConfig {
                token: None,
                model: "prompthero/openjourney:9936c2001faa2194a261c01381f90e65261879985476014a0a37a334593a05eb"
                    .to_string(),
            },
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self)
            .map_err(|e| ConfigError::Parse(format!("Failed to serialize config: {}", e)))
    }

    /// Reject settings the limiters and handlers cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (scope, limit) in [("user", &self.rate_limit.user), ("channel", &self.rate_limit.channel)] {
            if limit.capacity == 0 {
                return Err(ConfigError::InvalidValue(format!("rate-limit.{scope}.capacity must be positive")));
            }
            if limit.interval_seconds == 0 {
                return Err(ConfigError::InvalidValue(format!(
                    "rate-limit.{scope}.interval-seconds must be positive"
                )));
            }
        }
        if self.image.model.trim().is_empty() {
            return Err(ConfigError::MissingField("image.model".to_string()));
        }
        Ok(())
    }

    pub fn load_env() -> Self {
        // Load from environment variables
        let mut config = Config::default();

        if let Ok(token) = std::env::var("DISCORD_TOKEN") {
            config.gateway.token = Some(token);
        }

        if let Ok(token) = std::env::var("REPLICATE_TOKEN") {
            config.image.token = Some(token);
        }

        if let Ok(level) = std::env::var("BOT_LOG_LEVEL") {
            config.logging.level = level;
        }

        config
    }
}
