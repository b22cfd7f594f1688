use super::{Config, SecretsLoader};
use crate::errors::ConfigError;
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tracing::info;

pub struct ConfigManager {
    current_config: Arc<Config>,
}

impl ConfigManager {
    pub async fn new(config_dir: String) -> Result<Self> {
        let config = Self::load_configuration(&config_dir).await?;
        Ok(Self {
            current_config: Arc::new(config),
        })
    }

    pub fn get_current_config(&self) -> Arc<Config> {
        self.current_config.clone()
    }

    async fn load_configuration(config_dir: &str) -> Result<Config> {
        let main_config_path = format!("{}/main.toml", config_dir);
        let main_config_content =
            fs::read_to_string(&main_config_path)
                .await
                .map_err(|e| ConfigError::LoadFailed {
                    path: main_config_path.clone(),
                    reason: e.to_string(),
                })?;

        let mut config: Config =
            toml::from_str(&main_config_content).map_err(|e| ConfigError::ParseError {
                path: main_config_path.clone(),
                reason: e.to_string(),
            })?;

        Self::validate(&config)?;

        let secrets_path = format!("{}/secrets.toml", config_dir);
        let secrets = SecretsLoader::load(Path::new(&secrets_path))?;
        config.users = secrets.users();

        info!(
            "Loaded configuration: listening on {}:{}, {} API users",
            config.host,
            config.port,
            config.users.len()
        );

        Ok(config)
    }

    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.http_timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "http_timeout_seconds".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if config.audit_retention_days <= 0 {
            return Err(ConfigError::InvalidValue {
                field: "audit_retention_days".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if config.manual_check_limit_per_minute == 0 {
            return Err(ConfigError::InvalidValue {
                field: "manual_check_limit_per_minute".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        reqwest::Url::parse(&config.provider_api_base).map_err(|e| ConfigError::InvalidValue {
            field: "provider_api_base".to_string(),
            reason: e.to_string(),
        })?;
        Ok(())
    }
}
