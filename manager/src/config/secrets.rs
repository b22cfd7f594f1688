//! Secrets loader for API users.
//!
//! Secrets are stored in a separate TOML file (config/secrets.toml) that should
//! be excluded from version control. Each table under `[users]` describes one
//! API caller; the table key becomes the user id.
//!
//! Example secrets.toml:
//! ```toml
//! [users.ops]
//! name = "Operations"
//! api_key = "secret-api-key-1"
//! role = "admin"
//!
//! [users.alice]
//! name = "Alice"
//! api_key = "secret-api-key-2"
//! role = "user"
//! assigned_zone_ids = ["023e105f4ecef8ad9ca31a8372d0c353"]
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

use super::ApiUser;

/// Structure matching the secrets.toml file format
#[derive(Debug, Deserialize, Default)]
pub struct SecretsFile {
    #[serde(default)]
    pub users: HashMap<String, ApiUser>,
}

/// Loader for secrets from the secrets.toml file
pub struct SecretsLoader {
    secrets: SecretsFile,
}

impl SecretsLoader {
    /// Load secrets from the specified file path.
    /// Returns an empty loader if the file doesn't exist.
    pub fn load(secrets_path: &Path) -> Result<Self> {
        if !secrets_path.exists() {
            warn!(
                "Secrets file not found at {:?}, every authenticated route will answer 401",
                secrets_path
            );
            return Ok(Self {
                secrets: SecretsFile::default(),
            });
        }

        let content = std::fs::read_to_string(secrets_path)
            .with_context(|| format!("Failed to read secrets file: {:?}", secrets_path))?;

        let secrets: SecretsFile = toml::from_str(&content)
            .with_context(|| format!("Failed to parse secrets file: {:?}", secrets_path))?;

        if let Some((id, _)) = secrets.users.iter().find(|(_, u)| u.api_key.trim().is_empty()) {
            anyhow::bail!("User '{}' in {:?} has an empty api_key", id, secrets_path);
        }

        info!(
            "Loaded {} API users from {:?}",
            secrets.users.len(),
            secrets_path
        );

        Ok(Self { secrets })
    }

    /// All users keyed by id, with `id` filled from the table key
    pub fn users(&self) -> HashMap<String, ApiUser> {
        self.secrets
            .users
            .iter()
            .map(|(id, user)| {
                let mut user = user.clone();
                user.id = id.clone();
                (id.clone(), user)
            })
            .collect()
    }
}
