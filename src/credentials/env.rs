//! Environment-variable credential backend.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use super::{keys, CredentialStore};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvConfig {
    /// Overrides of the default key to variable mapping.
    #[serde(default)]
    pub vars: HashMap<String, String>,
}

/// Reads secrets from process environment variables.
///
/// | key              | variable             |
/// |------------------|----------------------|
/// | `broker_token`   | `TINKOFF_TOKEN`      |
/// | `account_id`     | `TINKOFF_ACCOUNT_ID` |
/// | `telegram_token` | `TOKEN`              |
/// | `chat_id`        | `CHAT_ID`            |
///
/// Unknown keys are looked up as their upper-cased name. Empty values count as unset.
pub struct EnvCredentialStore {
    config: EnvConfig,
}

impl EnvCredentialStore {
    pub fn new(config: EnvConfig) -> Self {
        Self { config }
    }

    pub fn variable_for(&self, key: &str) -> String {
        if let Some(var) = self.config.vars.get(key) {
            return var.clone();
        }
        match key {
            keys::BROKER_TOKEN => "TINKOFF_TOKEN".to_string(),
            keys::ACCOUNT_ID => "TINKOFF_ACCOUNT_ID".to_string(),
            keys::TELEGRAM_TOKEN => "TOKEN".to_string(),
            keys::CHAT_ID => "CHAT_ID".to_string(),
            other => other.to_ascii_uppercase(),
        }
    }
}

impl Default for EnvCredentialStore {
    fn default() -> Self {
        Self::new(EnvConfig::default())
    }
}

#[async_trait]
impl CredentialStore for EnvCredentialStore {
    async fn get(&self, key: &str) -> Result<Option<SecretString>> {
        let var = self.variable_for(key);
        Ok(std::env::var(&var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(SecretString::from))
    }

    fn backend(&self) -> &'static str {
        "env"
    }
}
