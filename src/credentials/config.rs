use serde::{Deserialize, Serialize};

use super::env::{EnvConfig, EnvCredentialStore};
use super::pass::{PassConfig, PassCredentialStore};
use super::CredentialStore;

/// The `[credentials]` table: which backend holds the secrets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum CredentialConfig {
    Env {
        #[serde(flatten)]
        config: EnvConfig,
    },
    Pass {
        #[serde(flatten)]
        config: PassConfig,
    },
}

impl Default for CredentialConfig {
    fn default() -> Self {
        CredentialConfig::Env {
            config: EnvConfig::default(),
        }
    }
}

impl CredentialConfig {
    pub fn build(&self) -> Box<dyn CredentialStore> {
        match self {
            CredentialConfig::Env { config } => Box::new(EnvCredentialStore::new(config.clone())),
            CredentialConfig::Pass { config } => Box::new(PassCredentialStore::new(config.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pass_backend() -> anyhow::Result<()> {
        let config: CredentialConfig = toml::from_str(
            r#"
backend = "pass"
path = "finance/t-invest"

[fields]
broker_token = "password"
"#,
        )?;

        match config {
            CredentialConfig::Pass { config } => {
                assert_eq!(config.path, "finance/t-invest");
                assert_eq!(config.fields.get("broker_token").map(String::as_str), Some("password"));
            }
            other => panic!("unexpected backend: {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn parses_env_overrides() -> anyhow::Result<()> {
        let config: CredentialConfig = toml::from_str(
            r#"
backend = "env"

[vars]
broker_token = "INVEST_TOKEN"
"#,
        )?;

        let store = config.build();
        assert_eq!(store.backend(), "env");
        match config {
            CredentialConfig::Env { config } => {
                assert_eq!(config.vars.get("broker_token").map(String::as_str), Some("INVEST_TOKEN"));
            }
            other => panic!("unexpected backend: {other:?}"),
        }
        Ok(())
    }
}
