//! Password-store (pass) credential backend.

use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tokio::process::Command;

use super::CredentialStore;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassConfig {
    /// Entry path, e.g. "finance/t-invest".
    pub path: String,

    /// Logical key to entry field name. Unmapped keys are used as-is.
    #[serde(default)]
    pub fields: HashMap<String, String>,
}

/// Reads secrets from one pass entry.
///
/// ```text
/// t.xxxxxxxxxxxxxxxx
/// account: 2000123456
/// chat: -100123
/// ```
///
/// The first line is exposed as the `password` field.
pub struct PassCredentialStore {
    config: PassConfig,
}

impl PassCredentialStore {
    pub fn new(config: PassConfig) -> Self {
        Self { config }
    }

    fn field_name<'a>(&'a self, key: &'a str) -> &'a str {
        self.config
            .fields
            .get(key)
            .map(|s| s.as_str())
            .unwrap_or(key)
    }

    async fn read_entry(&self) -> Result<HashMap<String, String>> {
        let output = Command::new("pass")
            .arg("show")
            .arg(&self.config.path)
            .output()
            .await
            .context("Failed to run pass command")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("pass show {} failed: {}", self.config.path, stderr.trim());
        }

        let content = String::from_utf8(output.stdout).context("Invalid UTF-8 in pass output")?;
        Ok(parse_entry(&content))
    }
}

#[async_trait]
impl CredentialStore for PassCredentialStore {
    async fn get(&self, key: &str) -> Result<Option<SecretString>> {
        let field = self.field_name(key);
        let mut entry = self.read_entry().await?;
        Ok(entry
            .remove(field)
            .filter(|v| !v.trim().is_empty())
            .map(SecretString::from))
    }

    fn backend(&self) -> &'static str {
        "pass"
    }
}

fn parse_entry(content: &str) -> HashMap<String, String> {
    let mut lines = content.lines();
    let mut fields = HashMap::new();
    if let Some(first) = lines.next() {
        fields.insert("password".to_string(), first.trim().to_string());
    }
    for line in lines {
        if let Some((key, value)) = line.split_once(':') {
            fields.insert(key.trim().to_string(), value.trim().to_string());
        }
    }
    fields
}
