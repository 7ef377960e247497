//! Read-only access to the secrets the front-ends need.
//!
//! Secrets are looked up by logical key ([`keys`]) and each backend maps
//! those keys to its own locations:
//!
//! ```toml
//! [credentials]
//! backend = "pass"
//! path = "finance/t-invest"
//!
//! [credentials.fields]
//! broker_token = "token"
//! account_id = "account"
//! ```

mod config;
mod env;
mod pass;

pub use config::CredentialConfig;
pub use env::{EnvConfig, EnvCredentialStore};
pub use pass::{PassConfig, PassCredentialStore};

use anyhow::Result;
use async_trait::async_trait;
use secrecy::SecretString;

/// Logical credential keys.
pub mod keys {
    pub const BROKER_TOKEN: &str = "broker_token";
    pub const ACCOUNT_ID: &str = "account_id";
    pub const TELEGRAM_TOKEN: &str = "telegram_token";
    pub const CHAT_ID: &str = "chat_id";
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Returns `Ok(None)` if the key is not set, `Err` if the backend failed.
    async fn get(&self, key: &str) -> Result<Option<SecretString>>;

    /// Backend name for diagnostics.
    fn backend(&self) -> &'static str;
}
