use crate::error::{CortexError, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SERVICE_URL: &str = "wss://localhost:6868";

/// Connection settings for the local recording service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CortexConfig {
    pub url: String,
    pub client_id: String,
    pub client_secret: String,
    /// Empty means the first headset the service reports.
    pub headset_id: String,
    /// Session debit requested during authorize.
    pub debit: u32,
}

impl Default for CortexConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SERVICE_URL.into(),
            client_id: String::new(),
            client_secret: String::new(),
            headset_id: String::new(),
            debit: 10,
        }
    }
}

impl CortexConfig {
    /// Environment variables win over whatever the config file provided.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(id) = std::env::var("CORTEX_CLIENT_ID") {
            self.client_id = id;
        }
        if let Ok(secret) = std::env::var("CORTEX_CLIENT_SECRET") {
            self.client_secret = secret;
        }
        if let Ok(url) = std::env::var("CORTEX_URL") {
            self.url = url;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.client_id.is_empty() || self.client_secret.is_empty() {
            return Err(CortexError::MissingCredentials);
        }
        Ok(())
    }
}
