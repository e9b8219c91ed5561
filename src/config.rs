//! API configuration.
//!
//! Holds the endpoint (protocol, host, version) and the project keys.
//! Values can be built in code, read from environment variables, or
//! deserialized from a JSON file:
//!
//! - `DOCFLOW_PUBLIC_KEY` (required)
//! - `DOCFLOW_SECRET_KEY` - enables local token signing
//! - `DOCFLOW_FILE_ENCRYPTION_KEY` - 14, 16 or 32 characters
//! - `DOCFLOW_HOST`, `DOCFLOW_PROTOCOL`, `DOCFLOW_API_VERSION`
//! - `DOCFLOW_TOKEN_TTL_SECS`

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_PROTOCOL: &str = "https";
pub const DEFAULT_HOST: &str = "api.ilovepdf.com";
pub const DEFAULT_VERSION: &str = "v1";
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 7200;

/// Accepted file encryption key lengths, in characters.
pub const FILE_ENCRYPTION_KEY_LENGTHS: [usize; 3] = [14, 16, 32];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_protocol")]
    pub protocol: String,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_version")]
    pub version: String,
    pub public_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_encryption_key: Option<String>,
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: i64,
}

fn default_protocol() -> String {
    DEFAULT_PROTOCOL.to_string()
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_version() -> String {
    DEFAULT_VERSION.to_string()
}

fn default_token_ttl() -> i64 {
    DEFAULT_TOKEN_TTL_SECS
}

impl ApiConfig {
    pub fn new(public_key: impl Into<String>) -> Self {
        Self {
            protocol: default_protocol(),
            host: default_host(),
            version: default_version(),
            public_key: public_key.into(),
            secret_key: None,
            file_encryption_key: None,
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
        }
    }

    pub fn with_secret_key(mut self, secret_key: impl Into<String>) -> Self {
        let secret_key = secret_key.into();
        self.secret_key = (!secret_key.is_empty()).then_some(secret_key);
        self
    }

    pub fn with_file_encryption_key(mut self, key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        validate_file_encryption_key(&key)?;
        self.file_encryption_key = Some(key);
        Ok(self)
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_token_ttl(mut self, secs: i64) -> Self {
        self.token_ttl_secs = secs.max(1);
        self
    }

    /// Build a config from `DOCFLOW_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let public_key = std::env::var("DOCFLOW_PUBLIC_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::Config("DOCFLOW_PUBLIC_KEY is not set".to_string()))?;

        let mut config = Self::new(public_key);
        if let Ok(secret) = std::env::var("DOCFLOW_SECRET_KEY") {
            config = config.with_secret_key(secret);
        }
        if let Ok(key) = std::env::var("DOCFLOW_FILE_ENCRYPTION_KEY") {
            config = config.with_file_encryption_key(key)?;
        }
        if let Ok(host) = std::env::var("DOCFLOW_HOST") {
            config.host = host;
        }
        if let Ok(protocol) = std::env::var("DOCFLOW_PROTOCOL") {
            config.protocol = protocol;
        }
        if let Ok(version) = std::env::var("DOCFLOW_API_VERSION") {
            config.version = version;
        }
        if let Ok(ttl) = std::env::var("DOCFLOW_TOKEN_TTL_SECS") {
            let secs = ttl
                .parse::<i64>()
                .map_err(|e| Error::Config(format!("Invalid DOCFLOW_TOKEN_TTL_SECS: {}", e)))?;
            config = config.with_token_ttl(secs);
        }
        Ok(config)
    }

    /// Load a config from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        if let Some(key) = &config.file_encryption_key {
            validate_file_encryption_key(key)?;
        }
        tracing::debug!("Loaded API config from {}", path.display());
        Ok(config)
    }

    /// `<protocol>://<host>/<version>`, used for `auth` and `start`.
    pub fn base_url(&self) -> String {
        format!(
            "{}://{}/{}",
            self.protocol,
            self.host.trim_end_matches('/'),
            self.version
        )
    }

    /// URL prefix for calls against the server assigned to a task.
    pub fn server_url(&self, server: &str) -> String {
        format!(
            "{}://{}/{}",
            self.protocol,
            server.trim_end_matches('/'),
            self.version
        )
    }
}

/// Check that a file encryption key has an accepted length.
pub fn validate_file_encryption_key(key: &str) -> Result<()> {
    let length = key.chars().count();
    if FILE_ENCRYPTION_KEY_LENGTHS.contains(&length) {
        Ok(())
    } else {
        Err(Error::FileEncryptionKey { length })
    }
}
