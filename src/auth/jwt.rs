//! JWT issuing and caching.
//!
//! Expiry is checked lazily on every [`TokenProvider::get_token`] call; there
//! is no background refresh. The cache is guarded by an `RwLock` but token
//! acquisition is not single-flight: callers racing through an empty or
//! expired cache may each acquire a token, and the last one written wins.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::RwLock;

use super::TokenProvider;
use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::transport::{HttpRequest, Transport};

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// Issuer: the API host
    iss: String,
    /// Project public key
    jti: String,
    /// Issued-at unix seconds
    iat: i64,
    /// Not-before unix seconds
    nbf: i64,
    /// Expiration unix seconds
    exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    file_encryption_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExpiryClaim {
    exp: Option<i64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: i64,
}

impl CachedToken {
    fn is_valid_at(&self, now: i64) -> bool {
        now <= self.expires_at
    }
}

/// Token provider backed by the project keys in [`ApiConfig`].
pub struct JwtAuth {
    config: Arc<ApiConfig>,
    transport: Arc<dyn Transport>,
    cache: RwLock<Option<CachedToken>>,
}

impl JwtAuth {
    pub fn new(config: Arc<ApiConfig>, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            transport,
            cache: RwLock::new(None),
        }
    }

    /// Seed the cache with an existing token.
    pub async fn set_token(&self, token: impl Into<String>) -> Result<()> {
        let token = token.into();
        let expires_at = decode_expiry(&token)?;
        *self.cache.write().await = Some(CachedToken { token, expires_at });
        Ok(())
    }

    /// The cached token, if any, whether or not it is still valid.
    pub async fn cached_token(&self) -> Option<String> {
        self.cache.read().await.as_ref().map(|c| c.token.clone())
    }

    fn issue_local(&self, secret: &str) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.config.token_ttl_secs.max(1));
        let claims = Claims {
            iss: self.config.host.clone(),
            jti: self.config.public_key.clone(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: exp.timestamp(),
            file_encryption_key: self.config.file_encryption_key.clone(),
        };
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(|e| Error::Auth(format!("Failed to sign token: {}", e)))?;
        tracing::info!("Issued API token locally (expires at {})", claims.exp);
        Ok(token)
    }

    async fn exchange_remote(&self) -> Result<String> {
        let url = format!("{}/auth", self.config.base_url());
        let request =
            HttpRequest::post(url).json(json!({ "public_key": self.config.public_key }));
        let response = self.transport.send(request).await?;
        let body = response
            .json()
            .map_err(|e| Error::Auth(format!("Failed to parse auth response: {}", e)))?;

        let token = body
            .get("token")
            .and_then(|t| t.as_str())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::Auth("Auth response did not contain a token".to_string()))?;
        tracing::info!("Obtained API token from remote exchange");
        Ok(token.to_string())
    }
}

#[async_trait]
impl TokenProvider for JwtAuth {
    async fn get_token(&self) -> Result<String> {
        let now = Utc::now().timestamp();
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.is_valid_at(now) {
                    return Ok(cached.token.clone());
                }
                tracing::debug!("Cached API token expired at {}", cached.expires_at);
            }
        }

        let token = match self.config.secret_key.as_deref() {
            Some(secret) => self.issue_local(secret)?,
            None => self.exchange_remote().await?,
        };
        let expires_at = decode_expiry(&token)?;

        *self.cache.write().await = Some(CachedToken {
            token: token.clone(),
            expires_at,
        });
        Ok(token)
    }
}

/// Read the `exp` claim without verifying the signature.
fn decode_expiry(token: &str) -> Result<i64> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims = HashSet::new();

    let data =
        jsonwebtoken::decode::<ExpiryClaim>(token, &DecodingKey::from_secret(&[]), &validation)
            .map_err(|e| Error::Auth(format!("Failed to decode token: {}", e)))?;
    data.claims
        .exp
        .ok_or_else(|| Error::Auth("Token has no exp claim".to_string()))
}
