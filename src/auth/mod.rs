//! Bearer token management.
//!
//! Every API call is authorized with a JWT obtained from a [`TokenProvider`].
//! [`JwtAuth`] either signs tokens locally (when a secret key is configured)
//! or exchanges the public key for a token at `/auth`, and caches the result
//! until its `exp` claim has passed.

mod jwt;

pub use jwt::JwtAuth;

use async_trait::async_trait;

use crate::error::Result;

/// Produces bearer tokens for API calls.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Return a token valid at the time of the call.
    async fn get_token(&self) -> Result<String>;
}
