//! Token provider backed by a fixed token.

use async_trait::async_trait;

use crate::error::Result;

use super::{AccessToken, TokenProvider};

/// A [`TokenProvider`] that always returns the same token.
///
/// Useful in tests and in tooling that already holds a valid token. It
/// performs no refreshing; once the wrapped token expires every connect
/// using it will be rejected by the control plane.
pub struct StaticTokenProvider {
    token: AccessToken,
}

impl StaticTokenProvider {
    /// Wrap a raw token string.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: AccessToken::new(token),
        }
    }

    /// Wrap a token carrying validity metadata.
    pub fn from_token(token: AccessToken) -> Self {
        Self { token }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn fetch(&self) -> Result<AccessToken> {
        Ok(self.token.clone())
    }
}
