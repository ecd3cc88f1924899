//! TokenProvider trait definition.

use async_trait::async_trait;

use crate::error::Result;

use super::AccessToken;

/// Trait for pluggable OAuth token sources.
///
/// The connector fetches one token per connect and treats the provider as a
/// read-only capability; a single provider may be shared across many
/// concurrent connects. Providers are expected to cache and refresh behind
/// this interface.
///
/// The trait is object-safe so that `Arc<dyn TokenProvider>` can be carried
/// inside connect options.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync` to work with Tokio's
/// multi-threaded runtime.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use alloydb_connector::{StaticTokenProvider, TokenProvider};
///
/// let provider: Arc<dyn TokenProvider> = Arc::new(StaticTokenProvider::new("TOK"));
/// ```
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Produce a bearer token for one connect.
    ///
    /// # Returns
    ///
    /// * `Ok(AccessToken)` - A token currently valid for the control plane
    ///   and the metadata exchange
    /// * `Err(_)` - If no token can be produced; the connector surfaces
    ///   this as [`ConnectorError::TokenUnavailable`](crate::ConnectorError::TokenUnavailable)
    ///   without making any network calls
    async fn fetch(&self) -> Result<AccessToken>;
}
