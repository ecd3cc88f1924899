//! TLS connector for the data-plane handshake.

use std::sync::Arc;

use rustls::pki_types::ServerName;
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;

use crate::crypto::EphemeralCredentials;
use crate::error::{ConnectorError, Result};

/// One-shot TLS connector carrying the ephemeral client identity.
///
/// Wraps `tokio_rustls::TlsConnector` with configuration assembly and
/// error mapping.
pub(crate) struct TlsConnector {
    inner: tokio_rustls::TlsConnector,
}

impl TlsConnector {
    /// Build a connector from minted credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if the chain or CA cannot be parsed, or the
    /// private key does not match the leaf certificate.
    pub(crate) fn for_credentials(credentials: &EphemeralCredentials) -> Result<Self> {
        let config = super::client_config(credentials)?;
        Ok(Self {
            inner: tokio_rustls::TlsConnector::from(Arc::new(config)),
        })
    }

    /// Perform the mTLS handshake over an established TCP connection.
    ///
    /// `server_name` is the dialed endpoint and is used for SNI; it does
    /// not participate in certificate verification (see the module docs).
    pub(crate) async fn connect(
        &self,
        stream: TcpStream,
        server_name: &str,
    ) -> Result<TlsStream<TcpStream>> {
        let name = ServerName::try_from(server_name.to_string()).map_err(|_| {
            ConnectorError::tls_handshake(format!("invalid server name: {server_name}"))
        })?;

        self.inner
            .connect(name, stream)
            .await
            .map_err(|e| ConnectorError::tls_handshake(e.to_string()))
    }
}
