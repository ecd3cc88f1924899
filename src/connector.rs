//! Connect orchestration.
//!
//! [`Connector::connect`] drives one connect end to end:
//!
//! 1. fetch a bearer token (IAM mode only)
//! 2. resolve the instance endpoint via the Admin API
//! 3. generate an RSA key pair and mint an ephemeral client certificate
//! 4. dial the data-plane proxy port and perform the mTLS handshake
//! 5. run the framed metadata exchange and hand back the open channel
//!
//! The call is a single linear transaction: no background tasks, no shared
//! mutable state, every network step bounded by the per-I/O deadline.
//! Failure at any step closes whatever socket was opened; nothing leaks on
//! any exit path.

use std::future::Future;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use zeroize::Zeroizing;

use crate::control_plane::ControlPlaneClient;
use crate::crypto::{self, EphemeralCredentials};
use crate::error::{ConnectorError, Result};
use crate::options::{AuthMode, ConnectOptions};
use crate::protocol::{read_frame, write_frame, AuthType, ExchangeRequest, ExchangeResponse, ResponseCode};
use crate::stream::AuthenticatedChannel;
use crate::tls::TlsConnector;
use crate::token::AccessToken;

/// The data-plane proxy port. Distinct from the vanilla PostgreSQL port:
/// it expects the metadata exchange before any PostgreSQL traffic.
pub const PROXY_PORT: u16 = 5433;

/// Produces authenticated channels to AlloyDB instances.
///
/// One connector owns one [`ControlPlaneClient`] and may be shared across
/// any number of concurrent [`connect`](Connector::connect) calls; it
/// holds no per-connect state.
#[derive(Clone)]
pub struct Connector {
    control_plane: ControlPlaneClient,
    proxy_port: u16,
}

impl Connector {
    /// Create a connector against the production control plane.
    pub fn new() -> Result<Self> {
        Ok(Self {
            control_plane: ControlPlaneClient::new()?,
            proxy_port: PROXY_PORT,
        })
    }

    /// Create a connector with a custom control-plane client.
    pub fn with_control_plane(control_plane: ControlPlaneClient) -> Self {
        Self {
            control_plane,
            proxy_port: PROXY_PORT,
        }
    }

    /// Override the data-plane port (builder pattern). Defaults to
    /// [`PROXY_PORT`]; real instances listen nowhere else.
    pub fn with_proxy_port(mut self, port: u16) -> Self {
        self.proxy_port = port;
        self
    }

    /// Open an authenticated channel to the instance in `options`.
    ///
    /// Returns only once the metadata exchange has been accepted (or
    /// failed); the returned channel carries PostgreSQL bytes from its
    /// first read onward.
    pub async fn connect(&self, options: &ConnectOptions) -> Result<AuthenticatedChannel> {
        self.perform_connect(options).await
    }

    /// Like [`connect`](Connector::connect), aborting early when `cancel`
    /// fires.
    ///
    /// Cancellation drops whatever I/O is in flight, closing any open
    /// socket, and returns [`ConnectorError::Cancelled`].
    pub async fn connect_with_cancellation(
        &self,
        options: &ConnectOptions,
        cancel: &CancellationToken,
    ) -> Result<AuthenticatedChannel> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ConnectorError::Cancelled),
            result = self.perform_connect(options) => result,
        }
    }

    async fn perform_connect(&self, options: &ConnectOptions) -> Result<AuthenticatedChannel> {
        let deadline = options.io_deadline();
        let instance = options.instance_uri();

        let token = self.fetch_token(options).await?;
        let bearer = token.as_ref().map(|t| t.secret());

        let endpoint = self
            .control_plane
            .connection_info(instance, bearer, deadline)
            .await?;
        debug!("resolved {} to {}", instance, endpoint.ip_address);

        let (private_key, public_key_pem) = crypto::generate_key_pair()?;
        let cluster_uri = instance.cluster_uri();
        let (cert_chain, ca_cert) = self
            .control_plane
            .generate_client_certificate(&cluster_uri, &public_key_pem, bearer, deadline)
            .await?;
        let credentials = EphemeralCredentials {
            private_key,
            cert_chain,
            ca_cert,
        };
        debug!("minted ephemeral certificate for {}", cluster_uri);

        let addr = format!("{}:{}", endpoint.ip_address, self.proxy_port);
        let tcp = with_deadline(deadline, "tcp dial", async {
            TcpStream::connect(addr.as_str())
                .await
                .map_err(|e| ConnectorError::dial(addr.as_str(), e.to_string()))
        })
        .await?;

        // The private key moves into the TLS context here; the handshake
        // failing drops the raw socket with the connector.
        let tls_connector = TlsConnector::for_credentials(&credentials)?;
        let mut stream = with_deadline(deadline, "tls handshake", async {
            tls_connector.connect(tcp, &endpoint.ip_address).await
        })
        .await?;

        let request = ExchangeRequest {
            user_agent: options.user_agent().to_string(),
            auth_type: match options.auth_mode() {
                AuthMode::Iam => AuthType::Iam,
                AuthMode::DbNative => AuthType::DbNative,
            },
            oauth2_token: token
                .as_ref()
                .map(|t| t.secret().to_string())
                .unwrap_or_default(),
        };
        let payload = Zeroizing::new(request.encode());

        with_deadline(deadline, "metadata exchange send", async {
            write_frame(&mut stream, &payload).await
        })
        .await?;

        let frame = with_deadline(deadline, "metadata exchange recv", async {
            read_frame(&mut stream).await
        })
        .await?;
        let response = ExchangeResponse::decode(&frame)?;

        match response.response_code {
            ResponseCode::Ok => {
                let channel = AuthenticatedChannel::new(stream);
                info!(
                    "connected to {} ({})",
                    instance,
                    channel.tls_version().unwrap_or("TLS")
                );
                Ok(channel)
            }
            ResponseCode::Error => {
                let _ = stream.shutdown().await;
                Err(ConnectorError::MetadataRejected(response.error))
            }
            ResponseCode::Unspecified => {
                let _ = stream.shutdown().await;
                Err(ConnectorError::metadata_protocol(
                    "server returned an unspecified response code",
                ))
            }
        }
    }

    /// Fetch a bearer token in IAM mode; DB-native connects carry none.
    ///
    /// Provider failure surfaces as [`ConnectorError::TokenUnavailable`]
    /// before any network call is made.
    async fn fetch_token(&self, options: &ConnectOptions) -> Result<Option<AccessToken>> {
        match options.auth_mode() {
            AuthMode::DbNative => Ok(None),
            AuthMode::Iam => {
                let provider = options.token_provider().ok_or_else(|| {
                    ConnectorError::invalid_config("IAM auth mode requires a token provider")
                })?;
                let token = with_deadline(options.io_deadline(), "token fetch", async {
                    provider
                        .fetch()
                        .await
                        .map_err(|e| ConnectorError::token_unavailable(e.to_string()))
                })
                .await?;
                Ok(Some(token))
            }
        }
    }
}

async fn with_deadline<T, F>(deadline: Duration, step: &'static str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(ConnectorError::deadline(step)),
    }
}
