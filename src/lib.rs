//! alloydb-connector - direct-path connector for AlloyDB for PostgreSQL
//!
//! This library hands a standard PostgreSQL driver an authenticated,
//! pre-established byte stream to an AlloyDB instance, with no
//! authentication sidecar process:
//!
//! - Resolves the instance's reachable endpoint via the Admin API
//! - Mints an ephemeral (≤24h) client certificate for a freshly generated
//!   RSA key pair
//! - Performs a mutual-TLS handshake against the data-plane proxy port
//! - Runs the length-framed metadata exchange declaring the auth mode
//!   (IAM bearer token or database-native password)
//! - Returns the open channel, indistinguishable from a raw TCP socket,
//!   for the driver to speak PostgreSQL over
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use alloydb_connector::{ConnectOptions, Connector, StaticTokenProvider};
//!
//! # async fn demo() -> alloydb_connector::Result<()> {
//! let options = ConnectOptions::builder(
//!     "projects/p/locations/us-central1/clusters/c/instances/i".parse()?,
//! )
//! .token_provider(Arc::new(StaticTokenProvider::new("ya29.token")))
//! .build()?;
//!
//! let connector = Connector::new()?;
//! let channel = connector.connect(&options).await?;
//! // Hand `channel` to the PostgreSQL driver as its socket.
//! # let _ = channel;
//! # Ok(())
//! # }
//! ```

#[macro_use]
mod logging;

pub mod connector;
pub mod control_plane;
pub mod crypto;
pub mod dialer;
pub mod error;
pub mod instance;
pub mod options;
pub mod protocol;
pub mod stream;
mod tls;
pub mod token;

pub use connector::{Connector, PROXY_PORT};
pub use control_plane::{ControlPlaneClient, EndpointInfo};
pub use crypto::EphemeralCredentials;
pub use dialer::{dial_for_driver, Dialer};
pub use error::{ConnectorError, Result};
pub use instance::InstanceUri;
pub use options::{AuthMode, ConnectOptions, ConnectOptionsBuilder};
pub use protocol::{AuthType, ExchangeRequest, ExchangeResponse, ResponseCode};
pub use stream::AuthenticatedChannel;
pub use token::{AccessToken, StaticTokenProvider, TokenProvider};
