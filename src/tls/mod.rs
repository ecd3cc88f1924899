//! TLS support for the data-plane connection.
//!
//! The proxy port speaks mutual TLS: the connector presents the freshly
//! minted ephemeral client certificate, and the server presents a
//! certificate that must chain to the CA returned alongside it.
//!
//! # Verification policy
//!
//! The server certificate's identity is an internal instance UID, not the
//! IP or DNS name being dialed, so hostname verification is deliberately
//! suppressed: [`verifier::CaVerifier`] performs full chain verification
//! against the minted CA and accepts only the name-mismatch case. The CA is
//! created for this one session, which is what makes the narrowing sound.
//!
//! - Uses rustls (pure Rust TLS implementation) with the ring provider
//! - TLS 1.2 minimum, TLS 1.3 preferred
//! - Trust is pinned to the minted CA; no system roots are consulted

mod connector;
mod material;
mod verifier;

pub(crate) use connector::TlsConnector;
pub(crate) use material::client_config;
