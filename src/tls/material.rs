//! Assembling a rustls client configuration from ephemeral credentials.

use std::sync::Arc;

use rsa::pkcs8::EncodePrivateKey;
use rsa::RsaPrivateKey;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use rustls::{ClientConfig, RootCertStore};

use crate::crypto::EphemeralCredentials;
use crate::error::{ConnectorError, Result};

use super::verifier::CaVerifier;

/// Parse all certificates out of a PEM string.
fn certs_from_pem(pem: &str, what: &str) -> Result<Vec<CertificateDer<'static>>> {
    let certs: Vec<CertificateDer<'static>> = rustls_pemfile::certs(&mut pem.as_bytes())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| ConnectorError::certificate_invalid(format!("failed to parse {what}: {e}")))?;

    if certs.is_empty() {
        return Err(ConnectorError::certificate_invalid(format!(
            "{what} contains no certificates"
        )));
    }
    Ok(certs)
}

/// Serialize the ephemeral private key for rustls.
///
/// The intermediate PKCS#8 document zeroizes on drop; after this the key
/// bytes live only inside the TLS context.
fn private_key_der(key: &RsaPrivateKey) -> Result<PrivateKeyDer<'static>> {
    let document = key.to_pkcs8_der().map_err(|e| {
        ConnectorError::certificate_invalid(format!("private key serialization failed: {e}"))
    })?;
    Ok(PrivatePkcs8KeyDer::from(document.as_bytes().to_vec()).into())
}

/// Build the mTLS client configuration for one connect.
///
/// Client identity is the full minted chain (leaf first) plus the
/// ephemeral private key. The trust store holds the minted CA and any
/// non-leaf chain entries; server verification is chain-only (see the
/// module docs).
pub(crate) fn client_config(credentials: &EphemeralCredentials) -> Result<ClientConfig> {
    credentials.validate()?;

    let provider = Arc::new(rustls::crypto::ring::default_provider());

    let mut identity: Vec<CertificateDer<'static>> = Vec::new();
    for (index, pem) in credentials.cert_chain.iter().enumerate() {
        identity.extend(certs_from_pem(pem, &format!("chain certificate {index}"))?);
    }

    let mut roots = RootCertStore::empty();
    for cert in certs_from_pem(&credentials.ca_cert, "CA certificate")? {
        roots
            .add(cert)
            .map_err(|e| ConnectorError::certificate_invalid(format!("CA rejected: {e}")))?;
    }
    for pem in credentials.cert_chain.iter().skip(1) {
        for cert in certs_from_pem(pem, "intermediate certificate")? {
            roots.add(cert).map_err(|e| {
                ConnectorError::certificate_invalid(format!("intermediate rejected: {e}"))
            })?;
        }
    }

    let verifier = CaVerifier::new(Arc::new(roots), provider.clone())?;
    let key = private_key_der(&credentials.private_key)?;

    ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| {
            ConnectorError::tls_handshake(format!("failed to set protocol versions: {e}"))
        })?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(verifier))
        .with_client_auth_cert(identity, key)
        .map_err(|e| {
            ConnectorError::certificate_invalid(format!("client identity rejected: {e}"))
        })
}
