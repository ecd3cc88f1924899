//! Ephemeral key material.
//!
//! Every connect generates a fresh RSA key pair, submits the public half to
//! the control plane, and receives back a short-lived certificate chain.
//! Nothing here outlives the connect that created it.

use std::fmt;

use rsa::pkcs8::{EncodePublicKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;

use crate::error::{ConnectorError, Result};

/// RSA modulus size required by the control plane.
pub const RSA_KEY_BITS: usize = 2048;

/// Generate an RSA-2048 key pair (public exponent 65537).
///
/// Returns the private key and the public key as a PEM-encoded
/// SubjectPublicKeyInfo, the form the certificate-minting API accepts.
pub fn generate_key_pair() -> Result<(RsaPrivateKey, String)> {
    let mut rng = rand::thread_rng();
    let private_key = RsaPrivateKey::new(&mut rng, RSA_KEY_BITS).map_err(|e| {
        ConnectorError::certificate_invalid(format!("RSA key generation failed: {e}"))
    })?;

    let public_key_pem = private_key
        .to_public_key()
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| {
            ConnectorError::certificate_invalid(format!("public key PEM encoding failed: {e}"))
        })?;

    Ok((private_key, public_key_pem))
}

/// Key material for one mTLS handshake.
///
/// `cert_chain[0]` is the leaf client certificate binding the public half
/// of `private_key`; the remainder are intermediates. `ca_cert` is the root
/// the server's certificate must chain to. The private key zeroizes on
/// drop.
pub struct EphemeralCredentials {
    /// Freshly generated RSA private key.
    pub private_key: RsaPrivateKey,
    /// PEM-encoded certificates, leaf first.
    pub cert_chain: Vec<String>,
    /// PEM-encoded CA used to verify the server.
    pub ca_cert: String,
}

impl EphemeralCredentials {
    /// Validate the shape of the minted material.
    pub fn validate(&self) -> Result<()> {
        if self.cert_chain.is_empty() {
            return Err(ConnectorError::certificate_invalid(
                "certificate chain is empty",
            ));
        }
        if self.ca_cert.trim().is_empty() {
            return Err(ConnectorError::certificate_invalid("CA certificate is empty"));
        }
        Ok(())
    }

    /// Modulus bit length of the private key.
    pub fn key_bits(&self) -> usize {
        self.private_key.n().bits()
    }
}

impl fmt::Debug for EphemeralCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EphemeralCredentials")
            .field("private_key", &"[REDACTED]")
            .field("cert_chain_len", &self.cert_chain.len())
            .field("ca_cert_len", &self.ca_cert.len())
            .finish()
    }
}
