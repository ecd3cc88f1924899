//! Error types for alloydb-connector

use thiserror::Error;

/// Main error type for the connector.
///
/// Every step of a connect surfaces its own category; the connector never
/// collapses one category into another, so callers can act on the variant
/// alone. Bearer tokens and private key material never appear in error
/// payloads.
#[derive(Error, Debug)]
pub enum ConnectorError {
    /// Missing or contradictory connect options
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The token provider failed to produce a bearer token
    #[error("Token unavailable: {0}")]
    TokenUnavailable(String),

    /// Control-plane HTTPS call failed (non-2xx status or transport error)
    #[error("Control plane error{}: {message}", fmt_status(.status))]
    ControlPlane {
        /// HTTP status code, if a response was received
        status: Option<u16>,
        /// Body excerpt or transport error description
        message: String,
    },

    /// Certificate response missing chain/CA, or PEM material is malformed
    #[error("Certificate invalid: {0}")]
    CertificateInvalid(String),

    /// The connectionInfo response carried no usable address
    #[error("No reachable endpoint for {0}")]
    NoEndpoint(String),

    /// TCP dial to the data-plane proxy port failed
    #[error("Failed to dial {addr}: {reason}")]
    Dial {
        /// The address that was dialed
        addr: String,
        /// Reason for the failure
        reason: String,
    },

    /// TLS negotiation with the instance failed
    #[error("TLS handshake failed: {0}")]
    TlsHandshake(String),

    /// Metadata-exchange frame malformed, truncated, oversize, or the
    /// server returned an unknown response code
    #[error("Metadata exchange protocol error: {0}")]
    MetadataProtocol(String),

    /// The server rejected the metadata exchange with an error message
    #[error("Metadata exchange rejected: {0}")]
    MetadataRejected(String),

    /// The caller cancelled the connect
    #[error("Connect cancelled")]
    Cancelled,

    /// The per-I/O deadline elapsed
    #[error("Deadline exceeded during {0}")]
    DeadlineExceeded(String),
}

/// Result type alias for ConnectorError
pub type Result<T> = std::result::Result<T, ConnectorError>;

fn fmt_status(status: &Option<u16>) -> String {
    match status {
        Some(status) => format!(" (HTTP {status})"),
        None => String::new(),
    }
}

impl ConnectorError {
    /// Create an invalid-configuration error
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        ConnectorError::InvalidConfig(reason.into())
    }

    /// Create a token-unavailable error
    pub fn token_unavailable(reason: impl Into<String>) -> Self {
        ConnectorError::TokenUnavailable(reason.into())
    }

    /// Create a control-plane error from an HTTP status and body excerpt
    pub fn control_plane_status(status: u16, body: impl Into<String>) -> Self {
        ConnectorError::ControlPlane {
            status: Some(status),
            message: body.into(),
        }
    }

    /// Create a control-plane error for a transport-level failure
    pub fn control_plane_transport(reason: impl Into<String>) -> Self {
        ConnectorError::ControlPlane {
            status: None,
            message: reason.into(),
        }
    }

    /// Create a certificate-invalid error
    pub fn certificate_invalid(reason: impl Into<String>) -> Self {
        ConnectorError::CertificateInvalid(reason.into())
    }

    /// Create a dial error
    pub fn dial(addr: impl Into<String>, reason: impl Into<String>) -> Self {
        ConnectorError::Dial {
            addr: addr.into(),
            reason: reason.into(),
        }
    }

    /// Create a TLS handshake error
    pub fn tls_handshake(reason: impl Into<String>) -> Self {
        ConnectorError::TlsHandshake(reason.into())
    }

    /// Create a metadata-exchange protocol error
    pub fn metadata_protocol(reason: impl Into<String>) -> Self {
        ConnectorError::MetadataProtocol(reason.into())
    }

    /// Create a deadline-exceeded error naming the step that timed out
    pub fn deadline(step: impl Into<String>) -> Self {
        ConnectorError::DeadlineExceeded(step.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_plane_status_display() {
        let err = ConnectorError::control_plane_status(403, "permission denied on instance");
        let msg = err.to_string();
        assert!(msg.contains("403"));
        assert!(msg.contains("permission denied"));
    }

    #[test]
    fn test_control_plane_transport_display() {
        let err = ConnectorError::control_plane_transport("connection refused");
        let msg = err.to_string();
        assert!(!msg.contains("HTTP"));
        assert!(msg.contains("connection refused"));
    }

    #[test]
    fn test_dial_error_display() {
        let err = ConnectorError::dial("10.0.0.2:5433", "connection timed out");
        let msg = err.to_string();
        assert!(msg.contains("10.0.0.2:5433"));
        assert!(msg.contains("connection timed out"));
    }

    #[test]
    fn test_deadline_names_step() {
        let err = ConnectorError::deadline("tls handshake");
        assert_eq!(err.to_string(), "Deadline exceeded during tls handshake");
    }

    #[test]
    fn test_cancelled_display() {
        assert_eq!(ConnectorError::Cancelled.to_string(), "Connect cancelled");
    }
}
