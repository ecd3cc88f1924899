//! AlloyDB Admin API client.
//!
//! Two calls back the connector: resolving an instance's reachable address
//! and minting an ephemeral client certificate for a freshly generated
//! public key. Both are plain HTTPS with bearer-token authorization.
//!
//! There are no retries at this layer: a connect is a single bounded
//! transaction, and transient-failure policy belongs to the caller.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConnectorError, Result};
use crate::instance::InstanceUri;

/// Production Admin API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://alloydb.googleapis.com";

/// Default API version path segment.
pub const DEFAULT_API_VERSION: &str = "v1beta";

/// Requested client certificate lifetime (24 hours, the cap). The server
/// may issue a shorter one.
const CERT_DURATION: &str = "86400s";

/// How much of an error body is kept in error messages.
const BODY_EXCERPT_LEN: usize = 256;

/// The reachable network endpoint of an instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointInfo {
    /// IP address or PSC DNS name of the data plane.
    pub ip_address: String,
}

/// Client for the two Admin API calls the connector needs.
///
/// One instance owns a connection-pooling HTTP client and may be shared
/// across concurrent connects. The base URL and API version are
/// overridable so tests can point at a local fake.
#[derive(Clone)]
pub struct ControlPlaneClient {
    http: reqwest::Client,
    base_url: String,
    api_version: String,
}

impl ControlPlaneClient {
    /// Create a client against the production endpoint.
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| {
                ConnectorError::control_plane_transport(format!(
                    "failed to create HTTP client: {e}"
                ))
            })?;

        Ok(Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
        })
    }

    /// Override the base URL (builder pattern).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the API version segment (builder pattern).
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    /// Resolve the instance's reachable endpoint.
    ///
    /// Prefers the explicit IP address; falls back to the PSC DNS name.
    ///
    /// # Errors
    ///
    /// * [`ConnectorError::ControlPlane`] on non-2xx or transport failure
    /// * [`ConnectorError::NoEndpoint`] when neither address is populated
    /// * [`ConnectorError::DeadlineExceeded`] when `deadline` elapses
    pub async fn connection_info(
        &self,
        instance: &InstanceUri,
        token: Option<&str>,
        deadline: Duration,
    ) -> Result<EndpointInfo> {
        let url = format!(
            "{}/{}/{}/connectionInfo",
            self.base_url, self.api_version, instance
        );
        debug!("resolving endpoint via {}", url);

        let mut request = self.http.get(&url).timeout(deadline);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let body: ConnectionInfoResponse = check_response(request, "connectionInfo").await?;
        endpoint_from_response(instance, body)
    }

    /// Mint an ephemeral client certificate for `public_key_pem`.
    ///
    /// Returns the PEM certificate chain (leaf first) and the CA the
    /// server's own certificate will chain to.
    ///
    /// # Errors
    ///
    /// * [`ConnectorError::ControlPlane`] on non-2xx or transport failure
    /// * [`ConnectorError::CertificateInvalid`] when the response is
    ///   missing the chain or the CA
    /// * [`ConnectorError::DeadlineExceeded`] when `deadline` elapses
    pub async fn generate_client_certificate(
        &self,
        cluster_uri: &str,
        public_key_pem: &str,
        token: Option<&str>,
        deadline: Duration,
    ) -> Result<(Vec<String>, String)> {
        let url = format!(
            "{}/{}/{}:generateClientCertificate",
            self.base_url, self.api_version, cluster_uri
        );
        debug!("minting client certificate via {}", url);

        let mut request = self
            .http
            .post(&url)
            .timeout(deadline)
            .json(&GenerateCertificateRequest {
                public_key: public_key_pem,
                cert_duration: CERT_DURATION,
            });
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let body: GenerateCertificateResponse =
            check_response(request, "generateClientCertificate").await?;

        if body.pem_certificate_chain.is_empty() {
            return Err(ConnectorError::certificate_invalid(
                "certificate response carried no chain",
            ));
        }
        if body.ca_cert.trim().is_empty() {
            return Err(ConnectorError::certificate_invalid(
                "certificate response carried no CA",
            ));
        }

        Ok((body.pem_certificate_chain, body.ca_cert))
    }
}

/// Send a request and parse a 2xx JSON body, mapping every failure into
/// the taxonomy.
async fn check_response<T: serde::de::DeserializeOwned>(
    request: reqwest::RequestBuilder,
    what: &str,
) -> Result<T> {
    let response = request.send().await.map_err(|e| {
        if e.is_timeout() {
            ConnectorError::deadline(format!("control-plane {what} request"))
        } else {
            ConnectorError::control_plane_transport(e.to_string())
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ConnectorError::control_plane_status(
            status.as_u16(),
            excerpt(&body),
        ));
    }

    response.json::<T>().await.map_err(|e| {
        ConnectorError::control_plane_transport(format!("invalid {what} response body: {e}"))
    })
}

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.len() <= BODY_EXCERPT_LEN {
        trimmed.to_string()
    } else {
        let mut end = BODY_EXCERPT_LEN;
        while !trimmed.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &trimmed[..end])
    }
}

fn endpoint_from_response(
    instance: &InstanceUri,
    body: ConnectionInfoResponse,
) -> Result<EndpointInfo> {
    let address = [body.ip_address, body.psc_dns_name]
        .into_iter()
        .flatten()
        .find(|addr| !addr.is_empty());

    match address {
        Some(ip_address) => Ok(EndpointInfo { ip_address }),
        None => Err(ConnectorError::NoEndpoint(instance.to_string())),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ConnectionInfoResponse {
    ip_address: Option<String>,
    psc_dns_name: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateCertificateRequest<'a> {
    public_key: &'a str,
    cert_duration: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct GenerateCertificateResponse {
    pem_certificate_chain: Vec<String>,
    ca_cert: String,
}
