//! Shared test infrastructure: a throwaway CA, a fake data-plane server
//! speaking the metadata exchange over mTLS, and a fake control plane
//! speaking just enough HTTP/1.1 for the two Admin API calls.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use rcgen::{
    BasicConstraints, CertificateParams, DistinguishedName, DnType, IsCa, KeyPair, SanType,
    SubjectPublicKeyInfo,
};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use rustls::server::WebPkiClientVerifier;
use rustls::{RootCertStore, ServerConfig};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_rustls::TlsAcceptor;

use alloydb_connector::protocol::{ExchangeRequest, ExchangeResponse, ResponseCode};

/// A self-signed CA standing in for the control plane's issuing authority.
///
/// Signs the fake server's certificate and mints client leaves for public
/// keys submitted to the fake control plane, mirroring what the real
/// certificate API does.
pub struct TestCa {
    key: KeyPair,
    cert: rcgen::Certificate,
}

impl TestCa {
    pub fn new() -> Self {
        let key = KeyPair::generate().unwrap();
        let mut params = CertificateParams::default();
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        let mut dn = DistinguishedName::new();
        dn.push(DnType::CommonName, "connector test CA");
        params.distinguished_name = dn;
        let cert = params.self_signed(&key).unwrap();
        Self { key, cert }
    }

    pub fn ca_pem(&self) -> String {
        self.cert.pem()
    }

    /// Server identity presenting an internal name, not the dialed address.
    /// The connector must still accept it (chain-only verification).
    pub fn server_identity(&self) -> (Vec<CertificateDer<'static>>, PrivateKeyDer<'static>) {
        let key = KeyPair::generate().unwrap();
        let mut params = CertificateParams::default();
        let mut dn = DistinguishedName::new();
        dn.push(DnType::CommonName, "instance-uid-1234");
        params.distinguished_name = dn;
        params
            .subject_alt_names
            .push(SanType::DnsName("internal.alloydb.invalid".try_into().unwrap()));
        let cert = params.signed_by(&key, &self.cert, &self.key).unwrap();
        (
            vec![cert.der().clone()],
            PrivateKeyDer::from(PrivatePkcs8KeyDer::from(key.serialize_der())),
        )
    }

    /// Mint a client leaf for a submitted SubjectPublicKeyInfo PEM.
    pub fn mint_client_cert(&self, public_key_pem: &str) -> String {
        let spki = SubjectPublicKeyInfo::from_pem(public_key_pem).unwrap();
        let mut params = CertificateParams::default();
        let mut dn = DistinguishedName::new();
        dn.push(DnType::CommonName, "ephemeral client");
        params.distinguished_name = dn;
        params.signed_by(&spki, &self.cert, &self.key).unwrap().pem()
    }

    pub fn root_store(&self) -> RootCertStore {
        let mut roots = RootCertStore::empty();
        roots.add(self.cert.der().clone()).unwrap();
        roots
    }
}

/// What the fake data-plane server does after reading the request frame.
pub enum ServerScript {
    /// Accept the exchange, then write `trailing` as the first
    /// "PostgreSQL" bytes.
    RespondOk { trailing: Vec<u8> },
    /// Reject the exchange with an error message.
    RespondError(String),
    /// Announce an absurd frame length and stop.
    OversizeHeader,
    /// Announce a 10-byte frame but send only 7 bytes, then close.
    TruncatedFrame,
}

/// What the fake data-plane server observed.
pub struct DataPlaneResult {
    /// The decoded exchange request, if it parsed.
    pub request: Option<ExchangeRequest>,
    /// Whether the client side closed the connection afterwards.
    pub client_closed: bool,
}

fn server_tls_acceptor(ca: &TestCa) -> TlsAcceptor {
    let (certs, key) = ca.server_identity();
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let verifier =
        WebPkiClientVerifier::builder_with_provider(Arc::new(ca.root_store()), provider.clone())
            .build()
            .unwrap();
    let config = ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .unwrap()
        .with_client_cert_verifier(verifier)
        .with_single_cert(certs, key)
        .unwrap();
    TlsAcceptor::from(Arc::new(config))
}

/// Start a one-connection fake data-plane server. Requires a client
/// certificate chaining to `ca`, reads the request frame, then follows
/// `script`.
pub async fn spawn_data_plane(
    ca: Arc<TestCa>,
    script: ServerScript,
) -> (SocketAddr, JoinHandle<DataPlaneResult>) {
    let acceptor = server_tls_acceptor(&ca);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let mut stream = acceptor.accept(tcp).await.unwrap();

        let mut len_buf = [0u8; 4];
        stream.read_exact(&mut len_buf).await.unwrap();
        let len = u32::from_be_bytes(len_buf) as usize;
        let mut payload = vec![0u8; len];
        stream.read_exact(&mut payload).await.unwrap();
        let request = ExchangeRequest::decode(&payload).ok();

        match script {
            ServerScript::RespondOk { trailing } => {
                let body = ExchangeResponse {
                    response_code: ResponseCode::Ok,
                    error: String::new(),
                }
                .encode();
                stream
                    .write_all(&(body.len() as u32).to_be_bytes())
                    .await
                    .unwrap();
                stream.write_all(&body).await.unwrap();
                if !trailing.is_empty() {
                    stream.write_all(&trailing).await.unwrap();
                }
                stream.flush().await.unwrap();
            }
            ServerScript::RespondError(message) => {
                let body = ExchangeResponse {
                    response_code: ResponseCode::Error,
                    error: message,
                }
                .encode();
                stream
                    .write_all(&(body.len() as u32).to_be_bytes())
                    .await
                    .unwrap();
                stream.write_all(&body).await.unwrap();
                stream.flush().await.unwrap();
            }
            ServerScript::OversizeHeader => {
                stream
                    .write_all(&20_000_001u32.to_be_bytes())
                    .await
                    .unwrap();
                stream.flush().await.unwrap();
            }
            ServerScript::TruncatedFrame => {
                stream.write_all(&10u32.to_be_bytes()).await.unwrap();
                stream.write_all(&[0u8; 7]).await.unwrap();
                stream.flush().await.unwrap();
                return DataPlaneResult {
                    request,
                    client_closed: true,
                };
            }
        }

        let mut sink = [0u8; 16];
        let client_closed = matches!(stream.read(&mut sink).await, Ok(0) | Err(_));
        DataPlaneResult {
            request,
            client_closed,
        }
    });

    (addr, handle)
}

/// Behavior knobs for the fake control plane.
#[derive(Clone)]
pub struct ControlPlaneConfig {
    pub ip_address: Option<String>,
    pub psc_dns_name: Option<String>,
    pub connection_info_status: u16,
    pub cert_status: u16,
    pub error_body: String,
    /// Accept connections but never answer.
    pub hang: bool,
}

impl Default for ControlPlaneConfig {
    fn default() -> Self {
        Self {
            ip_address: Some("127.0.0.1".to_string()),
            psc_dns_name: None,
            connection_info_status: 200,
            cert_status: 200,
            error_body: String::new(),
            hang: false,
        }
    }
}

/// A running fake control plane. Aborts its accept loop on drop.
pub struct FakeControlPlane {
    pub base_url: String,
    handle: JoinHandle<()>,
}

impl Drop for FakeControlPlane {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub async fn spawn_control_plane(ca: Arc<TestCa>, config: ControlPlaneConfig) -> FakeControlPlane {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            let ca = Arc::clone(&ca);
            let config = config.clone();
            tokio::spawn(async move {
                serve_one(&mut stream, &ca, &config).await;
            });
        }
    });

    FakeControlPlane {
        base_url: format!("http://{addr}"),
        handle,
    }
}

async fn serve_one(stream: &mut TcpStream, ca: &TestCa, config: &ControlPlaneConfig) {
    if config.hang {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        return;
    }

    let mut buf = Vec::new();
    let mut tmp = [0u8; 1024];
    let head_end = loop {
        let Ok(n) = stream.read(&mut tmp).await else {
            return;
        };
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&tmp[..n]);
        if let Some(pos) = find_subslice(&buf, b"\r\n\r\n") {
            break pos + 4;
        }
        if buf.len() > 64 * 1024 {
            return;
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let mut lines = head.lines();
    let request_line = lines.next().unwrap_or_default().to_string();
    let mut content_length = 0usize;
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap_or(0);
            }
        }
    }

    let mut body = buf[head_end..].to_vec();
    while body.len() < content_length {
        let Ok(n) = stream.read(&mut tmp).await else {
            return;
        };
        if n == 0 {
            break;
        }
        body.extend_from_slice(&tmp[..n]);
    }

    let (status, response_body) = route(&request_line, &body, ca, config);
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reason_phrase(status),
        response_body.len(),
        response_body
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.flush().await;
}

fn route(
    request_line: &str,
    body: &[u8],
    ca: &TestCa,
    config: &ControlPlaneConfig,
) -> (u16, String) {
    if request_line.starts_with("GET ") && request_line.contains("/connectionInfo") {
        if config.connection_info_status != 200 {
            return (config.connection_info_status, config.error_body.clone());
        }
        let mut info = serde_json::Map::new();
        if let Some(ip) = &config.ip_address {
            info.insert("ipAddress".to_string(), serde_json::json!(ip));
        }
        if let Some(dns) = &config.psc_dns_name {
            info.insert("pscDnsName".to_string(), serde_json::json!(dns));
        }
        return (200, serde_json::Value::Object(info).to_string());
    }

    if request_line.starts_with("POST ") && request_line.contains(":generateClientCertificate") {
        if config.cert_status != 200 {
            return (config.cert_status, config.error_body.clone());
        }
        let Ok(request) = serde_json::from_slice::<serde_json::Value>(body) else {
            return (400, r#"{"error": "malformed body"}"#.to_string());
        };
        if request["certDuration"] != "86400s" {
            return (400, r#"{"error": "unexpected certDuration"}"#.to_string());
        }
        let Some(public_key) = request["publicKey"].as_str() else {
            return (400, r#"{"error": "missing publicKey"}"#.to_string());
        };
        let leaf = ca.mint_client_cert(public_key);
        return (
            200,
            serde_json::json!({
                "pemCertificateChain": [leaf],
                "caCert": ca.ca_pem(),
            })
            .to_string(),
        );
    }

    (404, r#"{"error": "no such resource"}"#.to_string())
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Status",
    }
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
