//! Metadata-exchange message encode/decode.
//!
//! Hand-rolled protobuf wire format for the two messages of the exchange.
//! Reference: <https://protobuf.dev/programming-guides/encoding/>

use std::fmt;

use crate::error::{ConnectorError, Result};

// Wire types
const WIRE_VARINT: u64 = 0;
const WIRE_FIXED64: u64 = 1;
const WIRE_LEN: u64 = 2;
const WIRE_FIXED32: u64 = 5;

/// Authentication mode declared in the exchange request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthType {
    /// No mode declared. Never sent by the connector.
    #[default]
    Unspecified,
    /// Database-native password authentication, performed by the
    /// downstream driver.
    DbNative,
    /// OAuth bearer-token authentication.
    Iam,
}

impl AuthType {
    fn from_raw(raw: u64) -> Self {
        match raw {
            1 => AuthType::DbNative,
            2 => AuthType::Iam,
            _ => AuthType::Unspecified,
        }
    }

    fn raw(self) -> u64 {
        match self {
            AuthType::Unspecified => 0,
            AuthType::DbNative => 1,
            AuthType::Iam => 2,
        }
    }
}

/// Server verdict in the exchange response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseCode {
    /// Absent or unrecognized code. Treated as a protocol error by the
    /// connector.
    #[default]
    Unspecified,
    /// The channel is authorized for PostgreSQL traffic.
    Ok,
    /// The server refused the exchange; see the error string.
    Error,
}

impl ResponseCode {
    fn from_raw(raw: u64) -> Self {
        match raw {
            1 => ResponseCode::Ok,
            2 => ResponseCode::Error,
            _ => ResponseCode::Unspecified,
        }
    }

    fn raw(self) -> u64 {
        match self {
            ResponseCode::Unspecified => 0,
            ResponseCode::Ok => 1,
            ResponseCode::Error => 2,
        }
    }
}

/// The request sent by the connector.
///
/// Fields: `user_agent` (1, string), `auth_type` (2, varint),
/// `oauth2_token` (3, string). Empty strings are omitted on the wire;
/// `auth_type` is always written.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct ExchangeRequest {
    /// Identifies the connector to the server.
    pub user_agent: String,
    /// Declared authentication mode.
    pub auth_type: AuthType,
    /// Bearer token for [`AuthType::Iam`]; empty otherwise.
    pub oauth2_token: String,
}

impl ExchangeRequest {
    /// Encode to protobuf wire bytes (unframed).
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(
            2 + self.user_agent.len() + 2 + 2 + self.oauth2_token.len() + 2,
        );
        put_string(&mut out, 1, &self.user_agent);
        put_varint_field(&mut out, 2, self.auth_type.raw());
        put_string(&mut out, 3, &self.oauth2_token);
        out
    }

    /// Decode from protobuf wire bytes (unframed).
    ///
    /// Unknown fields are skipped; duplicate fields take the last value.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let mut message = ExchangeRequest::default();
        let mut pos = 0;
        while pos < buf.len() {
            let (field, wire) = get_tag(buf, &mut pos)?;
            match (field, wire) {
                (1, WIRE_LEN) => message.user_agent = get_string(buf, &mut pos)?,
                (2, WIRE_VARINT) => {
                    message.auth_type = AuthType::from_raw(get_varint(buf, &mut pos)?);
                }
                (3, WIRE_LEN) => message.oauth2_token = get_string(buf, &mut pos)?,
                (_, wire) => skip_field(buf, &mut pos, wire)?,
            }
        }
        Ok(message)
    }
}

impl fmt::Debug for ExchangeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExchangeRequest")
            .field("user_agent", &self.user_agent)
            .field("auth_type", &self.auth_type)
            .field(
                "oauth2_token",
                if self.oauth2_token.is_empty() {
                    &""
                } else {
                    &"[REDACTED]"
                },
            )
            .finish()
    }
}

/// The response sent by the server.
///
/// Fields: `response_code` (1, varint), `error` (2, string). A missing
/// `response_code` decodes as [`ResponseCode::Unspecified`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExchangeResponse {
    /// Server verdict.
    pub response_code: ResponseCode,
    /// Error message when the verdict is [`ResponseCode::Error`].
    pub error: String,
}

impl ExchangeResponse {
    /// Encode to protobuf wire bytes (unframed).
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(2 + 2 + self.error.len());
        put_varint_field(&mut out, 1, self.response_code.raw());
        put_string(&mut out, 2, &self.error);
        out
    }

    /// Decode from protobuf wire bytes (unframed).
    ///
    /// Unknown fields are skipped; duplicate fields take the last value.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let mut message = ExchangeResponse::default();
        let mut pos = 0;
        while pos < buf.len() {
            let (field, wire) = get_tag(buf, &mut pos)?;
            match (field, wire) {
                (1, WIRE_VARINT) => {
                    message.response_code = ResponseCode::from_raw(get_varint(buf, &mut pos)?);
                }
                (2, WIRE_LEN) => message.error = get_string(buf, &mut pos)?,
                (_, wire) => skip_field(buf, &mut pos, wire)?,
            }
        }
        Ok(message)
    }
}

// ============================================================================
// Wire helpers
// ============================================================================

fn put_varint(out: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

fn put_varint_field(out: &mut Vec<u8>, field: u64, value: u64) {
    put_varint(out, field << 3 | WIRE_VARINT);
    put_varint(out, value);
}

/// Write a length-delimited string field, omitting it entirely when empty.
fn put_string(out: &mut Vec<u8>, field: u64, value: &str) {
    if value.is_empty() {
        return;
    }
    put_varint(out, field << 3 | WIRE_LEN);
    put_varint(out, value.len() as u64);
    out.extend_from_slice(value.as_bytes());
}

fn get_varint(buf: &[u8], pos: &mut usize) -> Result<u64> {
    let mut value: u64 = 0;
    let mut shift: u32 = 0;
    loop {
        let byte = *buf
            .get(*pos)
            .ok_or_else(|| ConnectorError::metadata_protocol("truncated varint"))?;
        *pos += 1;
        if shift >= 64 {
            return Err(ConnectorError::metadata_protocol("varint exceeds 64 bits"));
        }
        value |= u64::from(byte & 0x7f) << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
        shift += 7;
    }
}

fn get_tag(buf: &[u8], pos: &mut usize) -> Result<(u64, u64)> {
    let tag = get_varint(buf, pos)?;
    Ok((tag >> 3, tag & 0x7))
}

fn get_bytes<'a>(buf: &'a [u8], pos: &mut usize) -> Result<&'a [u8]> {
    let len = get_varint(buf, pos)? as usize;
    let end = pos
        .checked_add(len)
        .filter(|&end| end <= buf.len())
        .ok_or_else(|| ConnectorError::metadata_protocol("truncated length-delimited field"))?;
    let bytes = &buf[*pos..end];
    *pos = end;
    Ok(bytes)
}

fn get_string(buf: &[u8], pos: &mut usize) -> Result<String> {
    let bytes = get_bytes(buf, pos)?;
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|_| ConnectorError::metadata_protocol("invalid UTF-8 in string field"))
}

/// Skip an unknown field. Wire types 0 and 2 are skipped by their own
/// length information; the unused fixed-width types 1 and 5 must still be
/// skippable; anything else is malformed.
fn skip_field(buf: &[u8], pos: &mut usize, wire: u64) -> Result<()> {
    match wire {
        WIRE_VARINT => {
            get_varint(buf, pos)?;
        }
        WIRE_LEN => {
            get_bytes(buf, pos)?;
        }
        WIRE_FIXED64 => skip_fixed(buf, pos, 8)?,
        WIRE_FIXED32 => skip_fixed(buf, pos, 4)?,
        other => {
            return Err(ConnectorError::metadata_protocol(format!(
                "unsupported wire type {other}"
            )));
        }
    }
    Ok(())
}

fn skip_fixed(buf: &[u8], pos: &mut usize, width: usize) -> Result<()> {
    let end = pos
        .checked_add(width)
        .filter(|&end| end <= buf.len())
        .ok_or_else(|| ConnectorError::metadata_protocol("truncated fixed-width field"))?;
    *pos = end;
    Ok(())
}
