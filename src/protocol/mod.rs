//! Metadata-exchange wire protocol.
//!
//! Before any PostgreSQL bytes flow, the data-plane proxy port expects one
//! length-framed request/response pair over the freshly established TLS
//! channel:
//!
//! ```text
//! C -> S : uint32_be(N) || <N bytes of ExchangeRequest>
//! S -> C : uint32_be(M) || <M bytes of ExchangeResponse>
//! ```
//!
//! The two messages use the standard protobuf tag-wire encoding, written by
//! hand in [`messages`]: the message set is tiny and frozen, so carrying a
//! protobuf runtime for it would be all surface and no savings. [`codec`]
//! provides the frame layer.

pub mod codec;
pub mod messages;

pub use codec::{read_frame, write_frame, MAX_FRAME_LEN};
pub use messages::{AuthType, ExchangeRequest, ExchangeResponse, ResponseCode};
