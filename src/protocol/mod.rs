//! Wire-level pieces of the opening handshake (RFC 6455 Section 4).

pub mod credential;
pub mod endpoint;
pub mod headers;
pub mod nonce;
pub mod request;

pub use credential::Credential;
pub use endpoint::{Endpoint, Scheme};
pub use headers::{HEADER_TERMINATOR, HeaderSet, ParsedResponse, PendingResponse};
pub use nonce::{NonceKey, OsRandom, RandomSource, WS_GUID, compute_accept_key};
pub use request::HandshakeRequest;
