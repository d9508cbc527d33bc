//! Token error types.

use thiserror::Error;

use crate::token::TokenPayload;

#[derive(Debug, Error)]
pub enum TokenError {
    /// Not a well-formed composite token: wrong segment count, bad
    /// encoding, or an undecodable payload.
    #[error("malformed token")]
    InvalidFormat,

    /// Signature does not match under any accepted secret.
    #[error("invalid token signature")]
    InvalidSignature,

    /// Signature was valid but `exp` has passed. The parsed payload is
    /// carried for diagnostics; an expired token grants nothing.
    #[error("token expired")]
    Expired(Box<TokenPayload>),

    #[error("cryptography error: {0}")]
    Crypto(String),
}
