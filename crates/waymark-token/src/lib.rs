//! Waymark Token — URL-safe codec, HMAC signing, and signed beacon
//! token issuance/verification.

pub mod codec;
pub mod config;
pub mod error;
pub mod signer;
pub mod token;

pub use codec::DecodeError;
pub use config::TokenConfig;
pub use error::TokenError;
pub use token::{SignedToken, TokenPayload, create_signed_token, parse_signed_token};
