//! Keyed signing and verification of token payload text.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::codec;
use crate::error::TokenError;

type HmacSha256 = Hmac<Sha256>;

fn keyed_mac(secret: &[u8]) -> Result<HmacSha256, TokenError> {
    HmacSha256::new_from_slice(secret).map_err(|e| TokenError::Crypto(format!("bad HMAC key: {e}")))
}

/// Compute the base64url-encoded HMAC-SHA-256 tag over `payload`.
pub fn sign(payload: &str, secret: &[u8]) -> Result<String, TokenError> {
    let mut mac = keyed_mac(secret)?;
    mac.update(payload.as_bytes());
    Ok(codec::encode(mac.finalize().into_bytes()))
}

/// Check `signature` against a recomputed tag over `payload`.
///
/// The tag comparison (`Mac::verify_slice`) runs in constant time —
/// timing-attack resistance is a correctness requirement here.
pub fn verify(payload: &str, signature: &str, secret: &[u8]) -> bool {
    let Ok(sig_bytes) = codec::decode(signature) else {
        return false;
    };
    let Ok(mut mac) = keyed_mac(secret) else {
        return false;
    };
    mac.update(payload.as_bytes());
    mac.verify_slice(&sig_bytes).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_then_verify() {
        let tag = sign("payload-text", b"secret").unwrap();
        assert!(verify("payload-text", &tag, b"secret"));
    }

    #[test]
    fn signing_is_deterministic() {
        let a = sign("same", b"key").unwrap();
        let b = sign("same", b"key").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn wrong_secret_fails() {
        let tag = sign("payload-text", b"secret").unwrap();
        assert!(!verify("payload-text", &tag, b"other-secret"));
    }

    #[test]
    fn altered_payload_fails() {
        let tag = sign("payload-text", b"secret").unwrap();
        assert!(!verify("payload-texT", &tag, b"secret"));
    }

    #[test]
    fn garbage_signature_fails() {
        assert!(!verify("payload-text", "!!not-base64!!", b"secret"));
        assert!(!verify("payload-text", "", b"secret"));
    }
}
