//! Signed beacon token issuance and parsing.
//!
//! Wire format: `base64url(payload JSON) + "." + base64url(hmac tag)`,
//! exactly two segments. Validity is purely signature + expiry; there is
//! no server-side revocation list. The nonce keeps the door open for a
//! consumed-token registry without a wire-format change.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use waymark_core::models::beacon::BeaconKind;

use crate::codec;
use crate::config::TokenConfig;
use crate::error::TokenError;
use crate::signer;

const NONCE_BYTES: usize = 16;

/// Claims carried by a signed beacon token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPayload {
    /// Beacon code this token redeems against.
    pub code: String,
    /// Random salt so two tokens for the same beacon never share an
    /// encoded payload.
    pub nonce: String,
    /// Expiry, Unix seconds. Compared strictly — no skew tolerance.
    pub exp: i64,
    /// Optional routing sub-type (e.g. person, resale). Takes precedence
    /// over the beacon's own kind when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<BeaconKind>,
}

impl TokenPayload {
    /// Build a payload expiring `ttl_secs` from now.
    pub fn new(code: impl Into<String>, kind: Option<BeaconKind>, ttl_secs: u64) -> Self {
        Self {
            code: code.into(),
            nonce: generate_nonce(),
            exp: Utc::now().timestamp() + ttl_secs as i64,
            kind,
        }
    }
}

/// A freshly issued token: the two encoded segments plus the composite
/// string handed to clients.
#[derive(Debug, Clone)]
pub struct SignedToken {
    pub payload: String,
    pub signature: String,
    pub composite: String,
}

/// Generate a cryptographically random nonce
/// (16 bytes → base64url-encoded, no padding).
pub fn generate_nonce() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; NONCE_BYTES] = rand::Rng::random(&mut rng);
    codec::encode(bytes)
}

/// Serialize, encode, and sign a payload with the current signing
/// secret.
pub fn create_signed_token(
    payload: &TokenPayload,
    config: &TokenConfig,
) -> Result<SignedToken, TokenError> {
    let json = serde_json::to_string(payload)
        .map_err(|e| TokenError::Crypto(format!("payload serialize: {e}")))?;
    let encoded = codec::encode(json.as_bytes());
    let signature = signer::sign(&encoded, config.signing_secret().as_bytes())?;
    let composite = format!("{encoded}.{signature}");
    Ok(SignedToken {
        payload: encoded,
        signature,
        composite,
    })
}

/// Parse and verify a composite token.
///
/// Checks run in order: segment count, signature (against every accepted
/// secret), payload decode, expiry. `exp` must be strictly greater than
/// the current Unix second.
pub fn parse_signed_token(
    composite: &str,
    config: &TokenConfig,
) -> Result<TokenPayload, TokenError> {
    let mut parts = composite.split('.');
    let (Some(payload), Some(signature), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(TokenError::InvalidFormat);
    };
    if payload.is_empty() || signature.is_empty() {
        return Err(TokenError::InvalidFormat);
    }

    let verified = config
        .secrets()
        .iter()
        .any(|secret| signer::verify(payload, signature, secret.as_bytes()));
    if !verified {
        return Err(TokenError::InvalidSignature);
    }

    let bytes = codec::decode(payload).map_err(|_| TokenError::InvalidFormat)?;
    let claims: TokenPayload =
        serde_json::from_slice(&bytes).map_err(|_| TokenError::InvalidFormat)?;

    if claims.exp <= Utc::now().timestamp() {
        return Err(TokenError::Expired(Box::new(claims)));
    }

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> TokenConfig {
        TokenConfig::new("waymark-test-secret")
    }

    #[test]
    fn token_roundtrip() {
        let config = test_config();
        let payload = TokenPayload::new("plaza01", Some(BeaconKind::Person), 60);

        let token = create_signed_token(&payload, &config).unwrap();
        assert_eq!(
            token.composite,
            format!("{}.{}", token.payload, token.signature)
        );

        let parsed = parse_signed_token(&token.composite, &config).unwrap();
        assert_eq!(parsed, payload);
    }

    #[test]
    fn nonce_makes_payloads_distinct() {
        let a = TokenPayload::new("plaza01", None, 60);
        let b = TokenPayload::new("plaza01", None, 60);
        assert_ne!(a.nonce, b.nonce);
        // 16 bytes → 22 base64url chars.
        assert_eq!(a.nonce.len(), 22);
    }

    #[test]
    fn expired_token_surfaces_payload() {
        let config = test_config();
        let payload = TokenPayload {
            code: "plaza01".into(),
            nonce: generate_nonce(),
            exp: Utc::now().timestamp() - 1,
            kind: None,
        };
        let token = create_signed_token(&payload, &config).unwrap();

        match parse_signed_token(&token.composite, &config) {
            Err(TokenError::Expired(claims)) => assert_eq!(claims.code, "plaza01"),
            other => panic!("expected Expired, got {other:?}"),
        }
    }

    #[test]
    fn exp_one_second_ahead_is_accepted() {
        let config = test_config();
        let payload = TokenPayload {
            code: "plaza01".into(),
            nonce: generate_nonce(),
            exp: Utc::now().timestamp() + 1,
            kind: None,
        };
        let token = create_signed_token(&payload, &config).unwrap();
        assert!(parse_signed_token(&token.composite, &config).is_ok());
    }

    #[test]
    fn tampering_any_position_fails() {
        let config = test_config();
        let payload = TokenPayload::new("plaza01", None, 60);
        let token = create_signed_token(&payload, &config).unwrap();

        let composite: Vec<char> = token.composite.chars().collect();
        for (i, &c) in composite.iter().enumerate() {
            if c == '.' {
                continue;
            }
            let replacement = if c == 'A' { 'B' } else { 'A' };
            let mut tampered = composite.clone();
            tampered[i] = replacement;
            let tampered: String = tampered.into_iter().collect();
            assert!(
                parse_signed_token(&tampered, &config).is_err(),
                "tampered position {i} was accepted"
            );
        }
    }

    #[test]
    fn segment_count_is_enforced() {
        let config = test_config();
        let payload = TokenPayload::new("plaza01", None, 60);
        let token = create_signed_token(&payload, &config).unwrap();

        for mangled in [
            token.payload.clone(),
            format!("{}.{}.extra", token.payload, token.signature),
            format!(".{}", token.signature),
            format!("{}.", token.payload),
            String::new(),
        ] {
            match parse_signed_token(&mangled, &config) {
                Err(TokenError::InvalidFormat) => {}
                other => panic!("expected InvalidFormat for {mangled:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let config = test_config();
        let other = TokenConfig::new("some-other-secret");
        let payload = TokenPayload::new("plaza01", None, 60);
        let token = create_signed_token(&payload, &other).unwrap();

        match parse_signed_token(&token.composite, &config) {
            Err(TokenError::InvalidSignature) => {}
            other => panic!("expected InvalidSignature, got {other:?}"),
        }
    }

    #[test]
    fn rotated_secret_still_verifies() {
        let old = TokenConfig::new("old-secret");
        let payload = TokenPayload::new("plaza01", None, 60);
        let token = create_signed_token(&payload, &old).unwrap();

        let rotated = TokenConfig::new("new-secret").with_previous("old-secret");
        assert!(parse_signed_token(&token.composite, &rotated).is_ok());

        let dropped = TokenConfig::new("new-secret");
        assert!(matches!(
            parse_signed_token(&token.composite, &dropped),
            Err(TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn kind_is_omitted_from_json_when_absent() {
        let payload = TokenPayload {
            code: "plaza01".into(),
            nonce: "n".into(),
            exp: 1,
            kind: None,
        };
        let json = serde_json::to_string(&payload).unwrap();
        assert!(!json.contains("kind"));
    }
}
