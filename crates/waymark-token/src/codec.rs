//! URL-safe token text encoding.
//!
//! Token payloads and HMAC tags travel inside QR codes and URLs, so the
//! wire alphabet is base64url without padding (no `+`, `/`, or `=`).

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use thiserror::Error;

/// Failure to decode token text back into bytes.
#[derive(Debug, Error)]
#[error("invalid base64url input: {0}")]
pub struct DecodeError(#[from] base64::DecodeError);

/// Encode bytes as unpadded base64url text.
pub fn encode(bytes: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode unpadded base64url text back into bytes.
pub fn decode(text: &str) -> Result<Vec<u8>, DecodeError> {
    Ok(URL_SAFE_NO_PAD.decode(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_arbitrary_bytes() {
        let cases: &[&[u8]] = &[
            b"",
            b"a",
            b"waymark",
            &[0u8, 255, 128, 7, 63, 64],
            &[0xff; 33],
        ];
        for &case in cases {
            let encoded = encode(case);
            assert_eq!(decode(&encoded).unwrap(), case, "case {case:?}");
        }
    }

    #[test]
    fn output_is_url_safe() {
        let encoded = encode([0xfbu8; 48]);
        assert!(!encoded.contains('+'));
        assert!(!encoded.contains('/'));
        assert!(!encoded.contains('='));
    }

    #[test]
    fn rejects_invalid_alphabet() {
        assert!(decode("not base64!").is_err());
    }

    #[test]
    fn rejects_padded_input() {
        assert!(decode("YQ==").is_err());
    }
}
