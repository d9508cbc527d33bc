//! Redemption error taxonomy.
//!
//! Every gate failure crosses the engine boundary as a typed value —
//! never as an opaque panic — and carries enough context for the caller
//! to present a corrective action.

use thiserror::Error;
use waymark_core::error::WaymarkError;
use waymark_core::models::tier::MembershipTier;
use waymark_token::TokenError;

/// Why an otherwise-resolvable beacon refused the scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InactiveReason {
    /// Owner has disabled the beacon.
    Disabled,
    /// `active_from` lies in the future.
    NotYetActive,
    /// `active_until` has passed.
    WindowClosed,
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("beacon not found: {code}")]
    NotFound { code: String },

    #[error("malformed token")]
    InvalidFormat,

    #[error("invalid token signature")]
    InvalidSignature,

    /// Token expired. The code comes from the verified payload, so the
    /// rejection can still name the beacon it was issued for.
    #[error("token expired for beacon {code}")]
    Expired { code: String },

    #[error("beacon is not currently scannable")]
    Inactive { reason: InactiveReason },

    #[error("beacon scan limit of {limit} reached")]
    ScanLimitReached { limit: u32 },

    #[error("monthly scan limit of {limit} reached ({used} used)")]
    RateLimitExceeded {
        limit: u32,
        used: u32,
        /// Lowest tier whose policy lifts the monthly cap, if any.
        suggested_tier: Option<MembershipTier>,
    },

    #[error("beacon requires the {} tier or higher", .required.as_str())]
    MembershipRequired { required: MembershipTier },

    #[error("caller is not authenticated")]
    Unauthorized,

    /// Store-level failure, including timeouts. The only retryable
    /// class; retried at most once and only on the resolve read.
    #[error("transient store failure: {detail}")]
    TransientStore { detail: String },

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<TokenError> for ScanError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::InvalidFormat => ScanError::InvalidFormat,
            TokenError::InvalidSignature => ScanError::InvalidSignature,
            TokenError::Expired(payload) => ScanError::Expired { code: payload.code },
            TokenError::Crypto(detail) => ScanError::Internal(detail),
        }
    }
}

impl From<WaymarkError> for ScanError {
    fn from(err: WaymarkError) -> Self {
        match err {
            WaymarkError::NotFound { id, .. } => ScanError::NotFound { code: id },
            WaymarkError::Database(detail) => ScanError::TransientStore { detail },
            other => ScanError::Internal(other.to_string()),
        }
    }
}
