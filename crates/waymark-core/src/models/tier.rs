//! Membership tier model.

use serde::{Deserialize, Serialize};

/// Membership tiers, ordered lowest to highest.
///
/// The derived `Ord` is load-bearing: beacon gating compares the
/// scanner's tier against `required_tier`, and quota upgrade hints pick
/// the next tier upward whose policy lifts the monthly cap.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum MembershipTier {
    Free,
    Member,
    Plus,
    Pro,
}

impl MembershipTier {
    /// All tiers in ascending order.
    pub const ALL: [MembershipTier; 4] = [
        MembershipTier::Free,
        MembershipTier::Member,
        MembershipTier::Plus,
        MembershipTier::Pro,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipTier::Free => "free",
            MembershipTier::Member => "member",
            MembershipTier::Plus => "plus",
            MembershipTier::Pro => "pro",
        }
    }
}
