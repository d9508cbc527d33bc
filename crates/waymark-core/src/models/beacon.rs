//! Beacon domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::tier::MembershipTier;

/// Beacon lifecycle status. Transitions are owner-controlled; the
/// redemption engine only reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BeaconStatus {
    Active,
    Inactive,
}

/// Beacon category. A closed set: post-scan routing matches on this
/// exhaustively, so adding a kind without a route fails to compile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BeaconKind {
    Standard,
    Event,
    Product,
    Person,
    Resale,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Beacon {
    pub id: Uuid,
    /// Normalized (trimmed, ASCII-lowercased) scan code. Unique.
    pub code: String,
    pub kind: BeaconKind,
    pub status: BeaconStatus,
    pub owner_id: Uuid,
    /// Base XP granted per scan, before multipliers.
    pub xp_reward: u32,
    /// Beacon-level bonus factor applied to `xp_reward`. Non-negative.
    pub xp_bonus_multiplier: f64,
    /// Lifetime cap on successful scans. `None` = uncapped.
    pub scan_limit: Option<u32>,
    pub scan_count: u32,
    pub active_from: Option<DateTime<Utc>>,
    pub active_until: Option<DateTime<Utc>>,
    /// Minimum membership tier required to scan. `None` = ungated.
    pub required_tier: Option<MembershipTier>,
    pub last_scanned_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Beacon {
    /// Scans left before the lifetime cap, if one is set.
    pub fn remaining_scans(&self) -> Option<u32> {
        self.scan_limit
            .map(|limit| limit.saturating_sub(self.scan_count))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBeacon {
    pub code: String,
    pub kind: BeaconKind,
    pub owner_id: Uuid,
    pub xp_reward: u32,
    pub xp_bonus_multiplier: f64,
    pub scan_limit: Option<u32>,
    pub active_from: Option<DateTime<Utc>>,
    pub active_until: Option<DateTime<Utc>>,
    pub required_tier: Option<MembershipTier>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateBeacon {
    pub kind: Option<BeaconKind>,
    pub status: Option<BeaconStatus>,
    pub xp_reward: Option<u32>,
    pub xp_bonus_multiplier: Option<f64>,
    /// `Some(Some(v))` = set, `Some(None)` = clear, `None` = no change.
    pub scan_limit: Option<Option<u32>>,
    pub active_from: Option<Option<DateTime<Utc>>>,
    pub active_until: Option<Option<DateTime<Utc>>>,
    pub required_tier: Option<Option<MembershipTier>>,
}

/// Normalize a beacon code for storage and lookup. Codes are
/// case-insensitive and surrounding whitespace is ignored.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_lowercases_and_trims() {
        assert_eq!(normalize_code("  SUMMER-Fest "), "summer-fest");
        assert_eq!(normalize_code("plaza01"), "plaza01");
    }

    #[test]
    fn remaining_scans_saturates_at_zero() {
        let mut beacon = test_beacon();
        beacon.scan_limit = Some(3);
        beacon.scan_count = 5;
        assert_eq!(beacon.remaining_scans(), Some(0));

        beacon.scan_limit = None;
        assert_eq!(beacon.remaining_scans(), None);
    }

    fn test_beacon() -> Beacon {
        Beacon {
            id: Uuid::new_v4(),
            code: "plaza01".into(),
            kind: BeaconKind::Standard,
            status: BeaconStatus::Active,
            owner_id: Uuid::new_v4(),
            xp_reward: 50,
            xp_bonus_multiplier: 1.0,
            scan_limit: None,
            scan_count: 0,
            active_from: None,
            active_until: None,
            required_tier: None,
            last_scanned_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}
