//! XP account domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::tier::MembershipTier;

/// Per-user cumulative XP state. One account per user, created lazily on
/// the first award.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XpAccount {
    pub user_id: Uuid,
    /// Lifetime XP. The scan path only ever increases this.
    pub total_xp: u64,
    /// Spendable balance. Decremented by reward redemption, which lives
    /// outside this system.
    pub available_xp: u64,
    /// Derived from `total_xp`; recomputed on every award.
    pub level: u32,
    /// Last membership tier observed from the identity provider.
    pub membership_tier: MembershipTier,
    pub last_activity_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
