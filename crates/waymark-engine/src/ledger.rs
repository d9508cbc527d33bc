//! XP accounting: award application and the level curve.

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;
use waymark_core::error::{WaymarkError, WaymarkResult};
use waymark_core::models::tier::MembershipTier;
use waymark_core::models::xp::XpAccount;
use waymark_core::repository::XpAccountRepository;

/// Level reached at `total_xp`: `floor(sqrt(total_xp / 100))`.
///
/// Integer arithmetic keeps the curve exact at the perfect-square
/// boundaries (level 1 at exactly 100 XP, level 2 at exactly 400 XP).
/// Existing accounts were levelled with this curve; it must not drift.
pub fn level_for(total_xp: u64) -> u32 {
    (total_xp / 100).isqrt() as u32
}

/// XP granted for one scan: base reward × beacon bonus × tier
/// multiplier, rounded to the nearest integer.
pub fn award_amount(xp_reward: u32, bonus_multiplier: f64, tier_multiplier: u32) -> u32 {
    let raw = f64::from(xp_reward) * bonus_multiplier * f64::from(tier_multiplier);
    raw.round() as u32
}

/// Applies awards to per-user XP accounts.
///
/// Amounts are unsigned, so the scan path can never remove XP; spending
/// `available_xp` belongs to the rewards system, not here.
#[derive(Clone)]
pub struct XpLedger<A> {
    accounts: A,
}

impl<A: XpAccountRepository> XpLedger<A> {
    pub fn new(accounts: A) -> Self {
        Self { accounts }
    }

    /// Add `amount` XP to the user's account, creating it on first
    /// award, and persist the updated snapshot.
    pub async fn award(
        &self,
        user_id: Uuid,
        tier: MembershipTier,
        amount: u32,
    ) -> WaymarkResult<XpAccount> {
        let now = Utc::now();
        let mut account = match self.accounts.get(user_id).await {
            Ok(account) => account,
            Err(WaymarkError::NotFound { .. }) => XpAccount {
                user_id,
                total_xp: 0,
                available_xp: 0,
                level: 0,
                membership_tier: tier,
                last_activity_at: now,
                created_at: now,
                updated_at: now,
            },
            Err(e) => return Err(e),
        };

        account.total_xp += u64::from(amount);
        account.available_xp += u64::from(amount);
        account.level = level_for(account.total_xp);
        account.membership_tier = tier;
        account.last_activity_at = now;

        debug!(
            %user_id,
            amount,
            total_xp = account.total_xp,
            level = account.level,
            "XP awarded"
        );

        self.accounts.upsert(account).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_curve_matches_legacy_boundaries() {
        assert_eq!(level_for(0), 0);
        assert_eq!(level_for(99), 0);
        assert_eq!(level_for(100), 1);
        assert_eq!(level_for(399), 1);
        assert_eq!(level_for(400), 2);
        assert_eq!(level_for(899), 2);
        assert_eq!(level_for(900), 3);
        assert_eq!(level_for(2500), 5);
        assert_eq!(level_for(1_000_000), 100);
    }

    #[test]
    fn award_is_deterministic() {
        // The canonical fixture: pro tier on a double-XP beacon.
        assert_eq!(award_amount(100, 2.0, 5), 1000);
    }

    #[test]
    fn award_rounds_to_nearest() {
        assert_eq!(award_amount(33, 1.5, 1), 50); // 49.5 rounds up
        assert_eq!(award_amount(33, 1.4, 1), 46); // 46.2 rounds down
    }

    #[test]
    fn zero_reward_stays_zero() {
        assert_eq!(award_amount(0, 2.0, 5), 0);
        assert_eq!(award_amount(100, 0.0, 5), 0);
    }
}
