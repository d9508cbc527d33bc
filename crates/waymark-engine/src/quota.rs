//! Per-tier monthly scan quotas.

use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;
use waymark_core::models::tier::MembershipTier;
use waymark_core::repository::ScanQuotaRepository;

use crate::config::TierPolicies;
use crate::error::ScanError;
use crate::locks::KeyedLocks;

/// Calendar-month period key, e.g. `"2026-08"` (UTC).
pub fn month_key(now: DateTime<Utc>) -> String {
    now.format("%Y-%m").to_string()
}

/// Outcome of a granted quota check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaDecision {
    /// The tier has no monthly cap; nothing was read or consumed.
    Unlimited,
    /// One scan was consumed from the monthly allowance.
    Consumed { used: u32, limit: u32 },
}

/// Enforces per-tier monthly scan quotas.
///
/// The check and the consume run under a per-`(user, period)` lock, so
/// a granted permission slot is always paired with exactly one counter
/// increment — two concurrent scans cannot share the last slot.
#[derive(Clone)]
pub struct RateLimiter<Q> {
    quotas: Q,
    tiers: TierPolicies,
    locks: KeyedLocks,
}

impl<Q: ScanQuotaRepository> RateLimiter<Q> {
    pub fn new(quotas: Q, tiers: TierPolicies) -> Self {
        Self {
            quotas,
            tiers,
            locks: KeyedLocks::new(),
        }
    }

    /// Check the user's allowance for `period` and consume one slot.
    pub async fn check_and_consume(
        &self,
        user_id: Uuid,
        tier: MembershipTier,
        period: &str,
    ) -> Result<QuotaDecision, ScanError> {
        let policy = self.tiers.policy_for(tier);
        let Some(limit) = policy.monthly_scan_limit else {
            return Ok(QuotaDecision::Unlimited);
        };

        let _guard = self.locks.acquire(&format!("{user_id}:{period}")).await;

        let used = self.quotas.get(user_id, period).await?;
        if used >= limit {
            debug!(%user_id, period, used, limit, "monthly scan quota exhausted");
            return Err(ScanError::RateLimitExceeded {
                limit,
                used,
                suggested_tier: self.tiers.upgrade_target(tier),
            });
        }

        let used = self.quotas.increment(user_id, period).await?;
        Ok(QuotaDecision::Consumed { used, limit })
    }

    /// Scans left in `period`, or `None` when the tier is unlimited.
    pub async fn remaining(
        &self,
        user_id: Uuid,
        tier: MembershipTier,
        period: &str,
    ) -> Result<Option<u32>, ScanError> {
        let Some(limit) = self.tiers.policy_for(tier).monthly_scan_limit else {
            return Ok(None);
        };
        let used = self.quotas.get(user_id, period).await?;
        Ok(Some(limit.saturating_sub(used)))
    }

    /// Drop idle per-user lock entries.
    pub fn purge_idle_locks(&self) {
        self.locks.purge_idle();
    }
}
