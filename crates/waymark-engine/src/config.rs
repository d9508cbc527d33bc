//! Engine configuration: tier policies and store call bounds.

use std::collections::BTreeMap;
use std::time::Duration;

use waymark_core::models::tier::MembershipTier;

/// Per-tier scan policy.
#[derive(Debug, Clone, Copy)]
pub struct TierPolicy {
    /// XP multiplier applied to every award for this tier.
    pub xp_multiplier: u32,
    /// Scans allowed per calendar month. `None` = unlimited.
    pub monthly_scan_limit: Option<u32>,
}

/// Injected tier policy table.
///
/// Nothing in the engine reads tier constants directly; extending the
/// tier set is a configuration change plus a `MembershipTier` variant.
#[derive(Debug, Clone)]
pub struct TierPolicies {
    policies: BTreeMap<MembershipTier, TierPolicy>,
}

impl Default for TierPolicies {
    fn default() -> Self {
        let mut policies = BTreeMap::new();
        policies.insert(
            MembershipTier::Free,
            TierPolicy {
                xp_multiplier: 1,
                monthly_scan_limit: Some(30),
            },
        );
        policies.insert(
            MembershipTier::Member,
            TierPolicy {
                xp_multiplier: 2,
                monthly_scan_limit: Some(100),
            },
        );
        policies.insert(
            MembershipTier::Plus,
            TierPolicy {
                xp_multiplier: 3,
                monthly_scan_limit: None,
            },
        );
        policies.insert(
            MembershipTier::Pro,
            TierPolicy {
                xp_multiplier: 5,
                monthly_scan_limit: None,
            },
        );
        Self { policies }
    }
}

impl TierPolicies {
    /// Override the policy for one tier.
    pub fn with_policy(mut self, tier: MembershipTier, policy: TierPolicy) -> Self {
        self.policies.insert(tier, policy);
        self
    }

    /// Policy for `tier`. The table always contains every tier
    /// (`Default` seeds all of them and `with_policy` only overwrites),
    /// so the fallback arm never fires in practice; it fails closed.
    pub fn policy_for(&self, tier: MembershipTier) -> TierPolicy {
        self.policies.get(&tier).copied().unwrap_or(TierPolicy {
            xp_multiplier: 1,
            monthly_scan_limit: Some(0),
        })
    }

    /// Lowest tier above `current` whose policy lifts the monthly cap —
    /// either unlimited or a strictly larger allowance. Used for the
    /// upgrade hint on quota rejections.
    pub fn upgrade_target(&self, current: MembershipTier) -> Option<MembershipTier> {
        let current_limit = self.policy_for(current).monthly_scan_limit?;
        MembershipTier::ALL
            .into_iter()
            .filter(|&tier| tier > current)
            .find(|&tier| match self.policy_for(tier).monthly_scan_limit {
                None => true,
                Some(limit) => limit > current_limit,
            })
    }
}

/// Engine-wide knobs.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Upper bound on any single store-backed gate of the redemption
    /// flow. A timeout aborts the attempt as a transient failure.
    pub store_timeout: Duration,
    pub tiers: TierPolicies,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            store_timeout: Duration::from_secs(5),
            tiers: TierPolicies::default(),
        }
    }
}
