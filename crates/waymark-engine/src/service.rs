//! Scan redemption service — the orchestration core.
//!
//! Every scan attempt moves through the same gate sequence: resolve the
//! beacon (verifying a signed token first when one is presented),
//! validate its status and activity window, consume a rate-limit slot,
//! compute the award, then commit. A rejection at any gate returns a
//! typed [`ScanError`] and persists nothing.

use chrono::{DateTime, Utc};
use tokio::time::timeout;
use tracing::{debug, info};
use uuid::Uuid;

use waymark_core::models::beacon::{Beacon, BeaconKind, BeaconStatus, normalize_code};
use waymark_core::models::scan::{CreateScanEvent, ScanEvent, ScanMetadata};
use waymark_core::models::tier::MembershipTier;
use waymark_core::models::xp::XpAccount;
use waymark_core::repository::{
    BeaconRepository, ScanEventRepository, ScanQuotaRepository, XpAccountRepository,
};
use waymark_token::{TokenConfig, TokenPayload, create_signed_token, parse_signed_token};

use crate::config::EngineConfig;
use crate::error::{InactiveReason, ScanError};
use crate::ledger::{XpLedger, award_amount};
use crate::locks::KeyedLocks;
use crate::quota::{RateLimiter, month_key};
use crate::routing::{ScanRoute, route_for};

/// Input for one redemption attempt.
///
/// The caller is the identity boundary: `user_id` and `tier` come from
/// an already-authenticated request.
#[derive(Debug, Clone)]
pub struct RedeemInput {
    /// A plain beacon code, or a signed composite token (two
    /// dot-separated segments).
    pub code_or_token: String,
    pub user_id: Uuid,
    pub tier: MembershipTier,
    pub metadata: ScanMetadata,
}

/// Successful redemption result.
#[derive(Debug)]
pub struct Redemption {
    /// The appended scan event.
    pub scan: ScanEvent,
    /// Beacon snapshot after the counter update.
    pub beacon: Beacon,
    pub xp_awarded: u32,
    /// XP account snapshot after the award.
    pub account: XpAccount,
    /// Where the client should land next.
    pub route: ScanRoute,
}

/// Read-only beacon counters.
#[derive(Debug, Clone)]
pub struct BeaconStats {
    pub scan_count: u32,
    pub scan_limit: Option<u32>,
    pub last_scanned_at: Option<DateTime<Utc>>,
}

/// Scan redemption service.
///
/// Generic over repository implementations so the engine has no
/// dependency on the database crate. The service is the only writer of
/// beacon counters and XP accounts; all counter updates for one beacon
/// are serialized through a per-code async lock because the store
/// offers no cross-key transactions.
pub struct ScanService<
    B: BeaconRepository,
    E: ScanEventRepository,
    X: XpAccountRepository,
    Q: ScanQuotaRepository,
> {
    beacons: B,
    events: E,
    ledger: XpLedger<X>,
    limiter: RateLimiter<Q>,
    beacon_locks: KeyedLocks,
    tokens: TokenConfig,
    config: EngineConfig,
}

impl<B, E, X, Q> ScanService<B, E, X, Q>
where
    B: BeaconRepository,
    E: ScanEventRepository,
    X: XpAccountRepository,
    Q: ScanQuotaRepository,
{
    pub fn new(
        beacons: B,
        events: E,
        accounts: X,
        quotas: Q,
        tokens: TokenConfig,
        config: EngineConfig,
    ) -> Self {
        let limiter = RateLimiter::new(quotas, config.tiers.clone());
        Self {
            beacons,
            events,
            ledger: XpLedger::new(accounts),
            limiter,
            beacon_locks: KeyedLocks::new(),
            tokens,
            config,
        }
    }

    /// Redeem a beacon code or signed token for the scanning user.
    pub async fn redeem(&self, input: RedeemInput) -> Result<Redemption, ScanError> {
        if input.user_id.is_nil() {
            return Err(ScanError::Unauthorized);
        }

        // 1. Resolve the target code. A composite token is verified
        //    before its code is trusted; its optional kind hint carries
        //    through to routing.
        let (code, kind_hint) = if input.code_or_token.contains('.') {
            let claims = parse_signed_token(&input.code_or_token, &self.tokens)?;
            (normalize_code(&claims.code), claims.kind)
        } else {
            (normalize_code(&input.code_or_token), None)
        };

        // All further reads and writes for this beacon happen under its
        // key lock: the cap check below is only sound if no other scan
        // can advance the counter between the read and the commit.
        let _guard = self.beacon_locks.acquire(&code).await;

        let beacon = self.fetch_beacon(&code).await?;

        // 2. Validate status, activity window, tier gate, and scan cap.
        let now = Utc::now();
        validate_scannable(&beacon, now)?;

        if let Some(required) = beacon.required_tier
            && input.tier < required
        {
            debug!(code, tier = input.tier.as_str(), "tier below beacon requirement");
            return Err(ScanError::MembershipRequired { required });
        }

        if let Some(limit) = beacon.scan_limit
            && beacon.scan_count >= limit
        {
            debug!(code, limit, "beacon scan cap reached");
            return Err(ScanError::ScanLimitReached { limit });
        }

        // 3. Consume a monthly rate-limit slot for the scanning user.
        let decision = self
            .bounded(
                self.limiter
                    .check_and_consume(input.user_id, input.tier, &month_key(now)),
            )
            .await?;

        // 4. Compute the award.
        let tier_multiplier = self.config.tiers.policy_for(input.tier).xp_multiplier;
        let xp_awarded = award_amount(beacon.xp_reward, beacon.xp_bonus_multiplier, tier_multiplier);

        // 5. Commit: beacon counter, then the XP account, then the
        //    event append. Never retried — a transient failure here may
        //    leave a consumed quota slot behind, but XP is only granted
        //    once the counter has recorded the scan.
        let beacon = self.bounded(self.beacons.record_scan(beacon.id)).await?;

        let account = self
            .bounded(self.ledger.award(input.user_id, input.tier, xp_awarded))
            .await?;

        let scan = self
            .bounded(self.events.append(CreateScanEvent {
                beacon_id: beacon.id,
                beacon_code: beacon.code.clone(),
                user_id: input.user_id,
                xp_awarded,
                xp_multiplier: tier_multiplier,
                ip_address: input.metadata.ip_address.clone(),
                user_agent: input.metadata.user_agent.clone(),
            }))
            .await?;

        let route = route_for(kind_hint.unwrap_or(beacon.kind));

        info!(
            code = beacon.code,
            user_id = %input.user_id,
            xp_awarded,
            scan_count = beacon.scan_count,
            ?decision,
            "scan redeemed"
        );

        Ok(Redemption {
            scan,
            beacon,
            xp_awarded,
            account,
            route,
        })
    }

    /// Issue a signed token for an active beacon.
    ///
    /// `ttl_secs` falls back to the configured default lifetime. The
    /// optional kind hint overrides the beacon's own kind at routing
    /// time.
    pub async fn issue_token(
        &self,
        code: &str,
        kind_hint: Option<BeaconKind>,
        ttl_secs: Option<u64>,
    ) -> Result<String, ScanError> {
        let code = normalize_code(code);
        let beacon = self.fetch_beacon(&code).await?;
        validate_scannable(&beacon, Utc::now())?;

        let ttl = ttl_secs.unwrap_or(self.tokens.default_ttl_secs);
        let payload = TokenPayload::new(beacon.code, kind_hint, ttl);
        let token = create_signed_token(&payload, &self.tokens)?;

        debug!(code, ttl, "issued signed beacon token");
        Ok(token.composite)
    }

    /// Read-only counter snapshot for a beacon.
    pub async fn beacon_stats(&self, code: &str) -> Result<BeaconStats, ScanError> {
        let code = normalize_code(code);
        let beacon = self.fetch_beacon(&code).await?;
        Ok(BeaconStats {
            scan_count: beacon.scan_count,
            scan_limit: beacon.scan_limit,
            last_scanned_at: beacon.last_scanned_at,
        })
    }

    /// Scans left in the current calendar month, or `None` when the
    /// user's tier is unlimited.
    pub async fn remaining_this_month(
        &self,
        user_id: Uuid,
        tier: MembershipTier,
    ) -> Result<Option<u32>, ScanError> {
        self.bounded(
            self.limiter
                .remaining(user_id, tier, &month_key(Utc::now())),
        )
        .await
    }

    /// Drop idle per-beacon and per-user lock entries.
    pub fn purge_idle_locks(&self) {
        self.beacon_locks.purge_idle();
        self.limiter.purge_idle_locks();
    }

    /// Look up a beacon with the store deadline applied, retrying the
    /// read once on a transient failure. This is the only retried gate:
    /// a lookup commits nothing, so a second attempt is always safe.
    async fn fetch_beacon(&self, code: &str) -> Result<Beacon, ScanError> {
        let result = match self.bounded(self.beacons.get_by_code(code)).await {
            Err(ScanError::TransientStore { detail }) => {
                debug!(code, detail, "retrying beacon lookup once");
                self.bounded(self.beacons.get_by_code(code)).await
            }
            other => other,
        };

        result.map_err(|err| match err {
            ScanError::NotFound { .. } => ScanError::NotFound {
                code: code.to_string(),
            },
            other => other,
        })
    }

    /// Apply the store deadline to one gate. A deadline miss is a
    /// transient failure; the attempt is abandoned with no commit.
    async fn bounded<T, Err>(
        &self,
        fut: impl Future<Output = Result<T, Err>>,
    ) -> Result<T, ScanError>
    where
        Err: Into<ScanError>,
    {
        match timeout(self.config.store_timeout, fut).await {
            Ok(result) => result.map_err(Into::into),
            Err(_) => Err(ScanError::TransientStore {
                detail: "store call exceeded its deadline".into(),
            }),
        }
    }
}

/// Reject a beacon that is disabled or outside its activity window.
/// Window bounds are inclusive; an unset bound is unbounded.
fn validate_scannable(beacon: &Beacon, now: DateTime<Utc>) -> Result<(), ScanError> {
    if beacon.status != BeaconStatus::Active {
        return Err(ScanError::Inactive {
            reason: InactiveReason::Disabled,
        });
    }
    if let Some(from) = beacon.active_from
        && now < from
    {
        return Err(ScanError::Inactive {
            reason: InactiveReason::NotYetActive,
        });
    }
    if let Some(until) = beacon.active_until
        && now > until
    {
        return Err(ScanError::Inactive {
            reason: InactiveReason::WindowClosed,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn beacon_at(now: DateTime<Utc>) -> Beacon {
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
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let now = Utc::now();
        let mut beacon = beacon_at(now);
        beacon.active_from = Some(now);
        beacon.active_until = Some(now);
        assert!(validate_scannable(&beacon, now).is_ok());
    }

    #[test]
    fn future_start_is_not_yet_active() {
        let now = Utc::now();
        let mut beacon = beacon_at(now);
        beacon.active_from = Some(now + Duration::minutes(5));
        assert!(matches!(
            validate_scannable(&beacon, now),
            Err(ScanError::Inactive {
                reason: InactiveReason::NotYetActive
            })
        ));
    }

    #[test]
    fn past_end_is_window_closed() {
        let now = Utc::now();
        let mut beacon = beacon_at(now);
        beacon.active_until = Some(now - Duration::minutes(5));
        assert!(matches!(
            validate_scannable(&beacon, now),
            Err(ScanError::Inactive {
                reason: InactiveReason::WindowClosed
            })
        ));
    }

    #[test]
    fn disabled_wins_over_window() {
        let now = Utc::now();
        let mut beacon = beacon_at(now);
        beacon.status = BeaconStatus::Inactive;
        beacon.active_until = Some(now - Duration::minutes(5));
        assert!(matches!(
            validate_scannable(&beacon, now),
            Err(ScanError::Inactive {
                reason: InactiveReason::Disabled
            })
        ));
    }
}
