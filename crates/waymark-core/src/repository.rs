//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Implementations live in
//! `waymark-db`; the redemption engine is generic over these traits and
//! never talks to the store directly.

use uuid::Uuid;

use crate::error::WaymarkResult;
use crate::models::{
    beacon::{Beacon, CreateBeacon, UpdateBeacon},
    scan::{CreateScanEvent, ScanEvent},
    xp::XpAccount,
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Beacon registry
// ---------------------------------------------------------------------------

pub trait BeaconRepository: Send + Sync {
    fn create(&self, input: CreateBeacon) -> impl Future<Output = WaymarkResult<Beacon>> + Send;

    /// Look up a beacon by scan code. The code is normalized before the
    /// lookup, so `"PLAZA01"` and `" plaza01 "` resolve identically.
    fn get_by_code(&self, code: &str) -> impl Future<Output = WaymarkResult<Beacon>> + Send;

    fn update(
        &self,
        id: Uuid,
        input: UpdateBeacon,
    ) -> impl Future<Output = WaymarkResult<Beacon>> + Send;

    /// Increment `scan_count` and stamp `last_scanned_at`, returning the
    /// updated beacon. Callers must hold the engine's per-beacon lock —
    /// this method alone does not guard the cap.
    fn record_scan(&self, id: Uuid) -> impl Future<Output = WaymarkResult<Beacon>> + Send;

    fn list_by_owner(
        &self,
        owner_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = WaymarkResult<PaginatedResult<Beacon>>> + Send;
}

// ---------------------------------------------------------------------------
// Scan events (append-only)
// ---------------------------------------------------------------------------

pub trait ScanEventRepository: Send + Sync {
    /// Append a new scan event. No update or delete operations exist.
    fn append(
        &self,
        input: CreateScanEvent,
    ) -> impl Future<Output = WaymarkResult<ScanEvent>> + Send;

    fn list_by_user(
        &self,
        user_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = WaymarkResult<PaginatedResult<ScanEvent>>> + Send;

    fn list_by_beacon(
        &self,
        beacon_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = WaymarkResult<PaginatedResult<ScanEvent>>> + Send;
}

// ---------------------------------------------------------------------------
// XP accounts
// ---------------------------------------------------------------------------

pub trait XpAccountRepository: Send + Sync {
    fn get(&self, user_id: Uuid) -> impl Future<Output = WaymarkResult<XpAccount>> + Send;

    /// Create or overwrite the account row for `account.user_id`.
    fn upsert(&self, account: XpAccount) -> impl Future<Output = WaymarkResult<XpAccount>> + Send;
}

// ---------------------------------------------------------------------------
// Monthly scan quota counters
// ---------------------------------------------------------------------------

pub trait ScanQuotaRepository: Send + Sync {
    /// Scans consumed by `user_id` in `period` (zero when no row exists).
    /// Period keys are `"YYYY-MM"` (UTC); a new month means a new key, so
    /// counters reset by rollover rather than deletion.
    fn get(&self, user_id: Uuid, period: &str) -> impl Future<Output = WaymarkResult<u32>> + Send;

    /// Record one consumed scan and return the new count.
    fn increment(
        &self,
        user_id: Uuid,
        period: &str,
    ) -> impl Future<Output = WaymarkResult<u32>> + Send;
}
