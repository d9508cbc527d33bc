//! Scan event domain model.
//!
//! A scan event is the immutable record of one successful redemption.
//! Events are append-only: no update or delete operations exist anywhere
//! in the system.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanEvent {
    pub id: Uuid,
    pub beacon_id: Uuid,
    /// Denormalized beacon code at scan time, for history display.
    pub beacon_code: String,
    pub user_id: Uuid,
    pub scanned_at: DateTime<Utc>,
    pub xp_awarded: u32,
    /// Tier multiplier in effect when the scan was recorded.
    pub xp_multiplier: u32,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateScanEvent {
    pub beacon_id: Uuid,
    pub beacon_code: String,
    pub user_id: Uuid,
    pub xp_awarded: u32,
    pub xp_multiplier: u32,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Caller-supplied request context recorded alongside each scan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanMetadata {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}
