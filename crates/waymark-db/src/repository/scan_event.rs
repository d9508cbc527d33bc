//! SurrealDB implementation of [`ScanEventRepository`].
//!
//! Scan events are append-only: this repository exposes no update or
//! delete path, matching the domain model.

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;
use waymark_core::error::WaymarkResult;
use waymark_core::models::scan::{CreateScanEvent, ScanEvent};
use waymark_core::repository::{PaginatedResult, Pagination, ScanEventRepository};

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct ScanEventRow {
    beacon_id: String,
    beacon_code: String,
    user_id: String,
    scanned_at: DateTime<Utc>,
    xp_awarded: u32,
    xp_multiplier: u32,
    ip_address: Option<String>,
    user_agent: Option<String>,
}

#[derive(Debug, SurrealValue)]
struct ScanEventRowWithId {
    record_id: String,
    beacon_id: String,
    beacon_code: String,
    user_id: String,
    scanned_at: DateTime<Utc>,
    xp_awarded: u32,
    xp_multiplier: u32,
    ip_address: Option<String>,
    user_agent: Option<String>,
}

fn row_to_event(row: ScanEventRow, id: Uuid) -> Result<ScanEvent, DbError> {
    let beacon_id = Uuid::parse_str(&row.beacon_id)
        .map_err(|e| DbError::Migration(format!("invalid beacon UUID: {e}")))?;
    let user_id = Uuid::parse_str(&row.user_id)
        .map_err(|e| DbError::Migration(format!("invalid user UUID: {e}")))?;
    Ok(ScanEvent {
        id,
        beacon_id,
        beacon_code: row.beacon_code,
        user_id,
        scanned_at: row.scanned_at,
        xp_awarded: row.xp_awarded,
        xp_multiplier: row.xp_multiplier,
        ip_address: row.ip_address,
        user_agent: row.user_agent,
    })
}

impl ScanEventRowWithId {
    fn try_into_event(self) -> Result<ScanEvent, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        row_to_event(
            ScanEventRow {
                beacon_id: self.beacon_id,
                beacon_code: self.beacon_code,
                user_id: self.user_id,
                scanned_at: self.scanned_at,
                xp_awarded: self.xp_awarded,
                xp_multiplier: self.xp_multiplier,
                ip_address: self.ip_address,
                user_agent: self.user_agent,
            },
            id,
        )
    }
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the scan event repository.
#[derive(Clone)]
pub struct SurrealScanEventRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealScanEventRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ScanEventRepository for SurrealScanEventRepository<C> {
    async fn append(&self, input: CreateScanEvent) -> WaymarkResult<ScanEvent> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('scan_event', $id) SET \
                 beacon_id = $beacon_id, \
                 beacon_code = $beacon_code, \
                 user_id = $user_id, \
                 xp_awarded = $xp_awarded, \
                 xp_multiplier = $xp_multiplier, \
                 ip_address = $ip_address, \
                 user_agent = $user_agent",
            )
            .bind(("id", id_str.clone()))
            .bind(("beacon_id", input.beacon_id.to_string()))
            .bind(("beacon_code", input.beacon_code))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("xp_awarded", input.xp_awarded))
            .bind(("xp_multiplier", input.xp_multiplier))
            .bind(("ip_address", input.ip_address))
            .bind(("user_agent", input.user_agent))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<ScanEventRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "scan_event".into(),
            id: id_str,
        })?;

        Ok(row_to_event(row, id)?)
    }

    async fn list_by_user(
        &self,
        user_id: Uuid,
        pagination: Pagination,
    ) -> WaymarkResult<PaginatedResult<ScanEvent>> {
        let user_id_str = user_id.to_string();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM scan_event \
                 WHERE user_id = $user_id GROUP ALL",
            )
            .bind(("user_id", user_id_str.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM scan_event \
                 WHERE user_id = $user_id \
                 ORDER BY scanned_at DESC \
                 LIMIT $limit START $offset",
            )
            .bind(("user_id", user_id_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ScanEventRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_event())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn list_by_beacon(
        &self,
        beacon_id: Uuid,
        pagination: Pagination,
    ) -> WaymarkResult<PaginatedResult<ScanEvent>> {
        let beacon_id_str = beacon_id.to_string();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM scan_event \
                 WHERE beacon_id = $beacon_id GROUP ALL",
            )
            .bind(("beacon_id", beacon_id_str.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM scan_event \
                 WHERE beacon_id = $beacon_id \
                 ORDER BY scanned_at DESC \
                 LIMIT $limit START $offset",
            )
            .bind(("beacon_id", beacon_id_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ScanEventRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_event())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
