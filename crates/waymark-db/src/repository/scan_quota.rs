//! SurrealDB implementation of [`ScanQuotaRepository`].
//!
//! One counter row per `(user, period)` pair with a deterministic record
//! id, so a month rollover lands on a fresh key and the old counter is
//! simply never read again.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;
use waymark_core::error::WaymarkResult;
use waymark_core::repository::ScanQuotaRepository;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct QuotaRow {
    count: u32,
}

fn quota_record_id(user_id: Uuid, period: &str) -> String {
    format!("{user_id}:{period}")
}

/// SurrealDB implementation of the monthly scan quota repository.
#[derive(Clone)]
pub struct SurrealScanQuotaRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealScanQuotaRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ScanQuotaRepository for SurrealScanQuotaRepository<C> {
    async fn get(&self, user_id: Uuid, period: &str) -> WaymarkResult<u32> {
        let mut result = self
            .db
            .query("SELECT count FROM type::record('scan_quota', $id)")
            .bind(("id", quota_record_id(user_id, period)))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<QuotaRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.count).unwrap_or(0))
    }

    async fn increment(&self, user_id: Uuid, period: &str) -> WaymarkResult<u32> {
        let result = self
            .db
            .query(
                "UPSERT type::record('scan_quota', $id) SET \
                 user_id = $user_id, \
                 period = $period, \
                 count += 1, \
                 updated_at = time::now()",
            )
            .bind(("id", quota_record_id(user_id, period)))
            .bind(("user_id", user_id.to_string()))
            .bind(("period", period.to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<QuotaRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "scan_quota".into(),
            id: quota_record_id(user_id, period),
        })?;

        Ok(row.count)
    }
}
