//! SurrealDB implementation of [`XpAccountRepository`].
//!
//! One account row per user; the record id is the user's UUID, so every
//! read and write is a single-key operation.

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;
use waymark_core::error::WaymarkResult;
use waymark_core::models::tier::MembershipTier;
use waymark_core::models::xp::XpAccount;
use waymark_core::repository::XpAccountRepository;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct XpAccountRow {
    user_id: String,
    total_xp: u64,
    available_xp: u64,
    level: u32,
    membership_tier: String,
    last_activity_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_tier(s: &str) -> Result<MembershipTier, DbError> {
    match s {
        "free" => Ok(MembershipTier::Free),
        "member" => Ok(MembershipTier::Member),
        "plus" => Ok(MembershipTier::Plus),
        "pro" => Ok(MembershipTier::Pro),
        other => Err(DbError::Migration(format!(
            "unknown membership tier: {other}"
        ))),
    }
}

impl XpAccountRow {
    fn into_account(self) -> Result<XpAccount, DbError> {
        let user_id = Uuid::parse_str(&self.user_id)
            .map_err(|e| DbError::Migration(format!("invalid user UUID: {e}")))?;
        Ok(XpAccount {
            user_id,
            total_xp: self.total_xp,
            available_xp: self.available_xp,
            level: self.level,
            membership_tier: parse_tier(&self.membership_tier)?,
            last_activity_at: self.last_activity_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the XP account repository.
#[derive(Clone)]
pub struct SurrealXpAccountRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealXpAccountRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> XpAccountRepository for SurrealXpAccountRepository<C> {
    async fn get(&self, user_id: Uuid) -> WaymarkResult<XpAccount> {
        let id_str = user_id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('xp_account', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<XpAccountRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "xp_account".into(),
            id: id_str,
        })?;

        Ok(row.into_account()?)
    }

    async fn upsert(&self, account: XpAccount) -> WaymarkResult<XpAccount> {
        let id_str = account.user_id.to_string();

        let result = self
            .db
            .query(
                "UPSERT type::record('xp_account', $id) SET \
                 user_id = $user_id, \
                 total_xp = $total_xp, \
                 available_xp = $available_xp, \
                 level = $level, \
                 membership_tier = $membership_tier, \
                 last_activity_at = $last_activity_at, \
                 updated_at = time::now()",
            )
            .bind(("id", id_str.clone()))
            .bind(("user_id", id_str.clone()))
            .bind(("total_xp", account.total_xp))
            .bind(("available_xp", account.available_xp))
            .bind(("level", account.level))
            .bind((
                "membership_tier",
                account.membership_tier.as_str().to_string(),
            ))
            .bind(("last_activity_at", account.last_activity_at))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<XpAccountRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "xp_account".into(),
            id: id_str,
        })?;

        Ok(row.into_account()?)
    }
}
