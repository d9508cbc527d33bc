//! SurrealDB implementation of [`BeaconRepository`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;
use waymark_core::error::{WaymarkError, WaymarkResult};
use waymark_core::models::beacon::{
    Beacon, BeaconKind, BeaconStatus, CreateBeacon, UpdateBeacon, normalize_code,
};
use waymark_core::models::tier::MembershipTier;
use waymark_core::repository::{BeaconRepository, PaginatedResult, Pagination};

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct BeaconRow {
    code: String,
    kind: String,
    status: String,
    owner_id: String,
    xp_reward: u32,
    xp_bonus_multiplier: f64,
    scan_limit: Option<u32>,
    scan_count: u32,
    active_from: Option<DateTime<Utc>>,
    active_until: Option<DateTime<Utc>>,
    required_tier: Option<String>,
    last_scanned_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct BeaconRowWithId {
    record_id: String,
    code: String,
    kind: String,
    status: String,
    owner_id: String,
    xp_reward: u32,
    xp_bonus_multiplier: f64,
    scan_limit: Option<u32>,
    scan_count: u32,
    active_from: Option<DateTime<Utc>>,
    active_until: Option<DateTime<Utc>>,
    required_tier: Option<String>,
    last_scanned_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_kind(s: &str) -> Result<BeaconKind, DbError> {
    match s {
        "standard" => Ok(BeaconKind::Standard),
        "event" => Ok(BeaconKind::Event),
        "product" => Ok(BeaconKind::Product),
        "person" => Ok(BeaconKind::Person),
        "resale" => Ok(BeaconKind::Resale),
        other => Err(DbError::Migration(format!("unknown beacon kind: {other}"))),
    }
}

fn kind_to_string(kind: BeaconKind) -> &'static str {
    match kind {
        BeaconKind::Standard => "standard",
        BeaconKind::Event => "event",
        BeaconKind::Product => "product",
        BeaconKind::Person => "person",
        BeaconKind::Resale => "resale",
    }
}

fn parse_status(s: &str) -> Result<BeaconStatus, DbError> {
    match s {
        "active" => Ok(BeaconStatus::Active),
        "inactive" => Ok(BeaconStatus::Inactive),
        other => Err(DbError::Migration(format!("unknown beacon status: {other}"))),
    }
}

fn status_to_string(status: BeaconStatus) -> &'static str {
    match status {
        BeaconStatus::Active => "active",
        BeaconStatus::Inactive => "inactive",
    }
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

impl BeaconRow {
    fn into_beacon(self, id: Uuid) -> Result<Beacon, DbError> {
        let owner_id = Uuid::parse_str(&self.owner_id)
            .map_err(|e| DbError::Migration(format!("invalid owner UUID: {e}")))?;
        let required_tier = self.required_tier.as_deref().map(parse_tier).transpose()?;
        Ok(Beacon {
            id,
            code: self.code,
            kind: parse_kind(&self.kind)?,
            status: parse_status(&self.status)?,
            owner_id,
            xp_reward: self.xp_reward,
            xp_bonus_multiplier: self.xp_bonus_multiplier,
            scan_limit: self.scan_limit,
            scan_count: self.scan_count,
            active_from: self.active_from,
            active_until: self.active_until,
            required_tier,
            last_scanned_at: self.last_scanned_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl BeaconRowWithId {
    fn try_into_beacon(self) -> Result<Beacon, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        let row = BeaconRow {
            code: self.code,
            kind: self.kind,
            status: self.status,
            owner_id: self.owner_id,
            xp_reward: self.xp_reward,
            xp_bonus_multiplier: self.xp_bonus_multiplier,
            scan_limit: self.scan_limit,
            scan_count: self.scan_count,
            active_from: self.active_from,
            active_until: self.active_until,
            required_tier: self.required_tier,
            last_scanned_at: self.last_scanned_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        };
        row.into_beacon(id)
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the Beacon registry.
#[derive(Clone)]
pub struct SurrealBeaconRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealBeaconRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> BeaconRepository for SurrealBeaconRepository<C> {
    async fn create(&self, input: CreateBeacon) -> WaymarkResult<Beacon> {
        if !input.xp_bonus_multiplier.is_finite() || input.xp_bonus_multiplier < 0.0 {
            return Err(WaymarkError::Validation {
                message: format!(
                    "xp_bonus_multiplier must be a non-negative number, got {}",
                    input.xp_bonus_multiplier
                ),
            });
        }

        let code = normalize_code(&input.code);
        if code.is_empty() || code.contains('.') {
            return Err(WaymarkError::Validation {
                message: format!("invalid beacon code: {:?}", input.code),
            });
        }

        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('beacon', $id) SET \
                 code = $code, \
                 kind = $kind, \
                 status = 'active', \
                 owner_id = $owner_id, \
                 xp_reward = $xp_reward, \
                 xp_bonus_multiplier = $xp_bonus_multiplier, \
                 scan_limit = $scan_limit, \
                 scan_count = 0, \
                 active_from = $active_from, \
                 active_until = $active_until, \
                 required_tier = $required_tier, \
                 last_scanned_at = NONE",
            )
            .bind(("id", id_str.clone()))
            .bind(("code", code))
            .bind(("kind", kind_to_string(input.kind).to_string()))
            .bind(("owner_id", input.owner_id.to_string()))
            .bind(("xp_reward", input.xp_reward))
            .bind(("xp_bonus_multiplier", input.xp_bonus_multiplier))
            .bind(("scan_limit", input.scan_limit))
            .bind(("active_from", input.active_from))
            .bind(("active_until", input.active_until))
            .bind((
                "required_tier",
                input
                    .required_tier
                    .map(|t| t.as_str().to_string()),
            ))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<BeaconRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "beacon".into(),
            id: id_str,
        })?;

        Ok(row.into_beacon(id)?)
    }

    async fn get_by_code(&self, code: &str) -> WaymarkResult<Beacon> {
        let code = normalize_code(code);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM beacon \
                 WHERE code = $code",
            )
            .bind(("code", code.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<BeaconRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "beacon".into(),
            id: format!("code={code}"),
        })?;

        Ok(row.try_into_beacon()?)
    }

    async fn update(&self, id: Uuid, input: UpdateBeacon) -> WaymarkResult<Beacon> {
        if let Some(m) = input.xp_bonus_multiplier
            && (!m.is_finite() || m < 0.0)
        {
            return Err(WaymarkError::Validation {
                message: format!("xp_bonus_multiplier must be a non-negative number, got {m}"),
            });
        }

        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.kind.is_some() {
            sets.push("kind = $kind");
        }
        if input.status.is_some() {
            sets.push("status = $status");
        }
        if input.xp_reward.is_some() {
            sets.push("xp_reward = $xp_reward");
        }
        if input.xp_bonus_multiplier.is_some() {
            sets.push("xp_bonus_multiplier = $xp_bonus_multiplier");
        }
        if input.scan_limit.is_some() {
            sets.push("scan_limit = $scan_limit");
        }
        if input.active_from.is_some() {
            sets.push("active_from = $active_from");
        }
        if input.active_until.is_some() {
            sets.push("active_until = $active_until");
        }
        if input.required_tier.is_some() {
            sets.push("required_tier = $required_tier");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('beacon', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(kind) = input.kind {
            builder = builder.bind(("kind", kind_to_string(kind).to_string()));
        }
        if let Some(status) = input.status {
            builder = builder.bind(("status", status_to_string(status).to_string()));
        }
        if let Some(xp_reward) = input.xp_reward {
            builder = builder.bind(("xp_reward", xp_reward));
        }
        if let Some(multiplier) = input.xp_bonus_multiplier {
            builder = builder.bind(("xp_bonus_multiplier", multiplier));
        }
        if let Some(scan_limit) = input.scan_limit {
            // Option<Option<u32>>: Some(Some(v)) = set, Some(None) = clear.
            builder = builder.bind(("scan_limit", scan_limit));
        }
        if let Some(active_from) = input.active_from {
            builder = builder.bind(("active_from", active_from));
        }
        if let Some(active_until) = input.active_until {
            builder = builder.bind(("active_until", active_until));
        }
        if let Some(required_tier) = input.required_tier {
            builder = builder.bind((
                "required_tier",
                required_tier.map(|t| t.as_str().to_string()),
            ));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<BeaconRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "beacon".into(),
            id: id_str,
        })?;

        Ok(row.into_beacon(id)?)
    }

    async fn record_scan(&self, id: Uuid) -> WaymarkResult<Beacon> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "UPDATE type::record('beacon', $id) SET \
                 scan_count += 1, \
                 last_scanned_at = time::now(), \
                 updated_at = time::now()",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<BeaconRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "beacon".into(),
            id: id_str,
        })?;

        Ok(row.into_beacon(id)?)
    }

    async fn list_by_owner(
        &self,
        owner_id: Uuid,
        pagination: Pagination,
    ) -> WaymarkResult<PaginatedResult<Beacon>> {
        let owner_id_str = owner_id.to_string();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM beacon \
                 WHERE owner_id = $owner_id GROUP ALL",
            )
            .bind(("owner_id", owner_id_str.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM beacon \
                 WHERE owner_id = $owner_id \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("owner_id", owner_id_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<BeaconRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_beacon())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
