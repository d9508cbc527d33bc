//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. Enums are stored as strings with
//! ASSERT constraints for validation.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1 — initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Beacons
-- =======================================================================
DEFINE TABLE beacon SCHEMAFULL;
DEFINE FIELD code ON TABLE beacon TYPE string;
DEFINE FIELD kind ON TABLE beacon TYPE string \
    ASSERT $value IN ['standard', 'event', 'product', 'person', \
    'resale'];
DEFINE FIELD status ON TABLE beacon TYPE string \
    ASSERT $value IN ['active', 'inactive'];
DEFINE FIELD owner_id ON TABLE beacon TYPE string;
DEFINE FIELD xp_reward ON TABLE beacon TYPE int;
DEFINE FIELD xp_bonus_multiplier ON TABLE beacon TYPE float \
    DEFAULT 1.0;
DEFINE FIELD scan_limit ON TABLE beacon TYPE option<int>;
DEFINE FIELD scan_count ON TABLE beacon TYPE int DEFAULT 0;
DEFINE FIELD active_from ON TABLE beacon TYPE option<datetime>;
DEFINE FIELD active_until ON TABLE beacon TYPE option<datetime>;
DEFINE FIELD required_tier ON TABLE beacon TYPE option<string> \
    ASSERT $value = NONE OR $value IN ['free', 'member', 'plus', 'pro'];
DEFINE FIELD last_scanned_at ON TABLE beacon TYPE option<datetime>;
DEFINE FIELD created_at ON TABLE beacon TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE beacon TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_beacon_code ON TABLE beacon COLUMNS code UNIQUE;
DEFINE INDEX idx_beacon_owner ON TABLE beacon COLUMNS owner_id;

-- =======================================================================
-- Scan events (append-only)
-- =======================================================================
DEFINE TABLE scan_event SCHEMAFULL;
DEFINE FIELD beacon_id ON TABLE scan_event TYPE string;
DEFINE FIELD beacon_code ON TABLE scan_event TYPE string;
DEFINE FIELD user_id ON TABLE scan_event TYPE string;
DEFINE FIELD scanned_at ON TABLE scan_event TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD xp_awarded ON TABLE scan_event TYPE int;
DEFINE FIELD xp_multiplier ON TABLE scan_event TYPE int;
DEFINE FIELD ip_address ON TABLE scan_event TYPE option<string>;
DEFINE FIELD user_agent ON TABLE scan_event TYPE option<string>;
DEFINE INDEX idx_scan_event_user ON TABLE scan_event COLUMNS user_id;
DEFINE INDEX idx_scan_event_beacon ON TABLE scan_event \
    COLUMNS beacon_id;

-- =======================================================================
-- XP accounts (record id = user id)
-- =======================================================================
DEFINE TABLE xp_account SCHEMAFULL;
DEFINE FIELD user_id ON TABLE xp_account TYPE string;
DEFINE FIELD total_xp ON TABLE xp_account TYPE int DEFAULT 0;
DEFINE FIELD available_xp ON TABLE xp_account TYPE int DEFAULT 0;
DEFINE FIELD level ON TABLE xp_account TYPE int DEFAULT 0;
DEFINE FIELD membership_tier ON TABLE xp_account TYPE string \
    ASSERT $value IN ['free', 'member', 'plus', 'pro'];
DEFINE FIELD last_activity_at ON TABLE xp_account TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD created_at ON TABLE xp_account TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE xp_account TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Monthly scan quota counters (record id = 'user:period')
-- =======================================================================
DEFINE TABLE scan_quota SCHEMAFULL;
DEFINE FIELD user_id ON TABLE scan_quota TYPE string;
DEFINE FIELD period ON TABLE scan_quota TYPE string;
DEFINE FIELD count ON TABLE scan_quota TYPE int DEFAULT 0;
DEFINE FIELD updated_at ON TABLE scan_quota TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_scan_quota_user_period ON TABLE scan_quota \
    COLUMNS user_id, period UNIQUE;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
/// All DEFINE statements are idempotent so re-running is safe.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    // Ensure migration tracking table exists (idempotent).
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    // Determine current schema version.
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            // Record the applied migration.
            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
///
/// Exposed for testing with in-memory SurrealDB instances that
/// bypass the migration runner.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}
