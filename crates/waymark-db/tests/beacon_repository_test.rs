//! Integration tests for the Beacon repository implementation using
//! in-memory SurrealDB.

use chrono::{Duration, Utc};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;
use waymark_core::models::beacon::{BeaconKind, BeaconStatus, CreateBeacon, UpdateBeacon};
use waymark_core::models::tier::MembershipTier;
use waymark_core::repository::{BeaconRepository, Pagination};
use waymark_db::repository::SurrealBeaconRepository;

/// Helper: spin up in-memory DB and run migrations.
async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    waymark_db::run_migrations(&db).await.unwrap();
    db
}

fn create_input(code: &str, owner_id: Uuid) -> CreateBeacon {
    CreateBeacon {
        code: code.into(),
        kind: BeaconKind::Standard,
        owner_id,
        xp_reward: 50,
        xp_bonus_multiplier: 1.0,
        scan_limit: None,
        active_from: None,
        active_until: None,
        required_tier: None,
    }
}

#[tokio::test]
async fn create_and_get_beacon() {
    let db = setup().await;
    let repo = SurrealBeaconRepository::new(db);
    let owner = Uuid::new_v4();

    let beacon = repo.create(create_input("plaza-01", owner)).await.unwrap();
    assert_eq!(beacon.code, "plaza-01");
    assert_eq!(beacon.status, BeaconStatus::Active);
    assert_eq!(beacon.scan_count, 0);
    assert_eq!(beacon.owner_id, owner);
    assert!(beacon.last_scanned_at.is_none());

    let fetched = repo.get_by_code("plaza-01").await.unwrap();
    assert_eq!(fetched.id, beacon.id);
    assert_eq!(fetched.xp_reward, 50);
}

#[tokio::test]
async fn codes_are_case_insensitive_and_trimmed() {
    let db = setup().await;
    let repo = SurrealBeaconRepository::new(db);

    let beacon = repo
        .create(create_input("  Summer-FEST ", Uuid::new_v4()))
        .await
        .unwrap();
    assert_eq!(beacon.code, "summer-fest");

    let fetched = repo.get_by_code("SUMMER-fest").await.unwrap();
    assert_eq!(fetched.id, beacon.id);
}

#[tokio::test]
async fn duplicate_code_is_rejected() {
    let db = setup().await;
    let repo = SurrealBeaconRepository::new(db);

    repo.create(create_input("plaza-01", Uuid::new_v4()))
        .await
        .unwrap();
    let result = repo.create(create_input("PLAZA-01", Uuid::new_v4())).await;
    assert!(result.is_err(), "same code (case-folded) should collide");
}

#[tokio::test]
async fn empty_and_dotted_codes_are_rejected() {
    let db = setup().await;
    let repo = SurrealBeaconRepository::new(db);

    assert!(repo.create(create_input("   ", Uuid::new_v4())).await.is_err());
    // '.' is the composite-token separator and can never appear in a code.
    assert!(
        repo.create(create_input("a.b", Uuid::new_v4()))
            .await
            .is_err()
    );
}

#[tokio::test]
async fn negative_bonus_multiplier_is_rejected() {
    let db = setup().await;
    let repo = SurrealBeaconRepository::new(db);

    let mut input = create_input("plaza-01", Uuid::new_v4());
    input.xp_bonus_multiplier = -0.5;
    assert!(repo.create(input).await.is_err());
}

#[tokio::test]
async fn update_beacon() {
    let db = setup().await;
    let repo = SurrealBeaconRepository::new(db);

    let beacon = repo
        .create(create_input("plaza-01", Uuid::new_v4()))
        .await
        .unwrap();

    let until = Utc::now() + Duration::days(7);
    let updated = repo
        .update(
            beacon.id,
            UpdateBeacon {
                status: Some(BeaconStatus::Inactive),
                xp_reward: Some(120),
                scan_limit: Some(Some(10)),
                active_until: Some(Some(until)),
                required_tier: Some(Some(MembershipTier::Plus)),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.id, beacon.id);
    assert_eq!(updated.status, BeaconStatus::Inactive);
    assert_eq!(updated.xp_reward, 120);
    assert_eq!(updated.scan_limit, Some(10));
    assert_eq!(updated.required_tier, Some(MembershipTier::Plus));
    assert_eq!(updated.code, "plaza-01"); // unchanged

    // Clear the limit again: Some(None) means "unset".
    let cleared = repo
        .update(
            beacon.id,
            UpdateBeacon {
                scan_limit: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(cleared.scan_limit, None);
}

#[tokio::test]
async fn record_scan_increments_and_stamps() {
    let db = setup().await;
    let repo = SurrealBeaconRepository::new(db);

    let beacon = repo
        .create(create_input("plaza-01", Uuid::new_v4()))
        .await
        .unwrap();

    let after_one = repo.record_scan(beacon.id).await.unwrap();
    assert_eq!(after_one.scan_count, 1);
    assert!(after_one.last_scanned_at.is_some());

    let after_two = repo.record_scan(beacon.id).await.unwrap();
    assert_eq!(after_two.scan_count, 2);
}

#[tokio::test]
async fn list_beacons_by_owner_with_pagination() {
    let db = setup().await;
    let repo = SurrealBeaconRepository::new(db);
    let owner = Uuid::new_v4();

    for i in 0..5 {
        repo.create(create_input(&format!("code-{i}"), owner))
            .await
            .unwrap();
    }
    // A beacon from another owner must not appear.
    repo.create(create_input("other", Uuid::new_v4()))
        .await
        .unwrap();

    let page = repo
        .list_by_owner(
            owner,
            Pagination {
                offset: 0,
                limit: 3,
            },
        )
        .await
        .unwrap();
    assert_eq!(page.total, 5);
    assert_eq!(page.items.len(), 3);

    let rest = repo
        .list_by_owner(
            owner,
            Pagination {
                offset: 3,
                limit: 3,
            },
        )
        .await
        .unwrap();
    assert_eq!(rest.items.len(), 2);
}

#[tokio::test]
async fn get_unknown_code_is_not_found() {
    let db = setup().await;
    let repo = SurrealBeaconRepository::new(db);

    let result = repo.get_by_code("nope").await;
    assert!(matches!(
        result,
        Err(waymark_core::error::WaymarkError::NotFound { .. })
    ));
}
