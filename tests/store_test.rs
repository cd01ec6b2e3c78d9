//! # Event Store Tests
//!
//! These tests verify the SQLite-backed event store: schema creation,
//! round-trips for all three record kinds, edit/delete semantics, the
//! clear-all action, sync paging and workspace metadata validation.

use quality_track::db;
use quality_track::records::{Area, CarModel, DefectRecord, DowntimeRecord, PassRecord};
use quality_track::store;
use quality_track::EXPECTED_DB_VERSION;

fn sample_pass(id: &str, timestamp_ms: i64) -> PassRecord {
    PassRecord {
        id: id.to_string(),
        timestamp_ms,
        model: CarModel::Eqe,
        area: Area::InspecaoOffLine,
        vin: "9BW1A2B3C4D5E6F70".to_string(),
        quantity: 2,
        operator_id: "1001".to_string(),
        time_slot: "08:00 as 09:00".to_string(),
        acting_section: Some("reinspeção recebimento".to_string()),
        released: Some("Liberado após reaperto".to_string()),
        is_reinspection: true,
    }
}

fn sample_defect(id: &str, timestamp_ms: i64) -> DefectRecord {
    DefectRecord {
        id: id.to_string(),
        timestamp_ms,
        model: CarModel::Sa2,
        area: Area::LinhaDeTeste,
        vin: String::new(),
        defect: "Scratch, door \"left\"".to_string(),
        quantity: 1,
        operator_id: "1002".to_string(),
        time_slot: String::new(),
        acting_section: None,
        released: None,
        is_reinspection: false,
    }
}

fn sample_downtime(id: &str, timestamp_ms: i64) -> DowntimeRecord {
    DowntimeRecord {
        id: id.to_string(),
        timestamp_ms,
        area: Area::TesteDeChuva,
        start_time: "23:30".to_string(),
        end_time: "00:15".to_string(),
        duration_minutes: 45,
        reason: "Falta de energia".to_string(),
        operator_id: Some("1003".to_string()),
    }
}

async fn create_test_pool() -> (sqlx::SqlitePool, tempfile::TempDir) {
    let (pool, guard) = db::create_test_connection_in_temporary_file()
        .await
        .unwrap();
    db::init_database_schema(&pool).await.unwrap();
    (pool, guard)
}

#[tokio::test]
async fn test_records_round_trip_with_all_fields() {
    let (pool, _guard) = create_test_pool().await;

    let pass = sample_pass("p1", 1730000000000);
    let defect = sample_defect("d1", 1730000001000);
    let downtime = sample_downtime("dt1", 1730000002000);

    store::insert_pass(&pool, &pass).await.unwrap();
    store::insert_defect(&pool, &defect).await.unwrap();
    store::insert_downtime(&pool, &downtime).await.unwrap();

    let snapshot = store::load_snapshot(&pool).await.unwrap();

    assert_eq!(snapshot.pass.len(), 1);
    let loaded = &snapshot.pass[0];
    assert_eq!(loaded.id, pass.id);
    assert_eq!(loaded.timestamp_ms, pass.timestamp_ms);
    assert_eq!(loaded.model, pass.model);
    assert_eq!(loaded.area, pass.area);
    assert_eq!(loaded.vin, pass.vin);
    assert_eq!(loaded.quantity, pass.quantity);
    assert_eq!(loaded.acting_section, pass.acting_section);
    assert_eq!(loaded.released, pass.released);
    assert!(loaded.is_reinspection);

    assert_eq!(snapshot.defects.len(), 1);
    let loaded = &snapshot.defects[0];
    assert_eq!(loaded.defect, defect.defect, "Quoting survives the round trip");
    assert_eq!(loaded.acting_section, None);
    assert!(!loaded.is_reinspection);

    assert_eq!(snapshot.downtime.len(), 1);
    let loaded = &snapshot.downtime[0];
    assert_eq!(loaded.duration_minutes, 45);
    assert_eq!(loaded.operator_id.as_deref(), Some("1003"));
}

#[tokio::test]
async fn test_snapshot_is_ordered_newest_first() {
    let (pool, _guard) = create_test_pool().await;

    store::insert_pass(&pool, &sample_pass("p1", 1730000000000))
        .await
        .unwrap();
    store::insert_pass(&pool, &sample_pass("p2", 1730000005000))
        .await
        .unwrap();
    store::insert_pass(&pool, &sample_pass("p3", 1730000002000))
        .await
        .unwrap();

    let snapshot = store::load_snapshot(&pool).await.unwrap();
    let ids: Vec<&str> = snapshot.pass.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["p2", "p3", "p1"]);
}

#[tokio::test]
async fn test_update_preserves_id_and_replaces_fields() {
    let (pool, _guard) = create_test_pool().await;

    let mut record = sample_pass("p1", 1730000000000);
    store::insert_pass(&pool, &record).await.unwrap();

    record.quantity = 7;
    record.vin = "9BW999".to_string();
    let updated = store::update_pass(&pool, &record).await.unwrap();
    assert!(updated);

    let snapshot = store::load_snapshot(&pool).await.unwrap();
    assert_eq!(snapshot.pass.len(), 1);
    assert_eq!(snapshot.pass[0].quantity, 7);
    assert_eq!(snapshot.pass[0].vin, "9BW999");

    // Updating a missing id reports false
    let mut ghost = sample_pass("ghost", 1730000000000);
    ghost.quantity = 1;
    assert!(!store::update_pass(&pool, &ghost).await.unwrap());
}

#[tokio::test]
async fn test_delete_records() {
    let (pool, _guard) = create_test_pool().await;

    store::insert_defect(&pool, &sample_defect("d1", 1730000000000))
        .await
        .unwrap();

    assert!(store::delete_defect(&pool, "d1").await.unwrap());
    assert!(
        !store::delete_defect(&pool, "d1").await.unwrap(),
        "Second delete finds nothing"
    );

    let snapshot = store::load_snapshot(&pool).await.unwrap();
    assert!(snapshot.defects.is_empty());
}

#[tokio::test]
async fn test_upsert_is_last_write_wins_by_id() {
    let (pool, _guard) = create_test_pool().await;

    let mut record = sample_downtime("dt1", 1730000000000);
    store::upsert_downtime(&pool, &record).await.unwrap();

    record.duration_minutes = 90;
    record.reason = "Problema mecânico".to_string();
    store::upsert_downtime(&pool, &record).await.unwrap();

    let snapshot = store::load_snapshot(&pool).await.unwrap();
    assert_eq!(snapshot.downtime.len(), 1, "Upsert replaces, never duplicates");
    assert_eq!(snapshot.downtime[0].duration_minutes, 90);
    assert_eq!(snapshot.downtime[0].reason, "Problema mecânico");
}

#[tokio::test]
async fn test_clear_all_empties_collections_but_keeps_metadata() {
    let (pool, _guard) = create_test_pool().await;

    let workspace_id = db::init_workspace_metadata(&pool, "plant-a").await.unwrap();

    store::insert_pass(&pool, &sample_pass("p1", 1730000000000))
        .await
        .unwrap();
    store::insert_defect(&pool, &sample_defect("d1", 1730000000000))
        .await
        .unwrap();
    store::insert_downtime(&pool, &sample_downtime("dt1", 1730000000000))
        .await
        .unwrap();

    store::clear_all(&pool).await.unwrap();

    let (pass, defects, downtime) = store::record_counts(&pool).await.unwrap();
    assert_eq!((pass, defects, downtime), (0, 0, 0));

    let kept_id = db::metadata_value(&pool, "workspace_id").await.unwrap();
    assert_eq!(
        kept_id.as_deref(),
        Some(workspace_id.as_str()),
        "Workspace identity survives the wipe"
    );
}

#[tokio::test]
async fn test_sync_pages_are_stable_and_complete() {
    let (pool, _guard) = create_test_pool().await;

    for i in 0..5 {
        store::insert_pass(&pool, &sample_pass(&format!("p{}", i), 1730000000000 + i))
            .await
            .unwrap();
    }

    let first = store::pass_page(&pool, 2, 0).await.unwrap();
    let second = store::pass_page(&pool, 2, 2).await.unwrap();
    let third = store::pass_page(&pool, 2, 4).await.unwrap();

    assert_eq!(first.len(), 2);
    assert_eq!(second.len(), 2);
    assert_eq!(third.len(), 1);

    let mut ids: Vec<String> = first
        .iter()
        .chain(second.iter())
        .chain(third.iter())
        .map(|r| r.id.clone())
        .collect();
    ids.dedup();
    assert_eq!(ids.len(), 5, "Paging covers every record exactly once");
}

#[tokio::test]
async fn test_workspace_metadata_initialization_and_validation() {
    let (pool, _guard) = create_test_pool().await;

    let workspace_id = db::init_workspace_metadata(&pool, "plant-a").await.unwrap();
    assert!(workspace_id.starts_with("ws_"));

    let version = db::metadata_value(&pool, "version").await.unwrap();
    assert_eq!(version.as_deref(), Some(EXPECTED_DB_VERSION));

    // Re-initializing the same workspace keeps the id
    let again = db::init_workspace_metadata(&pool, "plant-a").await.unwrap();
    assert_eq!(again, workspace_id);

    // A different workspace name is rejected
    let result = db::init_workspace_metadata(&pool, "plant-b").await;
    assert!(result.is_err(), "Workspace name mismatch must fail");
}

#[tokio::test]
async fn test_unsupported_database_version_is_rejected() {
    let (pool, _guard) = create_test_pool().await;

    let sql = quality_track::queries::metadata::insert("version", "999");
    sqlx::query(&sql).execute(&pool).await.unwrap();

    let result = db::init_workspace_metadata(&pool, "plant-a").await;
    assert!(result.is_err(), "Version mismatch must fail");
}
