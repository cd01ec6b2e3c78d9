//! # Workspace Sync Tests
//!
//! End-to-end pull replication: a remote workspace server is started in its
//! own thread and a sync-mode configuration pulls its records into a local
//! replica. Runs as a plain test because the sync client is blocking.

use std::sync::mpsc;
use std::sync::Arc;

use quality_track::config::{AppConfig, ConfigType, SyncSection};
use quality_track::records::{Area, CarModel, PassRecord};
use quality_track::serve::{build_router, AppState};
use quality_track::sync::sync_workspace;
use quality_track::{db, store};

fn sample_pass(id: &str, timestamp_ms: i64) -> PassRecord {
    PassRecord {
        id: id.to_string(),
        timestamp_ms,
        model: CarModel::Eqe,
        area: Area::LinhaOk,
        vin: format!("9BW{}", id.to_uppercase()),
        quantity: 1,
        operator_id: "1001".to_string(),
        time_slot: "08:00 as 09:00".to_string(),
        acting_section: None,
        released: None,
        is_reinspection: false,
    }
}

/// Start a remote workspace server in a background thread and return its URL
fn start_remote(workspace: &str, record_count: usize) -> String {
    let workspace = workspace.to_string();
    let (tx, rx) = mpsc::channel();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async move {
            let (pool, _guard) = db::create_test_connection_in_temporary_file()
                .await
                .unwrap();
            db::init_database_schema(&pool).await.unwrap();
            let workspace_id = db::init_workspace_metadata(&pool, &workspace)
                .await
                .unwrap();

            for i in 0..record_count {
                store::insert_pass(&pool, &sample_pass(&format!("p{}", i), 1730000000000 + i as i64))
                    .await
                    .unwrap();
            }

            let app = build_router(Arc::new(AppState {
                pool,
                workspace,
                workspace_id,
            }));

            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tx.send(format!("http://{}", addr)).unwrap();
            axum::serve(listener, app).await.unwrap();
        });
    });

    rx.recv().unwrap()
}

fn sync_config(workspace: &str, remote_url: &str, dir: &tempfile::TempDir) -> AppConfig {
    AppConfig {
        config_type: ConfigType::Sync,
        workspace: workspace.to_string(),
        output_dir: Some(dir.path().to_path_buf()),
        api_port: 3000,
        sync: Some(SyncSection {
            remote_url: remote_url.to_string(),
            // Small chunks so the test exercises the paging loop
            chunk_size: Some(2),
        }),
    }
}

#[test]
fn test_sync_pulls_all_records_in_chunks() {
    let remote_url = start_remote("plant-a", 5);
    let local_dir = tempfile::tempdir().unwrap();
    let config = sync_config("plant-a", &remote_url, &local_dir);

    let summary = sync_workspace(&config).unwrap();
    assert_eq!(summary.pass, 5);
    assert_eq!(summary.defects, 0);
    assert_eq!(summary.downtime, 0);

    // The local replica holds every record exactly once
    let rt = tokio::runtime::Runtime::new().unwrap();
    let snapshot = rt.block_on(async {
        let pool = db::open_database_pool(&config.database_path()).await.unwrap();
        store::load_snapshot(&pool).await.unwrap()
    });
    assert_eq!(snapshot.pass.len(), 5);

    // A second sync is idempotent thanks to upsert-by-id
    let summary = sync_workspace(&config).unwrap();
    assert_eq!(summary.pass, 5);

    let snapshot = rt.block_on(async {
        let pool = db::open_database_pool(&config.database_path()).await.unwrap();
        store::load_snapshot(&pool).await.unwrap()
    });
    assert_eq!(snapshot.pass.len(), 5, "No duplicates after re-sync");
}

#[test]
fn test_sync_rejects_workspace_mismatch() {
    let remote_url = start_remote("plant-a", 1);
    let local_dir = tempfile::tempdir().unwrap();
    let config = sync_config("plant-b", &remote_url, &local_dir);

    let result = sync_workspace(&config);
    assert!(
        result.is_err(),
        "Pulling another plant's workspace must fail"
    );
}
