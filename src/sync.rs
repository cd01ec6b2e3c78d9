//! Pull-based workspace replication.
//!
//! A sync-mode instance pulls the full record set of a remote workspace in
//! chunks and upserts it locally by record id. Reconciliation is
//! last-write-wins at row granularity; the aggregation engine only ever sees
//! the materialized local snapshot.

use log::info;
use reqwest::blocking::Client;
use sqlx::SqlitePool;

use crate::config::AppConfig;
use crate::constants::EXPECTED_DB_VERSION;
use crate::db;
use crate::records::{DefectRecord, DowntimeRecord, PassRecord};
use crate::serve::WorkspaceInfo;
use crate::store;

/// Default chunk size for batch fetching
pub const DEFAULT_CHUNK_SIZE: u64 = 200;

/// Records pulled per collection during one sync run
#[derive(Debug, Default)]
pub struct SyncSummary {
    pub pass: u64,
    pub defects: u64,
    pub downtime: u64,
}

fn fetch_page<T: serde::de::DeserializeOwned>(
    client: &Client,
    remote_url: &str,
    collection: &str,
    limit: u64,
    offset: u64,
) -> Result<Vec<T>, Box<dyn std::error::Error>> {
    let url = format!(
        "{}/api/sync/records/{}?limit={}&offset={}",
        remote_url.trim_end_matches('/'),
        collection,
        limit,
        offset
    );
    let records = client
        .get(&url)
        .send()?
        .error_for_status()
        .map_err(|e| format!("Remote returned an error for {}: {}", collection, e))?
        .json()?;
    Ok(records)
}

/// Sync one workspace from the configured remote.
/// Validates the remote's version and workspace name before pulling.
pub fn sync_workspace(config: &AppConfig) -> Result<SyncSummary, Box<dyn std::error::Error>> {
    let sync_config = config
        .sync
        .as_ref()
        .ok_or("Sync requires the [sync] section in config")?;
    let remote_url = sync_config.remote_url.trim_end_matches('/').to_string();
    let chunk_size = sync_config.chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE).max(1);

    let client = Client::new();

    println!("Syncing workspace '{}' from {}", config.workspace, remote_url);

    let remote: WorkspaceInfo = client
        .get(format!("{}/api/sync/workspace", remote_url))
        .send()?
        .error_for_status()
        .map_err(|e| format!("Failed to read remote workspace metadata: {}", e))?
        .json()?;

    if remote.version != EXPECTED_DB_VERSION {
        return Err(format!(
            "Remote database version '{}' does not match expected version '{}'",
            remote.version, EXPECTED_DB_VERSION
        )
        .into());
    }

    if remote.workspace != config.workspace {
        return Err(format!(
            "Remote serves workspace '{}' but config specifies '{}'",
            remote.workspace, config.workspace
        )
        .into());
    }

    let db_path = config.database_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let rt = tokio::runtime::Runtime::new()?;

    let pool = rt.block_on(async {
        let pool = db::open_database_pool(&db_path)
            .await
            .map_err(|e| format!("Failed to open database: {}", e))?;
        db::init_database_schema(&pool)
            .await
            .map_err(|e| format!("Failed to initialize schema: {}", e))?;
        db::init_workspace_metadata(&pool, &config.workspace)
            .await
            .map_err(|e| format!("Workspace metadata error: {}", e))?;
        Ok::<SqlitePool, String>(pool)
    })?;

    // Pin the local replica to its source workspace so a later sync against
    // a different plant's remote fails loudly instead of merging datasets.
    rt.block_on(validate_source_workspace(&pool, &remote.workspace_id))?;

    let mut summary = SyncSummary::default();

    let mut offset = 0u64;
    loop {
        let page: Vec<PassRecord> =
            fetch_page(&client, &remote_url, "pass", chunk_size, offset)?;
        let fetched = page.len() as u64;
        rt.block_on(async {
            for record in &page {
                store::upsert_pass(&pool, record).await?;
            }
            Ok::<(), sqlx::Error>(())
        })?;
        summary.pass += fetched;
        offset += fetched;
        if fetched < chunk_size {
            break;
        }
    }

    let mut offset = 0u64;
    loop {
        let page: Vec<DefectRecord> =
            fetch_page(&client, &remote_url, "defects", chunk_size, offset)?;
        let fetched = page.len() as u64;
        rt.block_on(async {
            for record in &page {
                store::upsert_defect(&pool, record).await?;
            }
            Ok::<(), sqlx::Error>(())
        })?;
        summary.defects += fetched;
        offset += fetched;
        if fetched < chunk_size {
            break;
        }
    }

    let mut offset = 0u64;
    loop {
        let page: Vec<DowntimeRecord> =
            fetch_page(&client, &remote_url, "downtime", chunk_size, offset)?;
        let fetched = page.len() as u64;
        rt.block_on(async {
            for record in &page {
                store::upsert_downtime(&pool, record).await?;
            }
            Ok::<(), sqlx::Error>(())
        })?;
        summary.downtime += fetched;
        offset += fetched;
        if fetched < chunk_size {
            break;
        }
    }

    info!(
        "Sync complete: {} pass, {} defect, {} downtime records",
        summary.pass, summary.defects, summary.downtime
    );

    Ok(summary)
}

async fn validate_source_workspace(
    pool: &SqlitePool,
    remote_workspace_id: &str,
) -> Result<(), String> {
    let existing = db::metadata_value(pool, "source_workspace_id")
        .await
        .map_err(|e| format!("Database error: {}", e))?;

    match existing {
        Some(source_id) if source_id != remote_workspace_id => Err(format!(
            "This replica was synced from workspace id '{}' but the remote is '{}'",
            source_id, remote_workspace_id
        )),
        Some(_) => Ok(()),
        None => {
            let sql = crate::queries::metadata::upsert("source_workspace_id", remote_workspace_id);
            sqlx::query(&sql)
                .execute(pool)
                .await
                .map_err(|e| format!("Database error: {}", e))?;
            Ok(())
        }
    }
}
