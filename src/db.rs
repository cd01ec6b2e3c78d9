use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::Path;

use crate::constants::{generate_workspace_unique_id, EXPECTED_DB_VERSION};
use crate::queries::{ddl, metadata};

/// Open a file-based workspace database for production use
/// Enables WAL mode and creates the file when missing
pub async fn open_database_pool(
    db_path: &Path,
) -> Result<SqlitePool, Box<dyn std::error::Error + Send + Sync>> {
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Create all tables and indexes if they do not exist yet
pub async fn init_database_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let statements = [
        ddl::create_metadata_table(),
        ddl::create_pass_records_table(),
        ddl::create_defect_records_table(),
        ddl::create_downtime_records_table(),
        ddl::create_pass_records_timestamp_index(),
        ddl::create_defect_records_timestamp_index(),
        ddl::create_downtime_records_timestamp_index(),
    ];

    for sql in statements {
        sqlx::query(&sql).execute(pool).await?;
    }

    Ok(())
}

/// SELECT value FROM metadata WHERE key = ?
pub async fn metadata_value(
    pool: &SqlitePool,
    key: &str,
) -> Result<Option<String>, sqlx::Error> {
    let sql = metadata::select_by_key(key);
    let row = sqlx::query(&sql).fetch_optional(pool).await?;
    Ok(row.map(|r| r.get(0)))
}

/// Validate or initialize workspace metadata.
///
/// A fresh database gets the expected version, the configured workspace name
/// and a new unique workspace id. An existing database must match both the
/// version and the configured workspace name.
///
/// Returns the workspace unique id.
pub async fn init_workspace_metadata(
    pool: &SqlitePool,
    workspace: &str,
) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
    let existing_version = metadata_value(pool, "version").await?;

    match existing_version {
        Some(version) => {
            if version != EXPECTED_DB_VERSION {
                return Err(format!(
                    "Unsupported database version: '{}'. This application only supports version '{}'",
                    version, EXPECTED_DB_VERSION
                )
                .into());
            }

            let db_workspace = metadata_value(pool, "workspace").await?;
            if let Some(ref db_workspace) = db_workspace {
                if db_workspace != workspace {
                    return Err(format!(
                        "Config mismatch: database belongs to workspace '{}' but config specifies '{}'",
                        db_workspace, workspace
                    )
                    .into());
                }
            }

            metadata_value(pool, "workspace_id")
                .await?
                .ok_or_else(|| "Database is missing workspace_id in metadata".into())
        }
        None => {
            let workspace_id = generate_workspace_unique_id();

            for (key, value) in [
                ("version", EXPECTED_DB_VERSION),
                ("workspace", workspace),
                ("workspace_id", workspace_id.as_str()),
            ] {
                let sql = metadata::insert(key, value);
                sqlx::query(&sql).execute(pool).await?;
            }

            Ok(workspace_id)
        }
    }
}

/// Create an in-memory database pool for testing
pub async fn create_test_connection_in_memory() -> SqlitePool {
    let options = SqliteConnectOptions::new().in_memory(true);

    SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("Failed to create in-memory database")
}

/// Create a file-based database pool in a temporary directory for testing.
/// The TempDir guard must be kept alive for the duration of the test.
pub async fn create_test_connection_in_temporary_file(
) -> Result<(SqlitePool, tempfile::TempDir), Box<dyn std::error::Error + Send + Sync>> {
    let dir = tempfile::tempdir()?;
    let db_path = dir.path().join("workspace.sqlite");
    let pool = open_database_pool(&db_path).await?;
    Ok((pool, dir))
}
