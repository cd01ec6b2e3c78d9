//! Event store operations over the workspace database.
//!
//! The three record collections are append-mostly: operators add entries,
//! occasionally edit or delete them, and a manager can clear the whole
//! workspace. The aggregation engine never touches the store directly - it
//! only receives snapshots loaded here.

use log::warn;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::queries::{defect_records, downtime_records, pass_records};
use crate::records::{Area, CarModel, DefectRecord, DowntimeRecord, PassRecord};

/// A materialized snapshot of the three record collections
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub pass: Vec<PassRecord>,
    pub defects: Vec<DefectRecord>,
    pub downtime: Vec<DowntimeRecord>,
}

fn pass_from_row(row: &SqliteRow) -> Option<PassRecord> {
    let area: String = row.get(3);
    let model: String = row.get(2);
    let (Some(area), Some(model)) = (Area::from_str(&area), CarModel::from_str(&model)) else {
        warn!("Skipping pass record with unknown area '{}' or model '{}'", area, model);
        return None;
    };
    Some(PassRecord {
        id: row.get(0),
        timestamp_ms: row.get(1),
        model,
        area,
        vin: row.get(4),
        quantity: row.get::<i64, _>(5).max(0) as u32,
        operator_id: row.get(6),
        time_slot: row.get(7),
        acting_section: row.get(8),
        released: row.get(9),
        is_reinspection: row.get::<i64, _>(10) != 0,
    })
}

fn defect_from_row(row: &SqliteRow) -> Option<DefectRecord> {
    let area: String = row.get(3);
    let model: String = row.get(2);
    let (Some(area), Some(model)) = (Area::from_str(&area), CarModel::from_str(&model)) else {
        warn!("Skipping defect record with unknown area '{}' or model '{}'", area, model);
        return None;
    };
    Some(DefectRecord {
        id: row.get(0),
        timestamp_ms: row.get(1),
        model,
        area,
        vin: row.get(4),
        defect: row.get(5),
        quantity: row.get::<i64, _>(6).max(0) as u32,
        operator_id: row.get(7),
        time_slot: row.get(8),
        acting_section: row.get(9),
        released: row.get(10),
        is_reinspection: row.get::<i64, _>(11) != 0,
    })
}

fn downtime_from_row(row: &SqliteRow) -> Option<DowntimeRecord> {
    let area: String = row.get(2);
    let Some(area) = Area::from_str(&area) else {
        warn!("Skipping downtime record with unknown area '{}'", area);
        return None;
    };
    Some(DowntimeRecord {
        id: row.get(0),
        timestamp_ms: row.get(1),
        area,
        start_time: row.get(3),
        end_time: row.get(4),
        duration_minutes: row.get::<i64, _>(5).max(0) as u32,
        reason: row.get(6),
        operator_id: row.get(7),
    })
}

/// Load the current snapshot of all three collections, newest first
pub async fn load_snapshot(pool: &SqlitePool) -> Result<Snapshot, sqlx::Error> {
    let sql = pass_records::select_all();
    let pass = sqlx::query(&sql)
        .fetch_all(pool)
        .await?
        .iter()
        .filter_map(pass_from_row)
        .collect();

    let sql = defect_records::select_all();
    let defects = sqlx::query(&sql)
        .fetch_all(pool)
        .await?
        .iter()
        .filter_map(defect_from_row)
        .collect();

    let sql = downtime_records::select_all();
    let downtime = sqlx::query(&sql)
        .fetch_all(pool)
        .await?
        .iter()
        .filter_map(downtime_from_row)
        .collect();

    Ok(Snapshot {
        pass,
        defects,
        downtime,
    })
}

pub async fn insert_pass(pool: &SqlitePool, record: &PassRecord) -> Result<(), sqlx::Error> {
    let sql = pass_records::insert(record);
    sqlx::query(&sql).execute(pool).await?;
    Ok(())
}

/// Full-row update by id. Returns false when no record with that id exists.
pub async fn update_pass(pool: &SqlitePool, record: &PassRecord) -> Result<bool, sqlx::Error> {
    let sql = pass_records::update(record);
    let result = sqlx::query(&sql).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

pub async fn upsert_pass(pool: &SqlitePool, record: &PassRecord) -> Result<(), sqlx::Error> {
    let sql = pass_records::upsert(record);
    sqlx::query(&sql).execute(pool).await?;
    Ok(())
}

pub async fn delete_pass(pool: &SqlitePool, id: &str) -> Result<bool, sqlx::Error> {
    let sql = pass_records::delete(id);
    let result = sqlx::query(&sql).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

pub async fn insert_defect(pool: &SqlitePool, record: &DefectRecord) -> Result<(), sqlx::Error> {
    let sql = defect_records::insert(record);
    sqlx::query(&sql).execute(pool).await?;
    Ok(())
}

/// Full-row update by id. Returns false when no record with that id exists.
pub async fn update_defect(
    pool: &SqlitePool,
    record: &DefectRecord,
) -> Result<bool, sqlx::Error> {
    let sql = defect_records::update(record);
    let result = sqlx::query(&sql).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

pub async fn upsert_defect(pool: &SqlitePool, record: &DefectRecord) -> Result<(), sqlx::Error> {
    let sql = defect_records::upsert(record);
    sqlx::query(&sql).execute(pool).await?;
    Ok(())
}

pub async fn delete_defect(pool: &SqlitePool, id: &str) -> Result<bool, sqlx::Error> {
    let sql = defect_records::delete(id);
    let result = sqlx::query(&sql).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

pub async fn insert_downtime(
    pool: &SqlitePool,
    record: &DowntimeRecord,
) -> Result<(), sqlx::Error> {
    let sql = downtime_records::insert(record);
    sqlx::query(&sql).execute(pool).await?;
    Ok(())
}

pub async fn upsert_downtime(
    pool: &SqlitePool,
    record: &DowntimeRecord,
) -> Result<(), sqlx::Error> {
    let sql = downtime_records::upsert(record);
    sqlx::query(&sql).execute(pool).await?;
    Ok(())
}

pub async fn delete_downtime(pool: &SqlitePool, id: &str) -> Result<bool, sqlx::Error> {
    let sql = downtime_records::delete(id);
    let result = sqlx::query(&sql).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

/// Empty all three record collections for this workspace.
/// Metadata is kept so the workspace identity survives the wipe.
pub async fn clear_all(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for sql in [
        pass_records::delete_all(),
        defect_records::delete_all(),
        downtime_records::delete_all(),
    ] {
        sqlx::query(&sql).execute(pool).await?;
    }
    Ok(())
}

/// Record counts per collection: (pass, defects, downtime)
pub async fn record_counts(pool: &SqlitePool) -> Result<(i64, i64, i64), sqlx::Error> {
    let sql = pass_records::count();
    let pass: i64 = sqlx::query(&sql).fetch_one(pool).await?.get(0);

    let sql = defect_records::count();
    let defects: i64 = sqlx::query(&sql).fetch_one(pool).await?.get(0);

    let sql = downtime_records::count();
    let downtime: i64 = sqlx::query(&sql).fetch_one(pool).await?.get(0);

    Ok((pass, defects, downtime))
}

/// One page of each collection for sync pulls, ordered by id
pub async fn pass_page(
    pool: &SqlitePool,
    limit: u64,
    offset: u64,
) -> Result<Vec<PassRecord>, sqlx::Error> {
    let sql = pass_records::select_page(limit, offset);
    let rows = sqlx::query(&sql).fetch_all(pool).await?;
    Ok(rows.iter().filter_map(pass_from_row).collect())
}

pub async fn defect_page(
    pool: &SqlitePool,
    limit: u64,
    offset: u64,
) -> Result<Vec<DefectRecord>, sqlx::Error> {
    let sql = defect_records::select_page(limit, offset);
    let rows = sqlx::query(&sql).fetch_all(pool).await?;
    Ok(rows.iter().filter_map(defect_from_row).collect())
}

pub async fn downtime_page(
    pool: &SqlitePool,
    limit: u64,
    offset: u64,
) -> Result<Vec<DowntimeRecord>, sqlx::Error> {
    let sql = downtime_records::select_page(limit, offset);
    let rows = sqlx::query(&sql).fetch_all(pool).await?;
    Ok(rows.iter().filter_map(downtime_from_row).collect())
}
