use sea_query::{Expr, Func, OnConflict, Order, Query, SqliteQueryBuilder};

use crate::records::DowntimeRecord;
use crate::schema::DowntimeRecords;

const ALL_COLUMNS: [DowntimeRecords; 8] = [
    DowntimeRecords::Id,
    DowntimeRecords::TimestampMs,
    DowntimeRecords::Area,
    DowntimeRecords::StartTime,
    DowntimeRecords::EndTime,
    DowntimeRecords::DurationMinutes,
    DowntimeRecords::Reason,
    DowntimeRecords::OperatorId,
];

fn values_of(record: &DowntimeRecord) -> [sea_query::Value; 8] {
    [
        record.id.clone().into(),
        record.timestamp_ms.into(),
        record.area.as_str().into(),
        record.start_time.clone().into(),
        record.end_time.clone().into(),
        (record.duration_minutes as i64).into(),
        record.reason.clone().into(),
        record.operator_id.clone().into(),
    ]
}

/// INSERT INTO downtime_records (...) VALUES (...)
pub fn insert(record: &DowntimeRecord) -> String {
    Query::insert()
        .into_table(DowntimeRecords::Table)
        .columns(ALL_COLUMNS)
        .values_panic(values_of(record).map(Into::into))
        .to_string(SqliteQueryBuilder)
}

/// INSERT ... ON CONFLICT (id) DO UPDATE - full-row replacement by id,
/// used by workspace sync for last-write-wins reconciliation
pub fn upsert(record: &DowntimeRecord) -> String {
    Query::insert()
        .into_table(DowntimeRecords::Table)
        .columns(ALL_COLUMNS)
        .values_panic(values_of(record).map(Into::into))
        .on_conflict(
            OnConflict::column(DowntimeRecords::Id)
                .update_columns([
                    DowntimeRecords::TimestampMs,
                    DowntimeRecords::Area,
                    DowntimeRecords::StartTime,
                    DowntimeRecords::EndTime,
                    DowntimeRecords::DurationMinutes,
                    DowntimeRecords::Reason,
                    DowntimeRecords::OperatorId,
                ])
                .to_owned(),
        )
        .to_string(SqliteQueryBuilder)
}

/// SELECT * FROM downtime_records ORDER BY timestamp_ms DESC
pub fn select_all() -> String {
    Query::select()
        .columns(ALL_COLUMNS)
        .from(DowntimeRecords::Table)
        .order_by(DowntimeRecords::TimestampMs, Order::Desc)
        .to_string(SqliteQueryBuilder)
}

/// SELECT * FROM downtime_records ORDER BY id LIMIT ? OFFSET ?
/// Stable paging for workspace sync pulls
pub fn select_page(limit: u64, offset: u64) -> String {
    Query::select()
        .columns(ALL_COLUMNS)
        .from(DowntimeRecords::Table)
        .order_by(DowntimeRecords::Id, Order::Asc)
        .limit(limit)
        .offset(offset)
        .to_string(SqliteQueryBuilder)
}

/// DELETE FROM downtime_records WHERE id = ?
pub fn delete(id: &str) -> String {
    Query::delete()
        .from_table(DowntimeRecords::Table)
        .and_where(Expr::col(DowntimeRecords::Id).eq(id))
        .to_string(SqliteQueryBuilder)
}

/// DELETE FROM downtime_records
pub fn delete_all() -> String {
    Query::delete()
        .from_table(DowntimeRecords::Table)
        .to_string(SqliteQueryBuilder)
}

/// SELECT COUNT(*) FROM downtime_records
pub fn count() -> String {
    Query::select()
        .expr(Func::count(Expr::col(DowntimeRecords::Id)))
        .from(DowntimeRecords::Table)
        .to_string(SqliteQueryBuilder)
}
