use sea_query::{Expr, Func, OnConflict, Order, Query, SqliteQueryBuilder};

use crate::records::PassRecord;
use crate::schema::PassRecords;

const ALL_COLUMNS: [PassRecords; 11] = [
    PassRecords::Id,
    PassRecords::TimestampMs,
    PassRecords::Model,
    PassRecords::Area,
    PassRecords::Vin,
    PassRecords::Quantity,
    PassRecords::OperatorId,
    PassRecords::TimeSlot,
    PassRecords::ActingSection,
    PassRecords::Released,
    PassRecords::IsReinspection,
];

fn values_of(record: &PassRecord) -> [sea_query::Value; 11] {
    [
        record.id.clone().into(),
        record.timestamp_ms.into(),
        record.model.as_str().into(),
        record.area.as_str().into(),
        record.vin.clone().into(),
        (record.quantity as i64).into(),
        record.operator_id.clone().into(),
        record.time_slot.clone().into(),
        record.acting_section.clone().into(),
        record.released.clone().into(),
        (record.is_reinspection as i32).into(),
    ]
}

/// INSERT INTO pass_records (...) VALUES (...)
pub fn insert(record: &PassRecord) -> String {
    Query::insert()
        .into_table(PassRecords::Table)
        .columns(ALL_COLUMNS)
        .values_panic(values_of(record).map(Into::into))
        .to_string(SqliteQueryBuilder)
}

/// INSERT ... ON CONFLICT (id) DO UPDATE - full-row replacement by id,
/// used by workspace sync for last-write-wins reconciliation
pub fn upsert(record: &PassRecord) -> String {
    Query::insert()
        .into_table(PassRecords::Table)
        .columns(ALL_COLUMNS)
        .values_panic(values_of(record).map(Into::into))
        .on_conflict(
            OnConflict::column(PassRecords::Id)
                .update_columns([
                    PassRecords::TimestampMs,
                    PassRecords::Model,
                    PassRecords::Area,
                    PassRecords::Vin,
                    PassRecords::Quantity,
                    PassRecords::OperatorId,
                    PassRecords::TimeSlot,
                    PassRecords::ActingSection,
                    PassRecords::Released,
                    PassRecords::IsReinspection,
                ])
                .to_owned(),
        )
        .to_string(SqliteQueryBuilder)
}

/// UPDATE pass_records SET ... WHERE id = ?
pub fn update(record: &PassRecord) -> String {
    Query::update()
        .table(PassRecords::Table)
        .value(PassRecords::TimestampMs, record.timestamp_ms)
        .value(PassRecords::Model, record.model.as_str())
        .value(PassRecords::Area, record.area.as_str())
        .value(PassRecords::Vin, record.vin.clone())
        .value(PassRecords::Quantity, record.quantity as i64)
        .value(PassRecords::OperatorId, record.operator_id.clone())
        .value(PassRecords::TimeSlot, record.time_slot.clone())
        .value(PassRecords::ActingSection, record.acting_section.clone())
        .value(PassRecords::Released, record.released.clone())
        .value(PassRecords::IsReinspection, record.is_reinspection as i32)
        .and_where(Expr::col(PassRecords::Id).eq(record.id.clone()))
        .to_string(SqliteQueryBuilder)
}

/// SELECT * FROM pass_records ORDER BY timestamp_ms DESC
pub fn select_all() -> String {
    Query::select()
        .columns(ALL_COLUMNS)
        .from(PassRecords::Table)
        .order_by(PassRecords::TimestampMs, Order::Desc)
        .to_string(SqliteQueryBuilder)
}

/// SELECT * FROM pass_records ORDER BY id LIMIT ? OFFSET ?
/// Stable paging for workspace sync pulls
pub fn select_page(limit: u64, offset: u64) -> String {
    Query::select()
        .columns(ALL_COLUMNS)
        .from(PassRecords::Table)
        .order_by(PassRecords::Id, Order::Asc)
        .limit(limit)
        .offset(offset)
        .to_string(SqliteQueryBuilder)
}

/// DELETE FROM pass_records WHERE id = ?
pub fn delete(id: &str) -> String {
    Query::delete()
        .from_table(PassRecords::Table)
        .and_where(Expr::col(PassRecords::Id).eq(id))
        .to_string(SqliteQueryBuilder)
}

/// DELETE FROM pass_records
pub fn delete_all() -> String {
    Query::delete()
        .from_table(PassRecords::Table)
        .to_string(SqliteQueryBuilder)
}

/// SELECT COUNT(*) FROM pass_records
pub fn count() -> String {
    Query::select()
        .expr(Func::count(Expr::col(PassRecords::Id)))
        .from(PassRecords::Table)
        .to_string(SqliteQueryBuilder)
}
