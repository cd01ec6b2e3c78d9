use sea_query::{Expr, Func, OnConflict, Order, Query, SqliteQueryBuilder};

use crate::records::DefectRecord;
use crate::schema::DefectRecords;

const ALL_COLUMNS: [DefectRecords; 12] = [
    DefectRecords::Id,
    DefectRecords::TimestampMs,
    DefectRecords::Model,
    DefectRecords::Area,
    DefectRecords::Vin,
    DefectRecords::Defect,
    DefectRecords::Quantity,
    DefectRecords::OperatorId,
    DefectRecords::TimeSlot,
    DefectRecords::ActingSection,
    DefectRecords::Released,
    DefectRecords::IsReinspection,
];

fn values_of(record: &DefectRecord) -> [sea_query::Value; 12] {
    [
        record.id.clone().into(),
        record.timestamp_ms.into(),
        record.model.as_str().into(),
        record.area.as_str().into(),
        record.vin.clone().into(),
        record.defect.clone().into(),
        (record.quantity as i64).into(),
        record.operator_id.clone().into(),
        record.time_slot.clone().into(),
        record.acting_section.clone().into(),
        record.released.clone().into(),
        (record.is_reinspection as i32).into(),
    ]
}

/// INSERT INTO defect_records (...) VALUES (...)
pub fn insert(record: &DefectRecord) -> String {
    Query::insert()
        .into_table(DefectRecords::Table)
        .columns(ALL_COLUMNS)
        .values_panic(values_of(record).map(Into::into))
        .to_string(SqliteQueryBuilder)
}

/// INSERT ... ON CONFLICT (id) DO UPDATE - full-row replacement by id,
/// used by workspace sync for last-write-wins reconciliation
pub fn upsert(record: &DefectRecord) -> String {
    Query::insert()
        .into_table(DefectRecords::Table)
        .columns(ALL_COLUMNS)
        .values_panic(values_of(record).map(Into::into))
        .on_conflict(
            OnConflict::column(DefectRecords::Id)
                .update_columns([
                    DefectRecords::TimestampMs,
                    DefectRecords::Model,
                    DefectRecords::Area,
                    DefectRecords::Vin,
                    DefectRecords::Defect,
                    DefectRecords::Quantity,
                    DefectRecords::OperatorId,
                    DefectRecords::TimeSlot,
                    DefectRecords::ActingSection,
                    DefectRecords::Released,
                    DefectRecords::IsReinspection,
                ])
                .to_owned(),
        )
        .to_string(SqliteQueryBuilder)
}

/// UPDATE defect_records SET ... WHERE id = ?
pub fn update(record: &DefectRecord) -> String {
    Query::update()
        .table(DefectRecords::Table)
        .value(DefectRecords::TimestampMs, record.timestamp_ms)
        .value(DefectRecords::Model, record.model.as_str())
        .value(DefectRecords::Area, record.area.as_str())
        .value(DefectRecords::Vin, record.vin.clone())
        .value(DefectRecords::Defect, record.defect.clone())
        .value(DefectRecords::Quantity, record.quantity as i64)
        .value(DefectRecords::OperatorId, record.operator_id.clone())
        .value(DefectRecords::TimeSlot, record.time_slot.clone())
        .value(DefectRecords::ActingSection, record.acting_section.clone())
        .value(DefectRecords::Released, record.released.clone())
        .value(DefectRecords::IsReinspection, record.is_reinspection as i32)
        .and_where(Expr::col(DefectRecords::Id).eq(record.id.clone()))
        .to_string(SqliteQueryBuilder)
}

/// SELECT * FROM defect_records ORDER BY timestamp_ms DESC
pub fn select_all() -> String {
    Query::select()
        .columns(ALL_COLUMNS)
        .from(DefectRecords::Table)
        .order_by(DefectRecords::TimestampMs, Order::Desc)
        .to_string(SqliteQueryBuilder)
}

/// SELECT * FROM defect_records ORDER BY id LIMIT ? OFFSET ?
/// Stable paging for workspace sync pulls
pub fn select_page(limit: u64, offset: u64) -> String {
    Query::select()
        .columns(ALL_COLUMNS)
        .from(DefectRecords::Table)
        .order_by(DefectRecords::Id, Order::Asc)
        .limit(limit)
        .offset(offset)
        .to_string(SqliteQueryBuilder)
}

/// DELETE FROM defect_records WHERE id = ?
pub fn delete(id: &str) -> String {
    Query::delete()
        .from_table(DefectRecords::Table)
        .and_where(Expr::col(DefectRecords::Id).eq(id))
        .to_string(SqliteQueryBuilder)
}

/// DELETE FROM defect_records
pub fn delete_all() -> String {
    Query::delete()
        .from_table(DefectRecords::Table)
        .to_string(SqliteQueryBuilder)
}

/// SELECT COUNT(*) FROM defect_records
pub fn count() -> String {
    Query::select()
        .expr(Func::count(Expr::col(DefectRecords::Id)))
        .from(DefectRecords::Table)
        .to_string(SqliteQueryBuilder)
}
