use sea_query::{ColumnDef, Index, SqliteQueryBuilder, Table};

use crate::schema::{DefectRecords, DowntimeRecords, Metadata, PassRecords};

/// CREATE TABLE IF NOT EXISTS metadata (key TEXT PRIMARY KEY, value TEXT NOT NULL)
pub fn create_metadata_table() -> String {
    Table::create()
        .table(Metadata::Table)
        .if_not_exists()
        .col(ColumnDef::new(Metadata::Key).string().primary_key())
        .col(ColumnDef::new(Metadata::Value).string().not_null())
        .to_string(SqliteQueryBuilder)
}

/// CREATE TABLE IF NOT EXISTS pass_records (
///     id TEXT PRIMARY KEY,
///     timestamp_ms INTEGER NOT NULL,
///     model TEXT NOT NULL,
///     area TEXT NOT NULL,
///     vin TEXT NOT NULL,
///     quantity INTEGER NOT NULL,
///     operator_id TEXT NOT NULL,
///     time_slot TEXT NOT NULL,
///     acting_section TEXT,
///     released TEXT,
///     is_reinspection INTEGER NOT NULL DEFAULT 0
/// )
pub fn create_pass_records_table() -> String {
    Table::create()
        .table(PassRecords::Table)
        .if_not_exists()
        .col(ColumnDef::new(PassRecords::Id).string().primary_key())
        .col(
            ColumnDef::new(PassRecords::TimestampMs)
                .big_integer()
                .not_null(),
        )
        .col(ColumnDef::new(PassRecords::Model).string().not_null())
        .col(ColumnDef::new(PassRecords::Area).string().not_null())
        .col(ColumnDef::new(PassRecords::Vin).string().not_null())
        .col(ColumnDef::new(PassRecords::Quantity).integer().not_null())
        .col(ColumnDef::new(PassRecords::OperatorId).string().not_null())
        .col(ColumnDef::new(PassRecords::TimeSlot).string().not_null())
        .col(ColumnDef::new(PassRecords::ActingSection).string())
        .col(ColumnDef::new(PassRecords::Released).string())
        .col(
            ColumnDef::new(PassRecords::IsReinspection)
                .integer()
                .not_null()
                .default(0),
        )
        .to_string(SqliteQueryBuilder)
}

/// CREATE TABLE IF NOT EXISTS defect_records - pass_records shape plus the
/// defect description column
pub fn create_defect_records_table() -> String {
    Table::create()
        .table(DefectRecords::Table)
        .if_not_exists()
        .col(ColumnDef::new(DefectRecords::Id).string().primary_key())
        .col(
            ColumnDef::new(DefectRecords::TimestampMs)
                .big_integer()
                .not_null(),
        )
        .col(ColumnDef::new(DefectRecords::Model).string().not_null())
        .col(ColumnDef::new(DefectRecords::Area).string().not_null())
        .col(ColumnDef::new(DefectRecords::Vin).string().not_null())
        .col(ColumnDef::new(DefectRecords::Defect).string().not_null())
        .col(ColumnDef::new(DefectRecords::Quantity).integer().not_null())
        .col(
            ColumnDef::new(DefectRecords::OperatorId)
                .string()
                .not_null(),
        )
        .col(ColumnDef::new(DefectRecords::TimeSlot).string().not_null())
        .col(ColumnDef::new(DefectRecords::ActingSection).string())
        .col(ColumnDef::new(DefectRecords::Released).string())
        .col(
            ColumnDef::new(DefectRecords::IsReinspection)
                .integer()
                .not_null()
                .default(0),
        )
        .to_string(SqliteQueryBuilder)
}

/// CREATE TABLE IF NOT EXISTS downtime_records (
///     id TEXT PRIMARY KEY,
///     timestamp_ms INTEGER NOT NULL,
///     area TEXT NOT NULL,
///     start_time TEXT NOT NULL,
///     end_time TEXT NOT NULL,
///     duration_minutes INTEGER NOT NULL,
///     reason TEXT NOT NULL,
///     operator_id TEXT
/// )
pub fn create_downtime_records_table() -> String {
    Table::create()
        .table(DowntimeRecords::Table)
        .if_not_exists()
        .col(ColumnDef::new(DowntimeRecords::Id).string().primary_key())
        .col(
            ColumnDef::new(DowntimeRecords::TimestampMs)
                .big_integer()
                .not_null(),
        )
        .col(ColumnDef::new(DowntimeRecords::Area).string().not_null())
        .col(
            ColumnDef::new(DowntimeRecords::StartTime)
                .string()
                .not_null(),
        )
        .col(ColumnDef::new(DowntimeRecords::EndTime).string().not_null())
        .col(
            ColumnDef::new(DowntimeRecords::DurationMinutes)
                .integer()
                .not_null(),
        )
        .col(ColumnDef::new(DowntimeRecords::Reason).string().not_null())
        .col(ColumnDef::new(DowntimeRecords::OperatorId).string())
        .to_string(SqliteQueryBuilder)
}

/// CREATE INDEX IF NOT EXISTS idx_pass_records_timestamp ON pass_records(timestamp_ms)
pub fn create_pass_records_timestamp_index() -> String {
    Index::create()
        .if_not_exists()
        .name("idx_pass_records_timestamp")
        .table(PassRecords::Table)
        .col(PassRecords::TimestampMs)
        .to_string(SqliteQueryBuilder)
}

/// CREATE INDEX IF NOT EXISTS idx_defect_records_timestamp ON defect_records(timestamp_ms)
pub fn create_defect_records_timestamp_index() -> String {
    Index::create()
        .if_not_exists()
        .name("idx_defect_records_timestamp")
        .table(DefectRecords::Table)
        .col(DefectRecords::TimestampMs)
        .to_string(SqliteQueryBuilder)
}

/// CREATE INDEX IF NOT EXISTS idx_downtime_records_timestamp ON downtime_records(timestamp_ms)
pub fn create_downtime_records_timestamp_index() -> String {
    Index::create()
        .if_not_exists()
        .name("idx_downtime_records_timestamp")
        .table(DowntimeRecords::Table)
        .col(DowntimeRecords::TimestampMs)
        .to_string(SqliteQueryBuilder)
}
