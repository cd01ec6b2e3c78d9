pub mod ddl;
pub mod defect_records;
pub mod downtime_records;
pub mod metadata;
pub mod pass_records;
