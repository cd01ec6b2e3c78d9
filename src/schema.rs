use sea_query::Iden;

/// Metadata table - key-value store for workspace configuration
#[derive(Iden)]
pub enum Metadata {
    Table,
    Key,
    Value,
}

/// Pass records table - approved inspection events
#[derive(Iden)]
pub enum PassRecords {
    Table,
    Id,
    TimestampMs,
    Model,
    Area,
    Vin,
    Quantity,
    OperatorId,
    TimeSlot,
    ActingSection,
    Released,
    IsReinspection,
}

/// Defect records table - rejected inspection events
#[derive(Iden)]
pub enum DefectRecords {
    Table,
    Id,
    TimestampMs,
    Model,
    Area,
    Vin,
    Defect,
    Quantity,
    OperatorId,
    TimeSlot,
    ActingSection,
    Released,
    IsReinspection,
}

/// Downtime records table - line stoppage events
#[derive(Iden)]
pub enum DowntimeRecords {
    Table,
    Id,
    TimestampMs,
    Area,
    StartTime,
    EndTime,
    DurationMinutes,
    Reason,
    OperatorId,
}
