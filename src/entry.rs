//! Entry workflow: turns operator input into normalized records.
//!
//! All normalization the rest of the system relies on happens here - VIN
//! casing, the combined time-slot string, the entry-date timestamp rule and
//! the advisory duplicate check. The aggregation engine tolerates duplicates
//! either way; the check only warns the operator before a write.

use chrono::{Local, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::records::{
    parse_time, wraparound_minutes, Area, CarModel, DefectRecord, DowntimeRecord, PassRecord,
    SLOT_SEPARATOR,
};

/// Preset inspection slots offered by the entry form
pub const PRESET_TIME_SLOTS: [(&str, &str); 10] = [
    ("08:00", "09:00"),
    ("09:00", "09:50"),
    ("10:00", "11:00"),
    ("11:00", "11:30"),
    ("12:30", "13:00"),
    ("13:00", "14:00"),
    ("14:00", "14:50"),
    ("15:00", "16:00"),
    ("16:00", "17:00"),
    ("17:00", "17:30"),
];

/// Downtime reasons; the empty entry means "no reason given"
pub const DOWNTIME_REASONS: [&str; 12] = [
    "",
    "Parada não programada",
    "Falta de peça",
    "Manutenção equipamento",
    "Problema elétrico",
    "Problema mecânico",
    "Falta de mão de obra",
    "Parada programada",
    "DDS",
    "Falta de energia",
    "Aguardando carro",
    "Problema de qualidade",
];

/// Operator input for an approved inspection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassEntry {
    pub model: CarModel,
    pub area: Area,
    #[serde(default)]
    pub vin: String,
    pub quantity: u32,
    #[serde(default)]
    pub operator_id: String,
    pub entry_date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub acting_section: Option<String>,
    #[serde(default)]
    pub released: Option<String>,
    #[serde(default)]
    pub is_reinspection: bool,
}

/// Operator input for a rejected inspection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefectEntry {
    pub model: CarModel,
    pub area: Area,
    #[serde(default)]
    pub vin: String,
    pub defect: String,
    pub quantity: u32,
    #[serde(default)]
    pub operator_id: String,
    pub entry_date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub acting_section: Option<String>,
    #[serde(default)]
    pub released: Option<String>,
    #[serde(default)]
    pub is_reinspection: bool,
}

/// Operator input for a line-downtime event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DowntimeEntry {
    pub area: Area,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub operator_id: Option<String>,
}

/// Advisory warning returned when an identical entry already exists
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateWarning {
    pub vin: String,
    pub message: String,
}

/// VINs are stored trimmed and upper-cased
pub fn normalize_vin(vin: &str) -> String {
    vin.trim().to_uppercase()
}

/// Combine start and end into the canonical "HH:MM as HH:MM" slot string
pub fn combined_time_slot(start: &str, end: &str) -> Result<String, String> {
    parse_time(start)?;
    parse_time(end)?;
    Ok(format!("{}{}{}", start, SLOT_SEPARATOR, end))
}

/// Resolve the record timestamp for an entry date.
///
/// An existing timestamp is preserved as long as its local calendar date
/// still matches the entry date. Otherwise entries for today get the current
/// time and back-dated entries land at noon of their date, so they fall on
/// the right calendar day in any reasonable time zone.
pub fn resolve_timestamp(
    entry_date: NaiveDate,
    existing_ms: Option<i64>,
) -> Result<i64, String> {
    if let Some(existing) = existing_ms {
        let same_date = Local
            .timestamp_millis_opt(existing)
            .single()
            .map(|dt| dt.date_naive() == entry_date)
            .unwrap_or(false);
        if same_date {
            return Ok(existing);
        }
    }

    let now = Local::now();
    if entry_date == now.date_naive() {
        return Ok(now.timestamp_millis());
    }

    entry_date
        .and_hms_opt(12, 0, 0)
        .and_then(|dt| Local.from_local_datetime(&dt).single())
        .map(|dt| dt.timestamp_millis())
        .ok_or_else(|| format!("Invalid entry date '{}'", entry_date))
}

fn validate_acting_section(
    area: Area,
    acting_section: &Option<String>,
) -> Result<Option<String>, String> {
    match area.acting_sections() {
        Some(options) => {
            let section = acting_section
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| {
                    format!("An acting section is required for area '{}'", area.as_str())
                })?;
            if !options.contains(&section) {
                return Err(format!(
                    "Unknown acting section '{}' for area '{}'",
                    section,
                    area.as_str()
                ));
            }
            Ok(Some(section.to_string()))
        }
        // Areas without sections never carry one
        None => Ok(None),
    }
}

fn validate_operator_and_vin(area: Area, operator_id: &str, vin: &str) -> Result<(), String> {
    if area.requires_vin() {
        if operator_id.trim().is_empty() {
            return Err(format!(
                "Operator id is required for area '{}'",
                area.as_str()
            ));
        }
        if vin.is_empty() {
            return Err(format!("VIN is required for area '{}'", area.as_str()));
        }
    }
    Ok(())
}

fn normalize_note(note: &Option<String>) -> Option<String> {
    note.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Validate and normalize a pass entry into a storable record.
/// `existing` carries the record being edited; its id and, when the calendar
/// date did not change, its timestamp are preserved.
pub fn build_pass_record(
    entry: &PassEntry,
    existing: Option<&PassRecord>,
) -> Result<PassRecord, String> {
    if entry.quantity == 0 {
        return Err("Quantity must be at least 1".to_string());
    }

    let vin = normalize_vin(&entry.vin);
    validate_operator_and_vin(entry.area, &entry.operator_id, &vin)?;
    let acting_section = validate_acting_section(entry.area, &entry.acting_section)?;
    let time_slot = combined_time_slot(&entry.start_time, &entry.end_time)?;
    let released = normalize_note(&entry.released);

    if entry.area == Area::InspecaoOffLine && released.is_none() {
        return Err("A released note is required for OK entries at 'Inspeção OffLine'".to_string());
    }

    let timestamp_ms = resolve_timestamp(entry.entry_date, existing.map(|r| r.timestamp_ms))?;

    Ok(PassRecord {
        id: existing
            .map(|r| r.id.clone())
            .unwrap_or_else(|| Uuid::new_v4().to_string()),
        timestamp_ms,
        model: entry.model,
        area: entry.area,
        vin,
        quantity: entry.quantity,
        operator_id: entry.operator_id.trim().to_string(),
        time_slot,
        acting_section,
        released,
        is_reinspection: entry.is_reinspection,
    })
}

/// Validate and normalize a defect entry into a storable record
pub fn build_defect_record(
    entry: &DefectEntry,
    existing: Option<&DefectRecord>,
) -> Result<DefectRecord, String> {
    if entry.quantity == 0 {
        return Err("Quantity must be at least 1".to_string());
    }

    let defect = entry.defect.trim().to_string();
    if defect.is_empty() {
        return Err("A defect description is required for NOT OK entries".to_string());
    }

    let vin = normalize_vin(&entry.vin);
    validate_operator_and_vin(entry.area, &entry.operator_id, &vin)?;
    let acting_section = validate_acting_section(entry.area, &entry.acting_section)?;
    let time_slot = combined_time_slot(&entry.start_time, &entry.end_time)?;

    let timestamp_ms = resolve_timestamp(entry.entry_date, existing.map(|r| r.timestamp_ms))?;

    Ok(DefectRecord {
        id: existing
            .map(|r| r.id.clone())
            .unwrap_or_else(|| Uuid::new_v4().to_string()),
        timestamp_ms,
        model: entry.model,
        area: entry.area,
        vin,
        defect,
        quantity: entry.quantity,
        operator_id: entry.operator_id.trim().to_string(),
        time_slot,
        acting_section,
        released: normalize_note(&entry.released),
        is_reinspection: entry.is_reinspection,
    })
}

/// Validate a downtime entry. The duration is the wraparound difference
/// between end and start time of day; zero-length stoppages are rejected.
pub fn build_downtime_record(entry: &DowntimeEntry) -> Result<DowntimeRecord, String> {
    let duration_minutes = wraparound_minutes(&entry.start_time, &entry.end_time)?;
    if duration_minutes == 0 {
        return Err("Downtime duration cannot be zero".to_string());
    }

    Ok(DowntimeRecord {
        id: Uuid::new_v4().to_string(),
        timestamp_ms: Local::now().timestamp_millis(),
        area: entry.area,
        start_time: entry.start_time.clone(),
        end_time: entry.end_time.clone(),
        duration_minutes,
        reason: entry.reason.trim().to_string(),
        operator_id: entry
            .operator_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
    })
}

/// Advisory duplicate check for a pass record: same VIN, area, model,
/// reinspection flag, acting section and time slot. Skipped for empty VINs
/// and for the record currently being edited.
pub fn duplicate_pass(
    existing: &[PassRecord],
    candidate: &PassRecord,
    editing_id: Option<&str>,
) -> Option<DuplicateWarning> {
    if candidate.vin.is_empty() {
        return None;
    }
    existing
        .iter()
        .filter(|r| editing_id != Some(r.id.as_str()))
        .find(|r| {
            r.vin.to_uppercase() == candidate.vin
                && r.area == candidate.area
                && r.model == candidate.model
                && r.is_reinspection == candidate.is_reinspection
                && r.acting_section == candidate.acting_section
                && r.time_slot == candidate.time_slot
        })
        .map(|_| DuplicateWarning {
            vin: candidate.vin.clone(),
            message: format!(
                "VIN {} already has an identical entry for this area and section",
                candidate.vin
            ),
        })
}

/// Advisory duplicate check for a defect record: same VIN, area, defect
/// text, acting section and time slot
pub fn duplicate_defect(
    existing: &[DefectRecord],
    candidate: &DefectRecord,
    editing_id: Option<&str>,
) -> Option<DuplicateWarning> {
    if candidate.vin.is_empty() {
        return None;
    }
    let candidate_defect = candidate.defect.to_uppercase();
    existing
        .iter()
        .filter(|r| editing_id != Some(r.id.as_str()))
        .find(|r| {
            r.vin.to_uppercase() == candidate.vin
                && r.area == candidate.area
                && r.defect.to_uppercase() == candidate_defect
                && r.acting_section == candidate.acting_section
                && r.time_slot == candidate.time_slot
        })
        .map(|_| DuplicateWarning {
            vin: candidate.vin.clone(),
            message: format!(
                "This defect was already recorded for VIN {} in this area and section",
                candidate.vin
            ),
        })
}
