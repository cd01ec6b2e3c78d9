//! # Entry Workflow Tests
//!
//! These tests verify input normalization, the timestamp rules, field
//! validation per area and the advisory duplicate detection.

use chrono::{Duration, Local, TimeZone};

use quality_track::entry::{
    build_defect_record, build_downtime_record, build_pass_record, combined_time_slot,
    duplicate_defect, duplicate_pass, normalize_vin, resolve_timestamp, DefectEntry,
    DowntimeEntry, PassEntry,
};
use quality_track::records::{wraparound_minutes, Area, CarModel};

fn pass_entry(area: Area) -> PassEntry {
    PassEntry {
        model: CarModel::Eqe,
        area,
        vin: "9bw1a2b3c4d5e6f70 ".to_string(),
        quantity: 1,
        operator_id: "1001".to_string(),
        entry_date: Local::now().date_naive(),
        start_time: "08:00".to_string(),
        end_time: "09:00".to_string(),
        acting_section: None,
        released: None,
        is_reinspection: false,
    }
}

fn defect_entry(area: Area) -> DefectEntry {
    DefectEntry {
        model: CarModel::Eqe,
        area,
        vin: "9BW000".to_string(),
        defect: "Scratch on hood".to_string(),
        quantity: 1,
        operator_id: "1001".to_string(),
        entry_date: Local::now().date_naive(),
        start_time: "08:00".to_string(),
        end_time: "09:00".to_string(),
        acting_section: None,
        released: None,
        is_reinspection: false,
    }
}

#[test]
fn test_vin_is_trimmed_and_uppercased() {
    assert_eq!(normalize_vin("  9bw1a2b3 "), "9BW1A2B3");

    let record = build_pass_record(&pass_entry(Area::LinhaOk), None).unwrap();
    assert_eq!(record.vin, "9BW1A2B3C4D5E6F70");
}

#[test]
fn test_combined_time_slot_format() {
    assert_eq!(
        combined_time_slot("08:00", "09:00").unwrap(),
        "08:00 as 09:00"
    );
    assert!(combined_time_slot("8am", "09:00").is_err());
    assert!(combined_time_slot("08:00", "25:00").is_err());
    assert!(combined_time_slot("08:61", "09:00").is_err());
}

#[test]
fn test_downtime_duration_wraps_across_midnight() {
    assert_eq!(wraparound_minutes("23:30", "00:15").unwrap(), 45);
    assert_eq!(wraparound_minutes("08:00", "09:30").unwrap(), 90);

    let record = build_downtime_record(&DowntimeEntry {
        area: Area::LinhaOk,
        start_time: "23:30".to_string(),
        end_time: "00:15".to_string(),
        reason: "Falta de energia".to_string(),
        operator_id: None,
    })
    .unwrap();
    assert_eq!(record.duration_minutes, 45);
}

#[test]
fn test_zero_duration_downtime_rejected() {
    let result = build_downtime_record(&DowntimeEntry {
        area: Area::LinhaOk,
        start_time: "08:00".to_string(),
        end_time: "08:00".to_string(),
        reason: String::new(),
        operator_id: None,
    });
    assert!(result.is_err(), "Zero-length stoppages are rejected");
}

#[test]
fn test_downtime_reason_may_be_empty() {
    let record = build_downtime_record(&DowntimeEntry {
        area: Area::TesteDeChuva,
        start_time: "08:00".to_string(),
        end_time: "08:30".to_string(),
        reason: String::new(),
        operator_id: None,
    })
    .unwrap();
    assert_eq!(record.reason, "");
    assert_eq!(record.duration_minutes, 30);
}

#[test]
fn test_quantity_must_be_positive() {
    let mut entry = pass_entry(Area::LinhaOk);
    entry.quantity = 0;
    assert!(build_pass_record(&entry, None).is_err());
}

#[test]
fn test_offline_area_requires_vin_operator_and_released_note() {
    let mut entry = pass_entry(Area::InspecaoOffLine);
    entry.acting_section = Some("reinspeção recebimento".to_string());
    entry.released = Some("Liberado após reaperto".to_string());

    // Fully specified entry passes
    let record = build_pass_record(&entry, None).unwrap();
    assert_eq!(record.released.as_deref(), Some("Liberado após reaperto"));

    // Missing VIN
    let mut missing_vin = entry.clone();
    missing_vin.vin = "  ".to_string();
    assert!(build_pass_record(&missing_vin, None).is_err());

    // Missing operator id
    let mut missing_operator = entry.clone();
    missing_operator.operator_id = String::new();
    assert!(build_pass_record(&missing_operator, None).is_err());

    // Missing released note
    let mut missing_released = entry.clone();
    missing_released.released = Some("   ".to_string());
    assert!(build_pass_record(&missing_released, None).is_err());
}

#[test]
fn test_vin_optional_outside_offline_area() {
    let mut entry = pass_entry(Area::LinhaOk);
    entry.vin = String::new();
    entry.operator_id = String::new();
    let record = build_pass_record(&entry, None).unwrap();
    assert_eq!(record.vin, "");
}

#[test]
fn test_acting_section_required_and_validated_for_acting_areas() {
    let mut entry = pass_entry(Area::TesteDeEstrada);

    assert!(
        build_pass_record(&entry, None).is_err(),
        "Acting areas require a section"
    );

    entry.acting_section = Some("Chassis".to_string());
    let record = build_pass_record(&entry, None).unwrap();
    assert_eq!(record.acting_section.as_deref(), Some("Chassis"));

    entry.acting_section = Some("Paint shop".to_string());
    assert!(
        build_pass_record(&entry, None).is_err(),
        "Sections outside the closed list are rejected"
    );
}

#[test]
fn test_acting_section_cleared_for_plain_areas() {
    let mut entry = pass_entry(Area::LinhaOk);
    entry.acting_section = Some("Chassis".to_string());
    let record = build_pass_record(&entry, None).unwrap();
    assert_eq!(
        record.acting_section, None,
        "Areas without sections never store one"
    );
}

#[test]
fn test_defect_description_required() {
    let mut entry = defect_entry(Area::LinhaOk);
    entry.defect = "  ".to_string();
    assert!(build_defect_record(&entry, None).is_err());

    entry.defect = " Scratch ".to_string();
    let record = build_defect_record(&entry, None).unwrap();
    assert_eq!(record.defect, "Scratch", "Description is stored trimmed");
}

#[test]
fn test_timestamp_today_is_now_and_backdated_is_noon() {
    let today = Local::now().date_naive();
    let before = Local::now().timestamp_millis();
    let ts_today = resolve_timestamp(today, None).unwrap();
    let after = Local::now().timestamp_millis();
    assert!(
        ts_today >= before && ts_today <= after,
        "Entries for today get the current time"
    );

    let last_week = today - Duration::days(7);
    let ts_backdated = resolve_timestamp(last_week, None).unwrap();
    let backdated = Local.timestamp_millis_opt(ts_backdated).single().unwrap();
    assert_eq!(backdated.date_naive(), last_week);
    assert_eq!(backdated.format("%H:%M").to_string(), "12:00");
}

#[test]
fn test_edit_preserves_timestamp_when_date_unchanged() {
    let today = Local::now().date_naive();
    let original = resolve_timestamp(today, None).unwrap();

    // Same calendar date: the original timestamp is preserved
    let preserved = resolve_timestamp(today, Some(original)).unwrap();
    assert_eq!(preserved, original);

    // Date change: the timestamp is recomputed for the new date
    let moved_date = today - Duration::days(3);
    let moved = resolve_timestamp(moved_date, Some(original)).unwrap();
    let moved_local = Local.timestamp_millis_opt(moved).single().unwrap();
    assert_eq!(moved_local.date_naive(), moved_date);
}

#[test]
fn test_edit_keeps_record_id() {
    let entry = pass_entry(Area::LinhaOk);
    let created = build_pass_record(&entry, None).unwrap();
    let edited = build_pass_record(&entry, Some(&created)).unwrap();
    assert_eq!(edited.id, created.id);
    assert_eq!(edited.timestamp_ms, created.timestamp_ms);
}

#[test]
fn test_duplicate_pass_detection() {
    let entry = pass_entry(Area::LinhaOk);
    let existing = build_pass_record(&entry, None).unwrap();
    let candidate = build_pass_record(&entry, None).unwrap();

    let warning = duplicate_pass(&[existing.clone()], &candidate, None);
    assert!(warning.is_some(), "Identical entry is flagged");

    // The record being edited does not flag itself
    let no_warning = duplicate_pass(&[existing.clone()], &candidate, Some(existing.id.as_str()));
    assert!(no_warning.is_none());

    // A different time slot is a different entry - same VIN may legitimately
    // appear on another slot
    let mut other_slot = entry.clone();
    other_slot.start_time = "10:00".to_string();
    other_slot.end_time = "11:00".to_string();
    let candidate = build_pass_record(&other_slot, None).unwrap();
    assert!(duplicate_pass(&[existing.clone()], &candidate, None).is_none());

    // A different reinspection flag is a different entry
    let mut reinspection = entry.clone();
    reinspection.is_reinspection = true;
    let candidate = build_pass_record(&reinspection, None).unwrap();
    assert!(duplicate_pass(&[existing], &candidate, None).is_none());
}

#[test]
fn test_duplicate_pass_skipped_for_empty_vin() {
    let mut entry = pass_entry(Area::LinhaOk);
    entry.vin = String::new();
    let existing = build_pass_record(&entry, None).unwrap();
    let candidate = build_pass_record(&entry, None).unwrap();

    assert!(
        duplicate_pass(&[existing], &candidate, None).is_none(),
        "Entries without a VIN are never flagged"
    );
}

#[test]
fn test_duplicate_defect_matches_on_description() {
    let entry = defect_entry(Area::LinhaOk);
    let existing = build_defect_record(&entry, None).unwrap();

    // Same description, case-insensitively
    let mut same = entry.clone();
    same.defect = "SCRATCH ON HOOD".to_string();
    let candidate = build_defect_record(&same, None).unwrap();
    assert!(duplicate_defect(&[existing.clone()], &candidate, None).is_some());

    // A different defect on the same vehicle is fine
    let mut other = entry.clone();
    other.defect = "Door misaligned".to_string();
    let candidate = build_defect_record(&other, None).unwrap();
    assert!(duplicate_defect(&[existing], &candidate, None).is_none());
}
