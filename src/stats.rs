//! Dashboard aggregation engine.
//!
//! A pure, synchronous transform from the three record collections plus a
//! filter specification to the derived statistics the dashboard and the
//! report formatters consume. Holds no state, performs no I/O, and is
//! recomputed from scratch whenever the snapshot or the filter changes.

use chrono::{Local, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::records::{
    slot_start, Area, CarModel, DefectRecord, DowntimeRecord, PassRecord,
};

/// Which record set the trend charts draw from when a single area is
/// selected: the selected area only, or the whole plant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChartScope {
    Selected,
    General,
}

/// Filter specification for one dashboard view
#[derive(Debug, Clone)]
pub struct FilterSpec {
    /// Inclusive start of the date range (local calendar date)
    pub start_date: NaiveDate,
    /// Inclusive end of the date range (local calendar date)
    pub end_date: NaiveDate,
    /// None means all areas
    pub area: Option<Area>,
    /// Case-insensitive VIN substring; empty string disables the filter
    pub vin_query: String,
    pub chart_scope: ChartScope,
}

impl FilterSpec {
    /// Today-only view across all areas - the dashboard's initial state
    pub fn today() -> Self {
        let today = Local::now().date_naive();
        FilterSpec {
            start_date: today,
            end_date: today,
            area: None,
            vin_query: String::new(),
            chart_scope: ChartScope::Selected,
        }
    }
}

/// The filtered triple the engine derives its card totals from. Report
/// formatters consume this same triple instead of re-deriving filter logic.
#[derive(Debug, Clone, Default)]
pub struct FilteredRecords {
    pub pass: Vec<PassRecord>,
    pub defects: Vec<DefectRecord>,
    pub downtime: Vec<DowntimeRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AreaSummary {
    pub area: Area,
    pub ok: u32,
    pub nok: u32,
    pub total: u32,
    pub downtime_minutes: u32,
    pub reinspections: u32,
    /// First-time-through rate, one decimal place; "0.0" when total is zero
    pub ftt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotSummary {
    pub slot: String,
    pub ok: u32,
    pub nok: u32,
    pub total: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSummary {
    pub model: CarModel,
    pub ok: u32,
    pub nok: u32,
    pub total: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefectRank {
    pub label: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionCount {
    pub section: String,
    pub total: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotSectionRow {
    pub slot: String,
    pub sections: Vec<SectionCount>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionTotal {
    pub section: String,
    pub total: u32,
    pub defects: u32,
}

/// Acting-section breakdown, present only for the two areas that have one
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubAreaDetail {
    pub area: Area,
    pub per_slot: Vec<SlotSectionRow>,
    pub totals: Vec<SectionTotal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VinEventKind {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "NOK")]
    Nok,
}

/// One entry of a vehicle's inspection dossier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VinEvent {
    pub kind: VinEventKind,
    pub id: String,
    pub timestamp_ms: i64,
    pub model: CarModel,
    pub area: Area,
    pub vin: String,
    pub quantity: u32,
    pub operator_id: String,
    pub time_slot: String,
    pub acting_section: Option<String>,
    pub released: Option<String>,
    pub is_reinspection: bool,
    /// Defect description, present for NOK events only
    pub defect: Option<String>,
}

/// Derived statistics for one filter specification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statistics {
    pub total_ok: u32,
    pub total_defects: u32,
    pub total_processed: u32,
    /// Downtime hours, one decimal place
    pub total_downtime_hours: String,
    pub total_reinspections: u32,
    /// Overall first-time-through rate; "0.0" when nothing was processed
    pub ftt_overall: String,
    pub area_stats: Vec<AreaSummary>,
    pub top_defects: Vec<DefectRank>,
    pub time_slot_series: Vec<SlotSummary>,
    pub sub_area_detail: Option<SubAreaDetail>,
    pub model_stats: Vec<ModelSummary>,
    pub vin_history: Vec<VinEvent>,
}

/// Local calendar date of an epoch-milliseconds timestamp.
/// Returns None for timestamps outside the representable range.
fn local_date(timestamp_ms: i64) -> Option<NaiveDate> {
    Local
        .timestamp_millis_opt(timestamp_ms)
        .single()
        .map(|dt| dt.date_naive())
}

fn in_date_range(timestamp_ms: i64, filter: &FilterSpec) -> bool {
    local_date(timestamp_ms)
        .map(|d| d >= filter.start_date && d <= filter.end_date)
        .unwrap_or(false)
}

fn vin_matches(vin: &str, vin_query_upper: &str) -> bool {
    vin_query_upper.is_empty() || vin.to_uppercase().contains(vin_query_upper)
}

fn area_matches(area: Area, filter: &FilterSpec) -> bool {
    filter.area.map(|selected| selected == area).unwrap_or(true)
}

fn ftt_rate(ok: u32, total: u32) -> String {
    if total > 0 {
        format!("{:.1}", ok as f64 / total as f64 * 100.0)
    } else {
        "0.0".to_string()
    }
}

fn sum_quantity<'a, I: IntoIterator<Item = &'a u32>>(quantities: I) -> u32 {
    quantities.into_iter().sum()
}

/// The date/VIN/area-filtered triple for a filter specification. Downtime
/// records carry no VIN, so only the date range and area apply to them.
pub fn filter_snapshot(
    pass: &[PassRecord],
    defects: &[DefectRecord],
    downtime: &[DowntimeRecord],
    filter: &FilterSpec,
) -> FilteredRecords {
    let vin_upper = filter.vin_query.trim().to_uppercase();

    FilteredRecords {
        pass: pass
            .iter()
            .filter(|r| {
                in_date_range(r.timestamp_ms, filter)
                    && vin_matches(&r.vin, &vin_upper)
                    && area_matches(r.area, filter)
            })
            .cloned()
            .collect(),
        defects: defects
            .iter()
            .filter(|r| {
                in_date_range(r.timestamp_ms, filter)
                    && vin_matches(&r.vin, &vin_upper)
                    && area_matches(r.area, filter)
            })
            .cloned()
            .collect(),
        downtime: downtime
            .iter()
            .filter(|r| in_date_range(r.timestamp_ms, filter) && area_matches(r.area, filter))
            .cloned()
            .collect(),
    }
}

/// Compute the full derived statistics for one snapshot and filter.
///
/// Two independently scoped views feed the output: the "card" sets always
/// honor the selected area, while the chart sets widen to all areas when
/// either no area is selected or the chart scope is General.
pub fn compute_statistics(
    pass: &[PassRecord],
    defects: &[DefectRecord],
    downtime: &[DowntimeRecord],
    filter: &FilterSpec,
) -> Statistics {
    let vin_upper = filter.vin_query.trim().to_uppercase();

    let base_pass: Vec<&PassRecord> = pass
        .iter()
        .filter(|r| in_date_range(r.timestamp_ms, filter) && vin_matches(&r.vin, &vin_upper))
        .collect();
    let base_defects: Vec<&DefectRecord> = defects
        .iter()
        .filter(|r| in_date_range(r.timestamp_ms, filter) && vin_matches(&r.vin, &vin_upper))
        .collect();

    let card_pass: Vec<&PassRecord> = base_pass
        .iter()
        .copied()
        .filter(|r| area_matches(r.area, filter))
        .collect();
    let card_defects: Vec<&DefectRecord> = base_defects
        .iter()
        .copied()
        .filter(|r| area_matches(r.area, filter))
        .collect();
    let card_downtime: Vec<&DowntimeRecord> = downtime
        .iter()
        .filter(|r| in_date_range(r.timestamp_ms, filter) && area_matches(r.area, filter))
        .collect();

    let all_areas_view =
        filter.area.is_none() || filter.chart_scope == ChartScope::General;
    let chart_pass = if all_areas_view { &base_pass } else { &card_pass };
    let chart_defects = if all_areas_view {
        &base_defects
    } else {
        &card_defects
    };

    // Card totals
    let total_ok = sum_quantity(card_pass.iter().map(|r| &r.quantity));
    let total_defects = sum_quantity(card_defects.iter().map(|r| &r.quantity));
    let total_processed = total_ok + total_defects;
    let total_downtime_minutes: u32 = card_downtime.iter().map(|r| r.duration_minutes).sum();
    let total_reinspections = sum_quantity(
        card_pass
            .iter()
            .filter(|r| r.is_reinspection)
            .map(|r| &r.quantity)
            .chain(
                card_defects
                    .iter()
                    .filter(|r| r.is_reinspection)
                    .map(|r| &r.quantity),
            ),
    );

    // Per-area breakdown, ignoring the selected-area filter but keeping the
    // date range and VIN query. The five areas partition the filtered data.
    let area_stats = Area::ALL
        .iter()
        .map(|&area| {
            let ok = sum_quantity(
                base_pass
                    .iter()
                    .filter(|r| r.area == area)
                    .map(|r| &r.quantity),
            );
            let nok = sum_quantity(
                base_defects
                    .iter()
                    .filter(|r| r.area == area)
                    .map(|r| &r.quantity),
            );
            let downtime_minutes: u32 = downtime
                .iter()
                .filter(|r| r.area == area && in_date_range(r.timestamp_ms, filter))
                .map(|r| r.duration_minutes)
                .sum();
            let reinspections = sum_quantity(
                base_pass
                    .iter()
                    .filter(|r| r.area == area && r.is_reinspection)
                    .map(|r| &r.quantity)
                    .chain(
                        base_defects
                            .iter()
                            .filter(|r| r.area == area && r.is_reinspection)
                            .map(|r| &r.quantity),
                    ),
            );
            let total = ok + nok;
            AreaSummary {
                area,
                ok,
                nok,
                total,
                downtime_minutes,
                reinspections,
                ftt: ftt_rate(ok, total),
            }
        })
        .collect();

    // Time-slot series from the chart sets, sorted by slot start time.
    // Records with an empty slot stay in the totals but out of the series.
    let mut active_slots: Vec<String> = Vec::new();
    for slot in chart_pass
        .iter()
        .map(|r| &r.time_slot)
        .chain(chart_defects.iter().map(|r| &r.time_slot))
    {
        if !slot.is_empty() && !active_slots.iter().any(|s| s == slot) {
            active_slots.push(slot.clone());
        }
    }
    active_slots.sort_by(|a, b| slot_start(a).cmp(slot_start(b)).then_with(|| a.cmp(b)));

    let time_slot_series = active_slots
        .iter()
        .map(|slot| {
            let ok = sum_quantity(
                chart_pass
                    .iter()
                    .filter(|r| &r.time_slot == slot)
                    .map(|r| &r.quantity),
            );
            let nok = sum_quantity(
                chart_defects
                    .iter()
                    .filter(|r| &r.time_slot == slot)
                    .map(|r| &r.quantity),
            );
            SlotSummary {
                slot: slot.clone(),
                ok,
                nok,
                total: ok + nok,
            }
        })
        .collect();

    // Acting-section detail, only when the selected area carries one
    let sub_area_detail = filter.area.and_then(|area| {
        let options = area.acting_sections()?;

        let section_matches = |section: &Option<String>, option: &str| {
            section.as_deref() == Some(option)
        };

        let per_slot = active_slots
            .iter()
            .map(|slot| {
                let sections = options
                    .iter()
                    .map(|&option| {
                        let total = sum_quantity(
                            card_pass
                                .iter()
                                .filter(|r| {
                                    &r.time_slot == slot
                                        && section_matches(&r.acting_section, option)
                                })
                                .map(|r| &r.quantity)
                                .chain(
                                    card_defects
                                        .iter()
                                        .filter(|r| {
                                            &r.time_slot == slot
                                                && section_matches(&r.acting_section, option)
                                        })
                                        .map(|r| &r.quantity),
                                ),
                        );
                        SectionCount {
                            section: option.to_string(),
                            total,
                        }
                    })
                    .collect();
                SlotSectionRow {
                    slot: slot.clone(),
                    sections,
                }
            })
            .collect();

        let totals: Vec<SectionTotal> = options
            .iter()
            .map(|&option| {
                let ok = sum_quantity(
                    card_pass
                        .iter()
                        .filter(|r| section_matches(&r.acting_section, option))
                        .map(|r| &r.quantity),
                );
                let defects = sum_quantity(
                    card_defects
                        .iter()
                        .filter(|r| section_matches(&r.acting_section, option))
                        .map(|r| &r.quantity),
                );
                SectionTotal {
                    section: option.to_string(),
                    total: ok + defects,
                    defects,
                }
            })
            .filter(|entry| entry.total > 0 || entry.defects > 0)
            .collect();

        Some(SubAreaDetail {
            area,
            per_slot,
            totals,
        })
    });

    // Model breakdown from the chart sets
    let model_stats = CarModel::ALL
        .iter()
        .map(|&model| {
            let ok = sum_quantity(
                chart_pass
                    .iter()
                    .filter(|r| r.model == model)
                    .map(|r| &r.quantity),
            );
            let nok = sum_quantity(
                chart_defects
                    .iter()
                    .filter(|r| r.model == model)
                    .map(|r| &r.quantity),
            );
            ModelSummary {
                model,
                ok,
                nok,
                total: ok + nok,
            }
        })
        .collect();

    // Top-defect ranking from the chart defects. The area tag is appended
    // only when the view spans all areas, the section suffix whenever the
    // record carries one.
    let mut defect_quantities: HashMap<String, u32> = HashMap::new();
    for record in chart_defects.iter() {
        let mut label = record.defect.trim().to_uppercase();
        if all_areas_view {
            label.push_str(&format!(" [{}]", record.area.tag()));
        }
        if let Some(section) = record
            .acting_section
            .as_deref()
            .filter(|s| !s.is_empty())
        {
            label.push_str(&format!(" ({})", section.to_uppercase()));
        }
        *defect_quantities.entry(label).or_insert(0) += record.quantity;
    }
    let mut top_defects: Vec<DefectRank> = defect_quantities
        .into_iter()
        .filter(|(_, quantity)| *quantity > 0)
        .map(|(label, quantity)| DefectRank { label, quantity })
        .collect();
    top_defects.sort_by(|a, b| {
        b.quantity
            .cmp(&a.quantity)
            .then_with(|| a.label.cmp(&b.label))
    });
    top_defects.truncate(10);

    // Vehicle dossier: area-filtered pass and defect events, newest first
    let mut vin_history: Vec<VinEvent> = card_pass
        .iter()
        .map(|r| VinEvent {
            kind: VinEventKind::Ok,
            id: r.id.clone(),
            timestamp_ms: r.timestamp_ms,
            model: r.model,
            area: r.area,
            vin: r.vin.clone(),
            quantity: r.quantity,
            operator_id: r.operator_id.clone(),
            time_slot: r.time_slot.clone(),
            acting_section: r.acting_section.clone(),
            released: r.released.clone(),
            is_reinspection: r.is_reinspection,
            defect: None,
        })
        .chain(card_defects.iter().map(|r| VinEvent {
            kind: VinEventKind::Nok,
            id: r.id.clone(),
            timestamp_ms: r.timestamp_ms,
            model: r.model,
            area: r.area,
            vin: r.vin.clone(),
            quantity: r.quantity,
            operator_id: r.operator_id.clone(),
            time_slot: r.time_slot.clone(),
            acting_section: r.acting_section.clone(),
            released: r.released.clone(),
            is_reinspection: r.is_reinspection,
            defect: Some(r.defect.clone()),
        }))
        .collect();
    vin_history.sort_by(|a, b| b.timestamp_ms.cmp(&a.timestamp_ms));

    Statistics {
        total_ok,
        total_defects,
        total_processed,
        total_downtime_hours: format!("{:.1}", total_downtime_minutes as f64 / 60.0),
        total_reinspections,
        ftt_overall: ftt_rate(total_ok, total_processed),
        area_stats,
        top_defects,
        time_slot_series,
        sub_area_detail,
        model_stats,
        vin_history,
    }
}
