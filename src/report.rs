//! Report formatters: chat summary, CSV sheets, briefing deck, operator log.
//!
//! Formatters consume the filtered triple produced by `stats::filter_snapshot`
//! so their view of the data can never drift from the dashboard's.

use chrono::{Local, NaiveDate, TimeZone};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::records::{Area, CarModel, DefectRecord, DowntimeRecord, PassRecord};
use crate::stats::{
    ChartScope, DefectRank, FilterSpec, FilteredRecords, ModelSummary, VinEvent, VinEventKind,
};

/// Lookback window for briefing decks
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportPeriod {
    Weekly,
    Monthly,
    Annual,
}

impl ReportPeriod {
    pub fn days(&self) -> i64 {
        match self {
            ReportPeriod::Weekly => 7,
            ReportPeriod::Monthly => 30,
            ReportPeriod::Annual => 365,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReportPeriod::Weekly => "Semanal",
            ReportPeriod::Monthly => "Mensal",
            ReportPeriod::Annual => "Anual",
        }
    }

    /// Filter specification covering this period up to today, all areas
    pub fn filter(&self) -> FilterSpec {
        let today = Local::now().date_naive();
        FilterSpec {
            start_date: today - chrono::Duration::days(self.days()),
            end_date: today,
            area: None,
            vin_query: String::new(),
            chart_scope: ChartScope::General,
        }
    }
}

fn top_defects_plain(defects: &[DefectRecord], limit: usize) -> Vec<DefectRank> {
    let mut quantities: HashMap<String, u32> = HashMap::new();
    for record in defects {
        *quantities
            .entry(record.defect.trim().to_uppercase())
            .or_insert(0) += record.quantity;
    }
    let mut ranking: Vec<DefectRank> = quantities
        .into_iter()
        .map(|(label, quantity)| DefectRank { label, quantity })
        .collect();
    ranking.sort_by(|a, b| {
        b.quantity
            .cmp(&a.quantity)
            .then_with(|| a.label.cmp(&b.label))
    });
    ranking.truncate(limit);
    ranking
}

fn model_breakdown(pass: &[PassRecord], defects: &[DefectRecord]) -> Vec<ModelSummary> {
    CarModel::ALL
        .iter()
        .map(|&model| {
            let ok: u32 = pass
                .iter()
                .filter(|r| r.model == model)
                .map(|r| r.quantity)
                .sum();
            let nok: u32 = defects
                .iter()
                .filter(|r| r.model == model)
                .map(|r| r.quantity)
                .sum();
            ModelSummary {
                model,
                ok,
                nok,
                total: ok + nok,
            }
        })
        .collect()
}

/// Plant-chat text summary of a filtered record set
pub fn chat_report(records: &FilteredRecords, area_label: &str, date: NaiveDate) -> String {
    let total_ok: u32 = records.pass.iter().map(|r| r.quantity).sum();
    let total_defects: u32 = records.defects.iter().map(|r| r.quantity).sum();
    let downtime_minutes: u32 = records.downtime.iter().map(|r| r.duration_minutes).sum();
    let downtime_hours = format!("{:.1}", downtime_minutes as f64 / 60.0);

    let reinspections: u32 = records
        .pass
        .iter()
        .filter(|r| r.is_reinspection)
        .map(|r| r.quantity)
        .chain(
            records
                .defects
                .iter()
                .filter(|r| r.is_reinspection)
                .map(|r| r.quantity),
        )
        .sum();

    let released_count = records
        .pass
        .iter()
        .filter(|r| r.area == Area::InspecaoOffLine && r.released.is_some())
        .count()
        + records
            .defects
            .iter()
            .filter(|r| r.area == Area::InspecaoOffLine && r.released.is_some())
            .count();

    let model_lines: Vec<String> = model_breakdown(&records.pass, &records.defects)
        .iter()
        .map(|m| format!("*{}*: OK: {} | Def: {}", m.model.as_str(), m.ok, m.nok))
        .collect();

    let top3 = top_defects_plain(&records.defects, 3);
    let top3_lines = if top3.is_empty() {
        "Nenhum defeito registrado".to_string()
    } else {
        top3.iter()
            .enumerate()
            .map(|(i, d)| format!("{}º {} ({})", i + 1, d.label, d.quantity))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "🚀 *Centro de Qualidade VQ - Setor: {}*\n\
         📅 *Data:* {}\n\
         \n\
         ✅ *Produção Total:* {} unidades\n\
         ⚠️ *Defeitos Totais:* {} ocorrências\n\
         🔄 *Reinspeções:* {} veículos\n\
         📦 *Inspeção OffLine:* {} itens liberados\n\
         ⏱️ *Parada Total:* {} horas\n\
         \n\
         📊 *Resumo por Modelo:*\n{}\n\
         \n\
         🔝 *Top 3 Defeitos:*\n{}\n\
         \n\
         🛑 *Eventos de Parada:* {}\n\
         \n\
         _Relatório filtrado via VQ Management System_",
        area_label,
        date.format("%d/%m/%Y"),
        total_ok,
        total_defects,
        reinspections,
        released_count,
        downtime_hours,
        model_lines.join("\n"),
        top3_lines,
        records.downtime.len(),
    )
}

/// Share link that opens the chat report in a messaging client
pub fn chat_share_link(report: &str) -> String {
    format!("https://wa.me/?text={}", urlencoding::encode(report))
}

/// One sheet of the spreadsheet export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

fn local_date_time(timestamp_ms: i64) -> (String, String) {
    match Local.timestamp_millis_opt(timestamp_ms).single() {
        Some(dt) => (
            dt.format("%d/%m/%Y").to_string(),
            dt.format("%H:%M:%S").to_string(),
        ),
        None => ("N/A".to_string(), "N/A".to_string()),
    }
}

fn or_na(value: &str) -> String {
    if value.is_empty() {
        "N/A".to_string()
    } else {
        value.to_string()
    }
}

/// Defect sheet with the original workbook's column layout
pub fn defect_sheet(defects: &[DefectRecord], area_label: &str) -> Sheet {
    let rows = defects
        .iter()
        .map(|r| {
            let (date, time) = local_date_time(r.timestamp_ms);
            vec![
                date,
                time,
                or_na(&r.time_slot),
                r.operator_id.clone(),
                r.model.as_str().to_string(),
                r.area.as_str().to_string(),
                if r.is_reinspection { "Sim" } else { "Não" }.to_string(),
                or_na(r.acting_section.as_deref().unwrap_or("")),
                or_na(r.released.as_deref().unwrap_or("")),
                r.vin.clone(),
                r.defect.clone(),
                r.quantity.to_string(),
            ]
        })
        .collect();

    Sheet {
        name: format!("Defeitos_{}", area_label.replace(' ', "_")),
        headers: [
            "Data",
            "Horario",
            "Intervalo",
            "Matricula",
            "Modelo",
            "Area",
            "Reinspecao",
            "Atuacao",
            "Liberado",
            "VIN",
            "Defeito",
            "Quantidade",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect(),
        rows,
    }
}

/// Pass sheet with the original workbook's column layout
pub fn pass_sheet(pass: &[PassRecord], area_label: &str) -> Sheet {
    let rows = pass
        .iter()
        .map(|r| {
            let (date, time) = local_date_time(r.timestamp_ms);
            vec![
                date,
                time,
                or_na(&r.time_slot),
                r.operator_id.clone(),
                r.model.as_str().to_string(),
                r.area.as_str().to_string(),
                if r.is_reinspection { "Sim" } else { "Não" }.to_string(),
                or_na(r.acting_section.as_deref().unwrap_or("")),
                or_na(r.released.as_deref().unwrap_or("")),
                or_na(&r.vin),
                r.quantity.to_string(),
            ]
        })
        .collect();

    Sheet {
        name: format!("Producao_OK_{}", area_label.replace(' ', "_")),
        headers: [
            "Data",
            "Horario",
            "Intervalo",
            "Matricula",
            "Modelo",
            "Area",
            "Reinspecao",
            "Atuacao",
            "Liberado",
            "VIN",
            "Quantidade",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect(),
        rows,
    }
}

/// Downtime sheet with the original workbook's column layout
pub fn downtime_sheet(downtime: &[DowntimeRecord], area_label: &str) -> Sheet {
    let rows = downtime
        .iter()
        .map(|r| {
            let (date, _) = local_date_time(r.timestamp_ms);
            vec![
                date,
                r.area.as_str().to_string(),
                r.start_time.clone(),
                r.end_time.clone(),
                r.duration_minutes.to_string(),
                r.reason.clone(),
            ]
        })
        .collect();

    Sheet {
        name: format!("Paradas_{}", area_label.replace(' ', "_")),
        headers: ["Data", "Area", "Inicio", "Fim", "DuracaoMin", "Motivo"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        rows,
    }
}

fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Render one sheet as CSV
pub fn sheet_to_csv(sheet: &Sheet) -> String {
    let mut out = String::new();
    out.push_str(
        &sheet
            .headers
            .iter()
            .map(|h| csv_escape(h))
            .collect::<Vec<_>>()
            .join(","),
    );
    out.push('\n');
    for row in &sheet.rows {
        out.push_str(
            &row.iter()
                .map(|f| csv_escape(f))
                .collect::<Vec<_>>()
                .join(","),
        );
        out.push('\n');
    }
    out
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BriefingTotals {
    pub ok: u32,
    pub defects: u32,
    pub downtime_hours: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BriefingDowntimeRow {
    pub reason: String,
    pub start_time: String,
    pub end_time: String,
    pub duration_minutes: u32,
}

/// Renderer-agnostic slide-deck content: title, KPI cards, per-model table,
/// defect pareto and the most recent downtime events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BriefingDeck {
    pub title: String,
    pub area: String,
    pub period: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub totals: BriefingTotals,
    pub models: Vec<ModelSummary>,
    pub top_defects: Vec<DefectRank>,
    pub downtime_events: Vec<BriefingDowntimeRow>,
}

/// Build the briefing deck for a period-scoped filtered triple
pub fn build_briefing(
    records: &FilteredRecords,
    period: ReportPeriod,
    area_label: &str,
) -> BriefingDeck {
    let filter = period.filter();
    let total_ok: u32 = records.pass.iter().map(|r| r.quantity).sum();
    let total_defects: u32 = records.defects.iter().map(|r| r.quantity).sum();
    let downtime_minutes: u32 = records.downtime.iter().map(|r| r.duration_minutes).sum();

    let downtime_events = records
        .downtime
        .iter()
        .take(8)
        .map(|r| BriefingDowntimeRow {
            reason: r.reason.clone(),
            start_time: r.start_time.clone(),
            end_time: r.end_time.clone(),
            duration_minutes: r.duration_minutes,
        })
        .collect();

    BriefingDeck {
        title: "VQ MANAGEMENT".to_string(),
        area: area_label.to_string(),
        period: period.label().to_string(),
        period_start: filter.start_date,
        period_end: filter.end_date,
        totals: BriefingTotals {
            ok: total_ok,
            defects: total_defects,
            downtime_hours: format!("{:.1}", downtime_minutes as f64 / 60.0),
        },
        models: model_breakdown(&records.pass, &records.defects),
        top_defects: top_defects_plain(&records.defects, 10),
        downtime_events,
    }
}

/// One operator's inspection events, newest first. An empty operator id
/// returns everything.
pub fn operator_log(
    pass: &[PassRecord],
    defects: &[DefectRecord],
    operator_id: &str,
) -> Vec<VinEvent> {
    let mut events: Vec<VinEvent> = pass
        .iter()
        .filter(|r| operator_id.is_empty() || r.operator_id == operator_id)
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
        .chain(
            defects
                .iter()
                .filter(|r| operator_id.is_empty() || r.operator_id == operator_id)
                .map(|r| VinEvent {
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
                }),
        )
        .collect();
    events.sort_by(|a, b| b.timestamp_ms.cmp(&a.timestamp_ms));
    events
}
