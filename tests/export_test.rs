//! # Report Formatter Tests
//!
//! These tests verify the chat summary, the CSV sheets and the briefing
//! deck. All formatters consume the same filtered triple the aggregation
//! engine uses, so only formatting is under test here.

use chrono::{Local, NaiveDate, TimeZone};

use quality_track::records::{Area, CarModel, DefectRecord, DowntimeRecord, PassRecord};
use quality_track::report::{
    build_briefing, chat_report, chat_share_link, defect_sheet, downtime_sheet, operator_log,
    pass_sheet, sheet_to_csv, ReportPeriod,
};
use quality_track::stats::FilteredRecords;

fn ts(date: NaiveDate, hour: u32) -> i64 {
    Local
        .from_local_datetime(&date.and_hms_opt(hour, 0, 0).unwrap())
        .single()
        .unwrap()
        .timestamp_millis()
}

fn sample_records() -> FilteredRecords {
    let today = Local::now().date_naive();
    FilteredRecords {
        pass: vec![
            PassRecord {
                id: "p1".to_string(),
                timestamp_ms: ts(today, 8),
                model: CarModel::Eqe,
                area: Area::LinhaOk,
                vin: "9BW111".to_string(),
                quantity: 3,
                operator_id: "1001".to_string(),
                time_slot: "08:00 as 09:00".to_string(),
                acting_section: None,
                released: None,
                is_reinspection: false,
            },
            PassRecord {
                id: "p2".to_string(),
                timestamp_ms: ts(today, 9),
                model: CarModel::Sa2,
                area: Area::InspecaoOffLine,
                vin: "9BW222".to_string(),
                quantity: 1,
                operator_id: "1002".to_string(),
                time_slot: "09:00 as 09:50".to_string(),
                acting_section: Some("reinspeção recebimento".to_string()),
                released: Some("Liberado após reaperto".to_string()),
                is_reinspection: true,
            },
        ],
        defects: vec![DefectRecord {
            id: "d1".to_string(),
            timestamp_ms: ts(today, 10),
            model: CarModel::Eqe,
            area: Area::LinhaOk,
            vin: "9BW111".to_string(),
            defect: "Scratch, left door".to_string(),
            quantity: 2,
            operator_id: "1001".to_string(),
            time_slot: "10:00 as 11:00".to_string(),
            acting_section: None,
            released: None,
            is_reinspection: false,
        }],
        downtime: vec![DowntimeRecord {
            id: "dt1".to_string(),
            timestamp_ms: ts(today, 11),
            area: Area::LinhaOk,
            start_time: "11:00".to_string(),
            end_time: "12:30".to_string(),
            duration_minutes: 90,
            reason: "Falta de peça".to_string(),
            operator_id: None,
        }],
    }
}

#[test]
fn test_chat_report_summarizes_totals() {
    let records = sample_records();
    let text = chat_report(&records, "Geral", Local::now().date_naive());

    assert!(text.contains("Setor: Geral"));
    assert!(text.contains("*Produção Total:* 4 unidades"));
    assert!(text.contains("*Defeitos Totais:* 2 ocorrências"));
    assert!(text.contains("*Reinspeções:* 1 veículos"));
    assert!(text.contains("*Inspeção OffLine:* 1 itens liberados"));
    assert!(text.contains("*Parada Total:* 1.5 horas"));
    assert!(text.contains("*EQE*: OK: 3 | Def: 2"));
    assert!(text.contains("*SA2*: OK: 1 | Def: 0"));
    assert!(text.contains("1º SCRATCH, LEFT DOOR (2)"));
    assert!(text.contains("*Eventos de Parada:* 1"));
}

#[test]
fn test_chat_report_with_no_defects() {
    let mut records = sample_records();
    records.defects.clear();

    let text = chat_report(&records, "Linha OK", Local::now().date_naive());
    assert!(text.contains("Nenhum defeito registrado"));
    assert!(text.contains("Setor: Linha OK"));
}

#[test]
fn test_chat_share_link_is_url_encoded() {
    let link = chat_share_link("Setor: Linha OK & más");
    assert!(link.starts_with("https://wa.me/?text="));
    assert!(!link.contains(' '), "Spaces are percent-encoded");
    assert!(!link.contains('&'), "Ampersands are percent-encoded");
}

#[test]
fn test_sheets_have_original_column_layout() {
    let records = sample_records();

    let sheet = pass_sheet(&records.pass, "Geral");
    assert_eq!(sheet.name, "Producao_OK_Geral");
    assert_eq!(sheet.headers.len(), 11);
    assert_eq!(sheet.rows.len(), 2);
    // Optional fields render as N/A
    assert_eq!(sheet.rows[0][7], "N/A");
    assert_eq!(sheet.rows[1][7], "reinspeção recebimento");
    assert_eq!(sheet.rows[1][6], "Sim");

    let sheet = defect_sheet(&records.defects, "Linha OK");
    assert_eq!(sheet.name, "Defeitos_Linha_OK");
    assert_eq!(sheet.headers.len(), 12);
    assert_eq!(sheet.rows[0][10], "Scratch, left door");

    let sheet = downtime_sheet(&records.downtime, "Geral");
    assert_eq!(sheet.headers, vec![
        "Data", "Area", "Inicio", "Fim", "DuracaoMin", "Motivo"
    ]);
    assert_eq!(sheet.rows[0][4], "90");
}

#[test]
fn test_csv_escapes_commas_and_quotes() {
    let records = sample_records();
    let csv = sheet_to_csv(&defect_sheet(&records.defects, "Geral"));

    let mut lines = csv.lines();
    assert!(lines.next().unwrap().starts_with("Data,Horario,Intervalo"));
    assert!(
        csv.contains("\"Scratch, left door\""),
        "Fields containing commas are quoted"
    );

    use quality_track::report::Sheet;
    let tricky = Sheet {
        name: "t".to_string(),
        headers: vec!["a".to_string()],
        rows: vec![vec!["say \"hi\"".to_string()]],
    };
    assert_eq!(sheet_to_csv(&tricky), "a\n\"say \"\"hi\"\"\"\n");
}

#[test]
fn test_briefing_deck_contents() {
    let records = sample_records();
    let briefing = build_briefing(&records, ReportPeriod::Monthly, "Geral");

    assert_eq!(briefing.period, "Mensal");
    assert_eq!(briefing.totals.ok, 4);
    assert_eq!(briefing.totals.defects, 2);
    assert_eq!(briefing.totals.downtime_hours, "1.5");
    assert_eq!(
        briefing.period_end - briefing.period_start,
        chrono::Duration::days(30)
    );

    let eqe = briefing
        .models
        .iter()
        .find(|m| m.model == CarModel::Eqe)
        .unwrap();
    assert_eq!(eqe.ok, 3);
    assert_eq!(eqe.nok, 2);

    assert_eq!(briefing.top_defects.len(), 1);
    assert_eq!(briefing.top_defects[0].label, "SCRATCH, LEFT DOOR");

    assert_eq!(briefing.downtime_events.len(), 1);
    assert_eq!(briefing.downtime_events[0].duration_minutes, 90);
}

#[test]
fn test_briefing_period_windows() {
    assert_eq!(ReportPeriod::Weekly.days(), 7);
    assert_eq!(ReportPeriod::Monthly.days(), 30);
    assert_eq!(ReportPeriod::Annual.days(), 365);
}

#[test]
fn test_operator_log_filters_and_orders() {
    let records = sample_records();

    let events = operator_log(&records.pass, &records.defects, "1001");
    assert_eq!(events.len(), 2, "Only operator 1001's events are listed");
    assert!(
        events[0].timestamp_ms >= events[1].timestamp_ms,
        "Events are ordered newest first"
    );

    let all_events = operator_log(&records.pass, &records.defects, "");
    assert_eq!(all_events.len(), 3, "Empty operator id lists everything");
}
