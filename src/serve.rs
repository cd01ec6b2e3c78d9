use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
    Json, Router,
};
use chrono::Local;
use log::error;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::AppConfig;
use crate::constants::EXPECTED_DB_VERSION;
use crate::entry::{DefectEntry, DowntimeEntry, PassEntry};
use crate::records::Area;
use crate::report::{self, ReportPeriod};
use crate::stats::{self, ChartScope, FilterSpec};
use crate::{db, entry, store};

/// State for workspace API handlers
pub struct AppState {
    pub pool: SqlitePool,
    pub workspace: String,
    pub workspace_id: String,
}

/// Workspace identity and record counts, served to sync clients
#[derive(Debug, Serialize, Deserialize)]
pub struct WorkspaceInfo {
    pub workspace: String,
    pub workspace_id: String,
    pub version: String,
    pub pass_count: i64,
    pub defect_count: i64,
    pub downtime_count: i64,
}

/// Run the workspace server for a serve-mode configuration
pub fn serve_workspace(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let db_path = config.database_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create output directory: {}", e))?;
    }

    let port = config.api_port;
    let workspace = config.workspace.clone();

    println!("Workspace: {}", workspace);
    println!("Database: {}", db_path.display());
    println!("Listening on: http://[::]:{} (IPv4 + IPv6)", port);
    println!("Endpoints:");
    println!("  GET  /health  - Health check");
    println!("  GET  /api/stats  - Dashboard statistics");
    println!("  GET/POST /api/pass, /api/defects, /api/downtime  - Record entry");
    println!("  GET  /api/export/chat|sheet|briefing|operator-log  - Reports");
    println!("  GET  /api/sync/workspace, /api/sync/records/:collection  - Sync");

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let pool = db::open_database_pool(&db_path)
            .await
            .map_err(|e| format!("Failed to open database: {}", e))?;
        db::init_database_schema(&pool).await?;
        let workspace_id = db::init_workspace_metadata(&pool, &workspace)
            .await
            .map_err(|e| format!("Workspace metadata error: {}", e))?;

        println!("Workspace ID: {}", workspace_id);

        let app = build_router(Arc::new(AppState {
            pool,
            workspace,
            workspace_id,
        }));

        let listener = tokio::net::TcpListener::bind(format!("[::]:{}", port))
            .await
            .map_err(|e| format!("Failed to bind to port {}: {}", port, e))?;
        axum::serve(listener, app)
            .await
            .map_err(|e| format!("Server error: {}", e))?;

        Ok::<(), Box<dyn std::error::Error>>(())
    })
}

/// Assemble the API router; shared by the server and the integration tests
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/stats", get(stats_handler))
        .route("/api/pass", get(list_pass_handler).post(create_pass_handler))
        .route(
            "/api/pass/{id}",
            axum::routing::put(update_pass_handler).delete(delete_pass_handler),
        )
        .route(
            "/api/defects",
            get(list_defects_handler).post(create_defect_handler),
        )
        .route(
            "/api/defects/{id}",
            axum::routing::put(update_defect_handler).delete(delete_defect_handler),
        )
        .route(
            "/api/downtime",
            get(list_downtime_handler).post(create_downtime_handler),
        )
        .route("/api/downtime/{id}", delete(delete_downtime_handler))
        .route("/api/records", delete(clear_records_handler))
        .route("/api/export/chat", get(export_chat_handler))
        .route("/api/export/sheet/{filename}", get(export_sheet_handler))
        .route("/api/export/briefing", get(export_briefing_handler))
        .route("/api/export/operator-log", get(operator_log_handler))
        .route("/api/sync/workspace", get(sync_workspace_handler))
        .route(
            "/api/sync/records/{collection}",
            get(sync_records_handler),
        )
        .layer(cors)
        .with_state(state)
}

// Health check endpoint - returns 200 OK if server is running
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

fn db_error(e: sqlx::Error) -> axum::response::Response {
    error!("Database error: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({"error": format!("Database error: {}", e)})),
    )
        .into_response()
}

fn validation_error(message: String) -> axum::response::Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(serde_json::json!({"error": message})),
    )
        .into_response()
}

/// Dashboard filter query parameters, all optional.
/// Defaults: today's date range, all areas, no VIN filter, selected scope.
#[derive(Debug, Default, Deserialize)]
pub struct StatsQuery {
    pub start_date: Option<chrono::NaiveDate>,
    pub end_date: Option<chrono::NaiveDate>,
    pub area: Option<String>,
    pub vin: Option<String>,
    pub chart_scope: Option<String>,
}

fn parse_filter(query: &StatsQuery) -> Result<FilterSpec, String> {
    let today = Local::now().date_naive();

    let area = match query.area.as_deref() {
        None | Some("") => None,
        Some(label) if label.eq_ignore_ascii_case("ALL") || label == "Geral" => None,
        Some(label) => Some(
            Area::from_str(label).ok_or_else(|| format!("Unknown area '{}'", label))?,
        ),
    };

    let chart_scope = match query.chart_scope.as_deref() {
        None | Some("") => ChartScope::Selected,
        Some(scope) if scope.eq_ignore_ascii_case("SELECTED") => ChartScope::Selected,
        Some(scope) if scope.eq_ignore_ascii_case("GENERAL") => ChartScope::General,
        Some(scope) => return Err(format!("Unknown chart scope '{}'", scope)),
    };

    Ok(FilterSpec {
        start_date: query.start_date.unwrap_or(today),
        end_date: query.end_date.unwrap_or(today),
        area,
        vin_query: query.vin.clone().unwrap_or_default(),
        chart_scope,
    })
}

fn area_label(filter: &FilterSpec) -> &'static str {
    filter.area.map(|a| a.as_str()).unwrap_or("Geral")
}

async fn stats_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatsQuery>,
) -> impl IntoResponse {
    let filter = match parse_filter(&query) {
        Ok(filter) => filter,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"error": e})),
            )
                .into_response()
        }
    };

    let snapshot = match store::load_snapshot(&state.pool).await {
        Ok(snapshot) => snapshot,
        Err(e) => return db_error(e),
    };

    let statistics = stats::compute_statistics(
        &snapshot.pass,
        &snapshot.defects,
        &snapshot.downtime,
        &filter,
    );

    (StatusCode::OK, Json(statistics)).into_response()
}

#[derive(Debug, Default, Deserialize)]
struct ForceQuery {
    force: Option<bool>,
}

async fn list_pass_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match store::load_snapshot(&state.pool).await {
        Ok(snapshot) => (StatusCode::OK, Json(snapshot.pass)).into_response(),
        Err(e) => db_error(e),
    }
}

async fn create_pass_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ForceQuery>,
    Json(payload): Json<PassEntry>,
) -> impl IntoResponse {
    let record = match entry::build_pass_record(&payload, None) {
        Ok(record) => record,
        Err(e) => return validation_error(e),
    };

    let snapshot = match store::load_snapshot(&state.pool).await {
        Ok(snapshot) => snapshot,
        Err(e) => return db_error(e),
    };

    if !query.force.unwrap_or(false) {
        if let Some(warning) = entry::duplicate_pass(&snapshot.pass, &record, None) {
            return (StatusCode::CONFLICT, Json(warning)).into_response();
        }
    }

    match store::insert_pass(&state.pool, &record).await {
        Ok(()) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(e) => db_error(e),
    }
}

async fn update_pass_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<ForceQuery>,
    Json(payload): Json<PassEntry>,
) -> impl IntoResponse {
    let snapshot = match store::load_snapshot(&state.pool).await {
        Ok(snapshot) => snapshot,
        Err(e) => return db_error(e),
    };

    let Some(existing) = snapshot.pass.iter().find(|r| r.id == id) else {
        return (StatusCode::NOT_FOUND, "Record not found").into_response();
    };

    let record = match entry::build_pass_record(&payload, Some(existing)) {
        Ok(record) => record,
        Err(e) => return validation_error(e),
    };

    if !query.force.unwrap_or(false) {
        if let Some(warning) = entry::duplicate_pass(&snapshot.pass, &record, Some(&id)) {
            return (StatusCode::CONFLICT, Json(warning)).into_response();
        }
    }

    match store::update_pass(&state.pool, &record).await {
        Ok(true) => (StatusCode::OK, Json(record)).into_response(),
        Ok(false) => (StatusCode::NOT_FOUND, "Record not found").into_response(),
        Err(e) => db_error(e),
    }
}

async fn delete_pass_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match store::delete_pass(&state.pool, &id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => (StatusCode::NOT_FOUND, "Record not found").into_response(),
        Err(e) => db_error(e),
    }
}

async fn list_defects_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match store::load_snapshot(&state.pool).await {
        Ok(snapshot) => (StatusCode::OK, Json(snapshot.defects)).into_response(),
        Err(e) => db_error(e),
    }
}

async fn create_defect_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ForceQuery>,
    Json(payload): Json<DefectEntry>,
) -> impl IntoResponse {
    let record = match entry::build_defect_record(&payload, None) {
        Ok(record) => record,
        Err(e) => return validation_error(e),
    };

    let snapshot = match store::load_snapshot(&state.pool).await {
        Ok(snapshot) => snapshot,
        Err(e) => return db_error(e),
    };

    if !query.force.unwrap_or(false) {
        if let Some(warning) = entry::duplicate_defect(&snapshot.defects, &record, None) {
            return (StatusCode::CONFLICT, Json(warning)).into_response();
        }
    }

    match store::insert_defect(&state.pool, &record).await {
        Ok(()) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(e) => db_error(e),
    }
}

async fn update_defect_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<ForceQuery>,
    Json(payload): Json<DefectEntry>,
) -> impl IntoResponse {
    let snapshot = match store::load_snapshot(&state.pool).await {
        Ok(snapshot) => snapshot,
        Err(e) => return db_error(e),
    };

    let Some(existing) = snapshot.defects.iter().find(|r| r.id == id) else {
        return (StatusCode::NOT_FOUND, "Record not found").into_response();
    };

    let record = match entry::build_defect_record(&payload, Some(existing)) {
        Ok(record) => record,
        Err(e) => return validation_error(e),
    };

    if !query.force.unwrap_or(false) {
        if let Some(warning) = entry::duplicate_defect(&snapshot.defects, &record, Some(&id)) {
            return (StatusCode::CONFLICT, Json(warning)).into_response();
        }
    }

    match store::update_defect(&state.pool, &record).await {
        Ok(true) => (StatusCode::OK, Json(record)).into_response(),
        Ok(false) => (StatusCode::NOT_FOUND, "Record not found").into_response(),
        Err(e) => db_error(e),
    }
}

async fn delete_defect_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match store::delete_defect(&state.pool, &id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => (StatusCode::NOT_FOUND, "Record not found").into_response(),
        Err(e) => db_error(e),
    }
}

async fn list_downtime_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match store::load_snapshot(&state.pool).await {
        Ok(snapshot) => (StatusCode::OK, Json(snapshot.downtime)).into_response(),
        Err(e) => db_error(e),
    }
}

async fn create_downtime_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<DowntimeEntry>,
) -> impl IntoResponse {
    let record = match entry::build_downtime_record(&payload) {
        Ok(record) => record,
        Err(e) => return validation_error(e),
    };

    match store::insert_downtime(&state.pool, &record).await {
        Ok(()) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(e) => db_error(e),
    }
}

async fn delete_downtime_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match store::delete_downtime(&state.pool, &id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => (StatusCode::NOT_FOUND, "Record not found").into_response(),
        Err(e) => db_error(e),
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfirmQuery {
    confirm: Option<bool>,
}

/// Administrative clear-all: empties the three collections, keeps metadata
async fn clear_records_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConfirmQuery>,
) -> impl IntoResponse {
    if !query.confirm.unwrap_or(false) {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "Pass confirm=true to clear all records"})),
        )
            .into_response();
    }

    match store::clear_all(&state.pool).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => db_error(e),
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatReportResponse {
    pub text: String,
    pub share_link: String,
}

async fn export_chat_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatsQuery>,
) -> impl IntoResponse {
    let filter = match parse_filter(&query) {
        Ok(filter) => filter,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"error": e})),
            )
                .into_response()
        }
    };

    let snapshot = match store::load_snapshot(&state.pool).await {
        Ok(snapshot) => snapshot,
        Err(e) => return db_error(e),
    };

    let filtered = stats::filter_snapshot(
        &snapshot.pass,
        &snapshot.defects,
        &snapshot.downtime,
        &filter,
    );
    let text = report::chat_report(&filtered, area_label(&filter), Local::now().date_naive());
    let share_link = report::chat_share_link(&text);

    (StatusCode::OK, Json(ChatReportResponse { text, share_link })).into_response()
}

async fn export_sheet_handler(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
    Query(query): Query<StatsQuery>,
) -> impl IntoResponse {
    let filter = match parse_filter(&query) {
        Ok(filter) => filter,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"error": e})),
            )
                .into_response()
        }
    };

    let snapshot = match store::load_snapshot(&state.pool).await {
        Ok(snapshot) => snapshot,
        Err(e) => return db_error(e),
    };

    let filtered = stats::filter_snapshot(
        &snapshot.pass,
        &snapshot.defects,
        &snapshot.downtime,
        &filter,
    );

    let label = area_label(&filter);
    let sheet = match filename.as_str() {
        "pass.csv" => report::pass_sheet(&filtered.pass, label),
        "defects.csv" => report::defect_sheet(&filtered.defects, label),
        "downtime.csv" => report::downtime_sheet(&filtered.downtime, label),
        _ => {
            return (
                StatusCode::NOT_FOUND,
                "Unknown sheet; expected pass.csv, defects.csv or downtime.csv",
            )
                .into_response()
        }
    };

    (
        StatusCode::OK,
        [("content-type", "text/csv; charset=utf-8")],
        report::sheet_to_csv(&sheet),
    )
        .into_response()
}

#[derive(Debug, Default, Deserialize)]
struct BriefingQuery {
    period: Option<String>,
    area: Option<String>,
}

async fn export_briefing_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BriefingQuery>,
) -> impl IntoResponse {
    let period = match query.period.as_deref() {
        None | Some("") => ReportPeriod::Weekly,
        Some(p) if p.eq_ignore_ascii_case("weekly") => ReportPeriod::Weekly,
        Some(p) if p.eq_ignore_ascii_case("monthly") => ReportPeriod::Monthly,
        Some(p) if p.eq_ignore_ascii_case("annual") => ReportPeriod::Annual,
        Some(p) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"error": format!("Unknown period '{}'", p)})),
            )
                .into_response()
        }
    };

    let mut filter = period.filter();
    match query.area.as_deref() {
        None | Some("") => {}
        Some(label) if label.eq_ignore_ascii_case("ALL") || label == "Geral" => {}
        Some(label) => match Area::from_str(label) {
            Some(area) => filter.area = Some(area),
            None => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(serde_json::json!({"error": format!("Unknown area '{}'", label)})),
                )
                    .into_response()
            }
        },
    }

    let snapshot = match store::load_snapshot(&state.pool).await {
        Ok(snapshot) => snapshot,
        Err(e) => return db_error(e),
    };

    let filtered = stats::filter_snapshot(
        &snapshot.pass,
        &snapshot.defects,
        &snapshot.downtime,
        &filter,
    );
    let briefing = report::build_briefing(&filtered, period, area_label(&filter));

    (StatusCode::OK, Json(briefing)).into_response()
}

#[derive(Debug, Default, Deserialize)]
struct OperatorLogQuery {
    operator_id: Option<String>,
}

async fn operator_log_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<OperatorLogQuery>,
) -> impl IntoResponse {
    let snapshot = match store::load_snapshot(&state.pool).await {
        Ok(snapshot) => snapshot,
        Err(e) => return db_error(e),
    };

    let events = report::operator_log(
        &snapshot.pass,
        &snapshot.defects,
        query.operator_id.as_deref().unwrap_or(""),
    );

    (StatusCode::OK, Json(events)).into_response()
}

async fn sync_workspace_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (pass_count, defect_count, downtime_count) =
        match store::record_counts(&state.pool).await {
            Ok(counts) => counts,
            Err(e) => return db_error(e),
        };

    (
        StatusCode::OK,
        Json(WorkspaceInfo {
            workspace: state.workspace.clone(),
            workspace_id: state.workspace_id.clone(),
            version: EXPECTED_DB_VERSION.to_string(),
            pass_count,
            defect_count,
            downtime_count,
        }),
    )
        .into_response()
}

#[derive(Debug, Default, Deserialize)]
struct PageQuery {
    limit: Option<u64>,
    offset: Option<u64>,
}

/// Maximum page size for sync pulls
const MAX_SYNC_PAGE: u64 = 1000;

async fn sync_records_handler(
    State(state): State<Arc<AppState>>,
    Path(collection): Path<String>,
    Query(query): Query<PageQuery>,
) -> impl IntoResponse {
    let limit = query.limit.unwrap_or(200).min(MAX_SYNC_PAGE);
    let offset = query.offset.unwrap_or(0);

    match collection.as_str() {
        "pass" => match store::pass_page(&state.pool, limit, offset).await {
            Ok(records) => (StatusCode::OK, Json(records)).into_response(),
            Err(e) => db_error(e),
        },
        "defects" => match store::defect_page(&state.pool, limit, offset).await {
            Ok(records) => (StatusCode::OK, Json(records)).into_response(),
            Err(e) => db_error(e),
        },
        "downtime" => match store::downtime_page(&state.pool, limit, offset).await {
            Ok(records) => (StatusCode::OK, Json(records)).into_response(),
            Err(e) => db_error(e),
        },
        _ => (
            StatusCode::NOT_FOUND,
            "Unknown collection; expected pass, defects or downtime",
        )
            .into_response(),
    }
}
