use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Local;
use serde_json::json;

mod batch;
mod export;
mod extract;
mod models;

use models::{BatchRequest, BatchResponse, ResultTable, SeoField};

#[derive(Clone)]
struct AppState {
    client: reqwest::Client,
    allow_empty_fields: bool,
}

struct AppConfig {
    bind: String,
    allow_empty_fields: bool,
}

impl AppConfig {
    fn from_env() -> Self {
        AppConfig {
            bind: std::env::var("SEO_EXTRACTOR_BIND")
                .unwrap_or_else(|_| "0.0.0.0:8000".into()),
            allow_empty_fields: std::env::var("SEO_EXTRACTOR_ALLOW_EMPTY_FIELDS")
                .as_deref()
                == Ok("1"),
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = AppConfig::from_env();
    let state = AppState {
        client: extract::build_client().unwrap(),
        allow_empty_fields: config.allow_empty_fields,
    };

    let app = Router::new()
        .route("/", get(dashboard))
        .route("/health", get(health))
        .route("/api/fields", get(fields_endpoint))
        .route("/api/extract", post(extract_endpoint))
        .route("/api/export", post(export_endpoint))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.bind).await.unwrap();
    tracing::info!("listening on {}", listener.local_addr().unwrap());
    axum::serve(listener, app).await.unwrap();
}

async fn dashboard() -> Html<&'static str> {
    Html(include_str!("dashboard.html"))
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

/// Selectable fields, in display order, for building the form.
async fn fields_endpoint() -> impl IntoResponse {
    let fields: Vec<_> = SeoField::ALL
        .iter()
        .map(|f| json!({"name": f, "label": f.label()}))
        .collect();
    Json(json!({"fields": fields}))
}

async fn extract_endpoint(
    State(state): State<AppState>,
    Json(req): Json<BatchRequest>,
) -> Response {
    match run_batch_request(&state, &req).await {
        Ok(table) => {
            let analyzed = table.rows.len();
            (StatusCode::OK, Json(BatchResponse { analyzed, table })).into_response()
        }
        Err(resp) => resp,
    }
}

async fn export_endpoint(
    State(state): State<AppState>,
    Json(req): Json<BatchRequest>,
) -> Response {
    let table = match run_batch_request(&state, &req).await {
        Ok(table) => table,
        Err(resp) => return resp,
    };
    match export::workbook_bytes(&table) {
        Ok(bytes) => {
            let filename = export::export_filename(Local::now());
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, export::XLSX_MIME.to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{}\"", filename),
                    ),
                ],
                bytes,
            )
                .into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"detail": format!("Export failed: {}", e)})),
        )
            .into_response(),
    }
}

/// Shared validation + batch run for the extract and export endpoints.
async fn run_batch_request(
    state: &AppState,
    req: &BatchRequest,
) -> Result<ResultTable, Response> {
    let urls = batch::parse_url_lines(&req.urls);
    if urls.is_empty() {
        return Err(bad_request("Provide at least one URL"));
    }
    if req.fields.is_empty() && !state.allow_empty_fields {
        return Err(bad_request("Select at least one field"));
    }

    let reports = batch::run_batch(&state.client, &urls, |done, total| {
        tracing::info!("analyzed {}/{}", done, total);
    })
    .await;
    Ok(batch::build_table(&reports, &req.fields))
}

fn bad_request(detail: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({"detail": detail}))).into_response()
}
