use axum::{
    extract::{DefaultBodyLimit, Path, State},
    routing::{get, post, put},
    Router,
    Json,
    http::Method,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_http::cors::{CorsLayer, Any};
use crate::{
    AppState,
    error::AppError,
    models::{ParsedBusinessPlan, ProjectStatus},
    services::{
        excel::layout::{coordinate_table, LayoutEntry, SECTION_NAMES},
        storage_client::check_size,
    },
};

pub fn routes(max_file_size: usize) -> Router<Arc<AppState>> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/parse-excel", post(parse_excel))
        .route("/plans/extract", post(extract_plan))
        .route("/projects/:id/upload", post(upload_plan))
        .route("/projects/:id/data", get(project_data))
        .route("/projects/:id/data/:section", put(replace_section))
        .route("/template/layout", get(template_layout))
        .layer(DefaultBodyLimit::max(max_file_size))
        .layer(cors)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseRequest {
    project_id: Option<String>,
    file_path: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ParseResponse {
    success: bool,
    sections: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDataResponse {
    project_id: String,
    status: ProjectStatus,
    sections: BTreeMap<String, Value>,
}

fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

async fn parse_excel(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ParseRequest>,
) -> Result<Json<ParseResponse>, AppError> {
    let (Some(project_id), Some(file_path)) = (required(request.project_id), required(request.file_path)) else {
        return Err(AppError::InvalidInput("Missing parameters".to_string()));
    };

    let summary = state.ingestor.ingest(&project_id, &file_path).await?;

    Ok(Json(ParseResponse {
        success: true,
        sections: summary.sections,
    }))
}

async fn extract_plan(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ParsedBusinessPlan>, AppError> {
    if body.is_empty() {
        return Err(AppError::InvalidInput("Empty request body".to_string()));
    }
    check_size(body.len(), state.config.max_file_size)?;
    tracing::info!("Extracting plan from uploaded body, size: {}KB", body.len() / 1024);

    let plan = state.ingestor.extract_bytes(body)?;
    Ok(Json(plan))
}

async fn upload_plan(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<String>,
    body: Bytes,
) -> Result<Json<ParseResponse>, AppError> {
    if body.is_empty() {
        return Err(AppError::InvalidInput("Empty request body".to_string()));
    }
    check_size(body.len(), state.config.max_file_size)?;

    let summary = state.ingestor.ingest_bytes(&project_id, body)?;
    Ok(Json(ParseResponse {
        success: true,
        sections: summary.sections,
    }))
}

async fn project_data(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<String>,
) -> Result<Json<ProjectDataResponse>, AppError> {
    let status = state
        .store
        .status(&project_id)?
        .ok_or_else(|| AppError::NotFound(format!("Project {} not found", project_id)))?;
    let sections = state.store.load_sections(&project_id)?;

    Ok(Json(ProjectDataResponse {
        project_id,
        status,
        sections,
    }))
}

async fn replace_section(
    State(state): State<Arc<AppState>>,
    Path((project_id, section)): Path<(String, String)>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, AppError> {
    if !SECTION_NAMES.contains(&section.as_str()) {
        return Err(AppError::InvalidInput(format!("Unknown section '{}'", section)));
    }
    if state.store.status(&project_id)?.is_none() {
        return Err(AppError::NotFound(format!("Project {} not found", project_id)));
    }

    state.store.replace_section(&project_id, &section, &payload)?;
    Ok(Json(serde_json::json!({ "success": true })))
}

async fn template_layout() -> Json<Vec<LayoutEntry>> {
    Json(coordinate_table())
}
