//! Custom service endpoints
//!
//! Free-form orders (Christmas Eve, Easter Vigil) are first run through the
//! import endpoint, which classifies every line and flags likely misspellings
//! for review, then stored as templates.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use cvc_common::db::{self, CustomService};
use cvc_common::order::{import_order, ImportLine};

use super::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateCustomServiceRequest {
    pub name: String,
    #[serde(default)]
    pub content: String,
}

/// GET /api/custom-services
pub async fn list_custom_services(
    State(state): State<AppState>,
) -> Result<Json<Vec<CustomService>>, ApiError> {
    Ok(Json(db::list_custom_services(&state.db).await?))
}

/// POST /api/custom-services
pub async fn create_custom_service(
    State(state): State<AppState>,
    Json(request): Json<CreateCustomServiceRequest>,
) -> Result<(StatusCode, Json<CustomService>), ApiError> {
    let service = db::create_custom_service(&state.db, &request.name, &request.content).await?;
    Ok((StatusCode::CREATED, Json(service)))
}

/// GET /api/custom-services/:id
pub async fn get_custom_service(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CustomService>, ApiError> {
    db::get_custom_service(&state.db, &id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Custom service {} not found", id)))
}

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub lines: Vec<ImportLine>,
    /// Lines carrying a spelling suggestion
    pub suggestions: usize,
}

/// POST /api/custom-services/import
pub async fn import_custom_service(
    Json(request): Json<ImportRequest>,
) -> Result<Json<ImportResponse>, ApiError> {
    let lines = import_order(&request.content);
    if lines.is_empty() {
        return Err(ApiError::BadRequest("Nothing to import".to_string()));
    }

    let suggestions = lines
        .iter()
        .filter(|line| line.classification.suggestion.is_some())
        .count();

    Ok(Json(ImportResponse { lines, suggestions }))
}
