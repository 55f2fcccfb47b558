//! Service-type template endpoint

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use cvc_common::order::ServiceType;

use super::ApiError;
use crate::orders::template_text;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct TemplateResponse {
    #[serde(rename = "type")]
    pub service_type: ServiceType,
    pub content: String,
}

/// GET /api/templates/:service_type
///
/// Built-in order for `no_communion`, `communion` and `communion_potluck`;
/// any other value is looked up as a custom service id.
pub async fn get_template(
    State(state): State<AppState>,
    Path(service_type): Path<String>,
) -> Result<Json<TemplateResponse>, ApiError> {
    let service_type = ServiceType::parse(&service_type);
    if service_type.is_unset() {
        return Err(ApiError::BadRequest("Service type is required".to_string()));
    }

    let content = template_text(&state.db, &service_type)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No template for service type {}", service_type)))?;

    Ok(Json(TemplateResponse {
        service_type,
        content,
    }))
}
