//! Service document endpoints
//!
//! `:date` is `M-D-YY` in URLs; a percent-encoded `M/D/YY` is accepted too.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::info;

use cvc_common::order::{Readiness, ServiceDocument};
use cvc_common::ServiceDate;

use super::ApiError;
use crate::orders::{prepare_order, save_order, OrderOutcome, OrderRequest};
use crate::AppState;

pub(crate) fn parse_date(raw: &str) -> Result<ServiceDate, ApiError> {
    Ok(ServiceDate::parse(raw)?)
}

/// Stored document for a date, or 404
pub(crate) async fn load_document(
    state: &AppState,
    date: ServiceDate,
) -> Result<ServiceDocument, ApiError> {
    state
        .store
        .load(date)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No service stored for {}", date)))
}

/// GET /api/services
pub async fn list_services(
    State(state): State<AppState>,
) -> Result<Json<Vec<ServiceDocument>>, ApiError> {
    Ok(Json(state.store.list().await?))
}

/// GET /api/services/:date
pub async fn get_service(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<ServiceDocument>, ApiError> {
    let date = parse_date(&date)?;
    Ok(Json(load_document(&state, date).await?))
}

/// PUT /api/services/:date
///
/// Full pastor save. Any draft for the same date is superseded: one still
/// waiting is dropped, one being written finishes first, so no draft lands
/// after this save.
pub async fn save_service(
    State(state): State<AppState>,
    Path(date): Path<String>,
    Json(request): Json<OrderRequest>,
) -> Result<Json<OrderOutcome>, ApiError> {
    let date = parse_date(&date)?;
    let _writes = state.drafts.supersede(date).await;

    let outcome = save_order(state.store.as_ref(), &state.db, date, request).await?;
    Ok(Json(outcome))
}

#[derive(Debug, Serialize)]
pub struct DraftAccepted {
    pub date: ServiceDate,
    pub delay_ms: u64,
}

/// PUT /api/services/:date/draft
pub async fn save_draft(
    State(state): State<AppState>,
    Path(date): Path<String>,
    Json(request): Json<OrderRequest>,
) -> Result<(StatusCode, Json<DraftAccepted>), ApiError> {
    let date = parse_date(&date)?;
    state.drafts.schedule(date, request);

    Ok((
        StatusCode::ACCEPTED,
        Json(DraftAccepted {
            date,
            delay_ms: state.drafts.delay().as_millis() as u64,
        }),
    ))
}

/// POST /api/services/:date/preview
pub async fn preview_service(
    State(state): State<AppState>,
    Path(date): Path<String>,
    Json(request): Json<OrderRequest>,
) -> Result<Json<OrderOutcome>, ApiError> {
    let date = parse_date(&date)?;
    let outcome = prepare_order(state.store.as_ref(), &state.db, date, request).await?;
    Ok(Json(outcome))
}

/// DELETE /api/services/:date
///
/// Clears the document; the date stays listed with no type and no elements.
pub async fn delete_service(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<ServiceDocument>, ApiError> {
    let date = parse_date(&date)?;
    let _writes = state.drafts.supersede(date).await;

    let cleared = state.store.clear(date).await?;
    info!(date = %date, "Cleared service");
    Ok(Json(cleared))
}

/// GET /api/services/:date/readiness
pub async fn get_readiness(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<Readiness>, ApiError> {
    let date = parse_date(&date)?;
    let document = load_document(&state, date).await?;
    Ok(Json(document.readiness()))
}
