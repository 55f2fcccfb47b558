//! Per-element updates from the worship team and readers
//!
//! Each update loads the stored document, changes one element and saves the
//! whole document back, holding the write lock so a draft or full save for
//! the date cannot interleave.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use tracing::info;

use cvc_common::order::{ServiceElement, SongSelection};

use super::services::{load_document, parse_date};
use super::ApiError;
use crate::AppState;

/// PUT /api/services/:date/elements/:id/selection
///
/// Body is a song selection, or `null` to clear the pick.
pub async fn set_selection(
    State(state): State<AppState>,
    Path((date, id)): Path<(String, String)>,
    Json(selection): Json<Option<SongSelection>>,
) -> Result<Json<ServiceElement>, ApiError> {
    let date = parse_date(&date)?;
    let _writes = state.drafts.lock_writes().await;
    let mut document = load_document(&state, date).await?;

    let element = document.apply_selection(&id, selection)?.clone();
    state.store.save(&document).await?;

    info!(date = %date, element = %id, content = %element.content, "Recorded song selection");
    Ok(Json(element))
}

#[derive(Debug, Deserialize)]
pub struct ReferenceRequest {
    #[serde(default)]
    pub reference: String,
}

/// PUT /api/services/:date/elements/:id/reference
pub async fn set_reference(
    State(state): State<AppState>,
    Path((date, id)): Path<(String, String)>,
    Json(request): Json<ReferenceRequest>,
) -> Result<Json<ServiceElement>, ApiError> {
    let date = parse_date(&date)?;
    let _writes = state.drafts.lock_writes().await;
    let mut document = load_document(&state, date).await?;

    let element = document.apply_reference(&id, &request.reference)?.clone();
    state.store.save(&document).await?;

    info!(date = %date, element = %id, "Recorded reference");
    Ok(Json(element))
}
