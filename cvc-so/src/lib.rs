//! cvc-so library - Service Order module
//!
//! Backend for the pastor's order-of-worship editor and the volunteer views
//! that fill it in: raw order text goes in, a reconciled element list comes
//! out, and song picks and reading references are recorded per element.

use axum::Router;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use cvc_common::db::{ServiceStore, SqliteServiceStore};

pub mod api;
pub mod drafts;
pub mod orders;

use drafts::DraftSaver;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Service document store
    pub store: Arc<dyn ServiceStore>,
    /// Database pool for custom service templates
    pub db: SqlitePool,
    /// Per-date debounced autosave
    pub drafts: Arc<DraftSaver>,
}

impl AppState {
    /// State backed by the SQLite `services` table
    pub fn new(db: SqlitePool, draft_delay: Duration) -> Self {
        let store: Arc<dyn ServiceStore> = Arc::new(SqliteServiceStore::new(db.clone()));
        Self::with_store(store, db, draft_delay)
    }

    pub fn with_store(store: Arc<dyn ServiceStore>, db: SqlitePool, draft_delay: Duration) -> Self {
        let drafts = Arc::new(DraftSaver::new(Arc::clone(&store), db.clone(), draft_delay));
        Self { store, db, drafts }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post, put};

    let services = Router::new()
        .route("/api/services", get(api::list_services))
        .route(
            "/api/services/:date",
            get(api::get_service)
                .put(api::save_service)
                .delete(api::delete_service),
        )
        .route("/api/services/:date/draft", put(api::save_draft))
        .route("/api/services/:date/preview", post(api::preview_service))
        .route("/api/services/:date/readiness", get(api::get_readiness))
        .route(
            "/api/services/:date/elements/:id/selection",
            put(api::set_selection),
        )
        .route(
            "/api/services/:date/elements/:id/reference",
            put(api::set_reference),
        );

    let templates = Router::new()
        .route("/api/templates/:service_type", get(api::get_template))
        .route(
            "/api/custom-services",
            get(api::list_custom_services).post(api::create_custom_service),
        )
        .route("/api/custom-services/import", post(api::import_custom_service))
        .route("/api/custom-services/:id", get(api::get_custom_service));

    Router::new()
        .merge(services)
        .merge(templates)
        .route("/api/buildinfo", get(api::get_build_info))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
