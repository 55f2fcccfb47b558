//! Pastor save pipeline
//!
//! ```text
//! load stored document -> parse (reusing stored elements) -> reconcile
//! against stored elements -> whole-document save
//! ```
//!
//! The same steps back the save, draft and preview endpoints; preview stops
//! before the save.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;

use cvc_common::db::{get_custom_service, ServiceStore};
use cvc_common::order::{
    parse_order, reconcile_with_report, template_for, ReconcileReport, ServiceDocument,
    ServiceType,
};
use cvc_common::{Error, Result, ServiceDate};

/// Body of a save, draft or preview request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderRequest {
    #[serde(rename = "type", default)]
    pub service_type: ServiceType,

    /// Raw order-of-worship text; empty means "start from the template"
    #[serde(default)]
    pub content: String,
}

/// Reconciled document and what was carried over from the stored one
#[derive(Debug, Clone, Serialize)]
pub struct OrderOutcome {
    pub service: ServiceDocument,
    pub report: ReconcileReport,
}

/// Template text for a service type: built-in orders, then custom services
pub async fn template_text(db: &SqlitePool, service_type: &ServiceType) -> Result<Option<String>> {
    if let Some(text) = template_for(service_type) {
        return Ok(Some(text.to_string()));
    }
    match service_type {
        ServiceType::Custom(id) => Ok(get_custom_service(db, id).await?.map(|s| s.content)),
        _ => Ok(None),
    }
}

/// Parse and reconcile a request against the stored document, without saving
pub async fn prepare_order(
    store: &dyn ServiceStore,
    db: &SqlitePool,
    date: ServiceDate,
    request: OrderRequest,
) -> Result<OrderOutcome> {
    let prior = store
        .load(date)
        .await?
        .map(|document| document.elements)
        .unwrap_or_default();

    let content = if request.content.trim().is_empty() {
        match template_text(db, &request.service_type).await? {
            Some(text) => text,
            None if matches!(request.service_type, ServiceType::Custom(_)) => {
                return Err(Error::NotFound(format!(
                    "Custom service {}",
                    request.service_type
                )));
            }
            None => String::new(),
        }
    } else {
        request.content
    };

    let parsed = parse_order(&date.key(), &content, &prior);
    let (elements, report) = reconcile_with_report(&parsed, &prior);

    Ok(OrderOutcome {
        service: ServiceDocument::new(date, request.service_type, content, elements),
        report,
    })
}

/// Run the full pipeline and store the result
pub async fn save_order(
    store: &dyn ServiceStore,
    db: &SqlitePool,
    date: ServiceDate,
    request: OrderRequest,
) -> Result<OrderOutcome> {
    let outcome = prepare_order(store, db, date, request).await?;
    store.save(&outcome.service).await?;

    info!(
        date = %date,
        service_type = %outcome.service.service_type,
        elements = outcome.service.elements.len(),
        songs_kept = outcome.report.songs_kept(),
        references_restored = outcome.report.references_restored,
        "Saved order of worship"
    );
    Ok(outcome)
}
