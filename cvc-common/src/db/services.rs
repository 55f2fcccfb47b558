//! Service document store
//!
//! The persistence gateway for service documents: a date-keyed collection
//! with whole-document upsert. There is no locking and no version check; the
//! last successful save for a date wins. Callers that save re-parsed text
//! must reconcile against a fresh `load` first.

use async_trait::async_trait;
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::debug;

use crate::order::{ServiceDocument, ServiceElement, ServiceType};
use crate::time::ServiceDate;
use crate::{Error, Result};

/// Date-keyed service document storage
#[async_trait]
pub trait ServiceStore: Send + Sync {
    /// Stored document for a date, if one was ever saved
    async fn load(&self, date: ServiceDate) -> Result<Option<ServiceDocument>>;

    /// Replace the whole document for its date (idempotent)
    async fn save(&self, document: &ServiceDocument) -> Result<()>;

    /// All stored documents in chronological order
    async fn list(&self) -> Result<Vec<ServiceDocument>>;

    /// Reset a date to the empty document, keeping the date key
    async fn clear(&self, date: ServiceDate) -> Result<ServiceDocument> {
        let cleared = ServiceDocument::cleared(date);
        self.save(&cleared).await?;
        Ok(cleared)
    }
}

/// SQLite-backed store (`services` table)
#[derive(Clone)]
pub struct SqliteServiceStore {
    pool: SqlitePool,
}

impl SqliteServiceStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Element ids must be unique within a document
fn check_ids(document: &ServiceDocument) -> Result<()> {
    match document.find_duplicate_id() {
        Some(id) => Err(Error::InvalidInput(format!(
            "Duplicate element id {} in service {}",
            id, document.date
        ))),
        None => Ok(()),
    }
}

type ServiceRow = (String, String, String, String);

fn document_from_row((date, service_type, content, elements): ServiceRow) -> Result<ServiceDocument> {
    let elements: Vec<ServiceElement> = serde_json::from_str(&elements)?;
    Ok(ServiceDocument::new(
        ServiceDate::parse(&date)?,
        ServiceType::parse(&service_type),
        content,
        elements,
    ))
}

#[async_trait]
impl ServiceStore for SqliteServiceStore {
    async fn load(&self, date: ServiceDate) -> Result<Option<ServiceDocument>> {
        let row = sqlx::query_as::<_, ServiceRow>(
            "SELECT date, service_type, content, elements FROM services WHERE date = ?",
        )
        .bind(date.key())
        .fetch_optional(&self.pool)
        .await?;

        row.map(document_from_row).transpose()
    }

    async fn save(&self, document: &ServiceDocument) -> Result<()> {
        check_ids(document)?;
        let elements = serde_json::to_string(&document.elements)?;

        sqlx::query(
            r#"
            INSERT INTO services (date, service_type, content, elements, updated_at)
            VALUES (?, ?, ?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(date) DO UPDATE SET
                service_type = excluded.service_type,
                content = excluded.content,
                elements = excluded.elements,
                updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(document.date.key())
        .bind(document.service_type.as_str())
        .bind(&document.content)
        .bind(elements)
        .execute(&self.pool)
        .await?;

        debug!(
            date = %document.date,
            service_type = %document.service_type,
            elements = document.elements.len(),
            "Saved service document"
        );
        Ok(())
    }

    async fn list(&self) -> Result<Vec<ServiceDocument>> {
        let rows = sqlx::query_as::<_, ServiceRow>(
            "SELECT date, service_type, content, elements FROM services",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut documents = rows
            .into_iter()
            .map(document_from_row)
            .collect::<Result<Vec<_>>>()?;
        documents.sort_by_key(|d| d.date);
        Ok(documents)
    }
}

/// In-process store for tests and tooling
#[derive(Default)]
pub struct MemoryServiceStore {
    documents: RwLock<BTreeMap<ServiceDate, ServiceDocument>>,
}

impl MemoryServiceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ServiceStore for MemoryServiceStore {
    async fn load(&self, date: ServiceDate) -> Result<Option<ServiceDocument>> {
        Ok(self.documents.read().await.get(&date).cloned())
    }

    async fn save(&self, document: &ServiceDocument) -> Result<()> {
        check_ids(document)?;
        self.documents
            .write()
            .await
            .insert(document.date, document.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<ServiceDocument>> {
        Ok(self.documents.read().await.values().cloned().collect())
    }
}
