//! Custom service templates
//!
//! Services that do not follow one of the built-in orders (Christmas Eve,
//! Easter Vigil, a combined outdoor service) store their own template text.
//! A service document whose type is a custom service id is seeded from it.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::{Error, Result};

/// Stored custom service template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomService {
    pub id: String,
    pub name: String,
    /// Raw order-of-worship text
    pub content: String,
}

/// Store a new custom service under a fresh id
pub async fn create_custom_service(
    pool: &SqlitePool,
    name: &str,
    content: &str,
) -> Result<CustomService> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::InvalidInput("Custom service name is required".to_string()));
    }

    let service = CustomService {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        content: content.trim().to_string(),
    };

    sqlx::query("INSERT INTO custom_services (id, name, content) VALUES (?, ?, ?)")
        .bind(&service.id)
        .bind(&service.name)
        .bind(&service.content)
        .execute(pool)
        .await?;

    info!(id = %service.id, name = %service.name, "Created custom service");
    Ok(service)
}

pub async fn get_custom_service(pool: &SqlitePool, id: &str) -> Result<Option<CustomService>> {
    let row = sqlx::query_as::<_, (String, String, String)>(
        "SELECT id, name, content FROM custom_services WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|(id, name, content)| CustomService { id, name, content }))
}

/// All custom services, by name
pub async fn list_custom_services(pool: &SqlitePool) -> Result<Vec<CustomService>> {
    let rows = sqlx::query_as::<_, (String, String, String)>(
        "SELECT id, name, content FROM custom_services ORDER BY name COLLATE NOCASE, created_at",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, name, content)| CustomService { id, name, content })
        .collect())
}
