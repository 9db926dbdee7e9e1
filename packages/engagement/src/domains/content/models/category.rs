use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::CategoryId;

/// Catalog section a product can belong to.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateCategory {
    pub name: String,
    pub description: Option<String>,
}

impl Category {
    pub async fn create(input: CreateCategory, pool: &PgPool) -> Result<Self> {
        let category = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (id, name, description)
             VALUES ($1, $2, $3)
             RETURNING *",
        )
        .bind(CategoryId::new())
        .bind(input.name)
        .bind(input.description)
        .fetch_one(pool)
        .await?;
        Ok(category)
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<Self>> {
        let categories = sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY name")
            .fetch_all(pool)
            .await?;
        Ok(categories)
    }
}
