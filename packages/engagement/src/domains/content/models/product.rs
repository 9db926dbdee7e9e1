use anyhow::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};

use crate::common::{CategoryId, ProductId};
use crate::domains::content::store::{ContentRef, ViewedContent};

/// Catalog product.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category_id: Option<CategoryId>,
    pub view_count: i64,
    /// Set once the threshold notification has fired for this product.
    pub notified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateProduct {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category_id: Option<CategoryId>,
}

#[derive(Debug, Clone, Default)]
pub struct EditProduct {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub category_id: Option<CategoryId>,
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl Product {
    /// Find product by ID
    pub async fn find_by_id(id: ProductId, pool: &PgPool) -> Result<Option<Self>> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(product)
    }

    /// All products, newest first
    pub async fn list(limit: i64, offset: i64, pool: &PgPool) -> Result<Vec<Self>> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products
             ORDER BY created_at DESC
             LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
        Ok(products)
    }

    /// Create a new product (counter starts at zero)
    pub async fn create(input: CreateProduct, pool: &PgPool) -> Result<Self> {
        let product = sqlx::query_as::<_, Product>(
            "INSERT INTO products
                 (id, name, description, price, category_id, view_count, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, 0, NOW(), NOW())
             RETURNING *",
        )
        .bind(ProductId::new())
        .bind(input.name)
        .bind(input.description)
        .bind(input.price)
        .bind(input.category_id)
        .fetch_one(pool)
        .await?;
        Ok(product)
    }

    /// Apply a partial edit. Returns None if the product does not exist.
    pub async fn update(id: ProductId, changes: EditProduct, pool: &PgPool) -> Result<Option<Self>> {
        let product = sqlx::query_as::<_, Product>(
            "UPDATE products
             SET name = COALESCE($2, name),
                 description = COALESCE($3, description),
                 price = COALESCE($4, price),
                 category_id = COALESCE($5, category_id),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(changes.name)
        .bind(changes.description)
        .bind(changes.price)
        .bind(changes.category_id)
        .fetch_optional(pool)
        .await?;
        Ok(product)
    }

    /// Delete a product. Returns whether a row was removed.
    pub async fn delete(id: ProductId, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Increment the view counter and claim the threshold crossing.
    ///
    /// Same contract as `Article::record_view`: runs in the caller's
    /// transaction, row lock serializes concurrent views, None for a
    /// missing product.
    pub(crate) async fn record_view(
        id: ProductId,
        threshold: i64,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Option<ViewedContent>, sqlx::Error> {
        let row = sqlx::query_as::<_, (String, i64, Option<DateTime<Utc>>)>(
            "UPDATE products
             SET view_count = view_count + 1
             WHERE id = $1
             RETURNING name, view_count, notified_at",
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;

        let Some((name, view_count, mut notified_at)) = row else {
            return Ok(None);
        };

        let mut newly_crossed = false;
        if notified_at.is_none() && view_count >= threshold {
            notified_at = Some(
                sqlx::query_scalar::<_, DateTime<Utc>>(
                    "UPDATE products SET notified_at = NOW() WHERE id = $1 RETURNING notified_at",
                )
                .bind(id)
                .fetch_one(&mut **tx)
                .await?,
            );
            newly_crossed = true;
        }

        Ok(Some(ViewedContent {
            content: ContentRef::Product(id),
            title: name,
            view_count,
            notified_at,
            newly_crossed,
        }))
    }

    /// Clear the notification marker, re-arming the threshold alert.
    pub async fn reset_notification(id: ProductId, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query("UPDATE products SET notified_at = NULL WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
