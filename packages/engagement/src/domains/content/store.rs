//! View-accounting port over the content tables.
//!
//! `record_view` is the one operation the read path needs: increment the
//! entity's view counter by exactly one, persist it, and — inside the same
//! atomic unit — claim the threshold crossing by stamping `notified_at`.
//! Fusing the claim into the increment is what makes the notification
//! fire exactly once per entity even when two requests observe the
//! crossing count simultaneously.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use thiserror::Error;

use crate::common::{ArticleId, ProductId};
use crate::domains::content::models::{Article, Product};

/// Reference to a viewable entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentRef {
    Article(ArticleId),
    Product(ProductId),
}

impl std::fmt::Display for ContentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentRef::Article(id) => write!(f, "article {}", id),
            ContentRef::Product(id) => write!(f, "product {}", id),
        }
    }
}

/// Snapshot of an entity right after a recorded view.
#[derive(Debug, Clone)]
pub struct ViewedContent {
    pub content: ContentRef,
    pub title: String,
    /// Counter value including this view.
    pub view_count: i64,
    /// When the threshold notification was claimed, if ever.
    pub notified_at: Option<DateTime<Utc>>,
    /// True iff this view claimed the crossing. At most one view per
    /// entity (per epoch) observes `true`.
    pub newly_crossed: bool,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("content not found: {0}")]
    NotFound(ContentRef),
    #[error("write conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait BaseContentStore: Send + Sync {
    /// Increment the view counter and claim the threshold crossing in one
    /// atomic unit.
    async fn record_view(
        &self,
        content: ContentRef,
        threshold: i64,
    ) -> Result<ViewedContent, StoreError>;
}

/// PostgreSQL-backed store.
///
/// The `UPDATE .. RETURNING` inside the transaction takes the entity's row
/// lock, so concurrent views of the same entity serialize there; views of
/// different entities never contend with each other.
pub struct PgContentStore {
    pool: PgPool,
}

impl PgContentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BaseContentStore for PgContentStore {
    async fn record_view(
        &self,
        content: ContentRef,
        threshold: i64,
    ) -> Result<ViewedContent, StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_db_err)?;

        let viewed = match content {
            ContentRef::Article(id) => Article::record_view(id, threshold, &mut tx).await,
            ContentRef::Product(id) => Product::record_view(id, threshold, &mut tx).await,
        }
        .map_err(map_db_err)?;

        let Some(viewed) = viewed else {
            // Transaction rolls back on drop.
            return Err(StoreError::NotFound(content));
        };

        tx.commit().await.map_err(map_db_err)?;
        Ok(viewed)
    }
}

/// Serialization failures and deadlocks are retryable conflicts; anything
/// else surfaces as a database error.
fn map_db_err(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if matches!(db.code().as_deref(), Some("40001") | Some("40P01")) {
            return StoreError::Conflict(db.message().to_string());
        }
    }
    StoreError::Database(err)
}
