use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};

use crate::common::ArticleId;
use crate::domains::content::store::{ContentRef, ViewedContent};

/// Blog article.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Article {
    pub id: ArticleId,
    pub title: String,
    pub body: String,
    /// Unpublished articles are hidden from listings but stay addressable.
    pub published: bool,
    pub view_count: i64,
    /// Set once the threshold notification has fired for this article.
    pub notified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateArticle {
    pub title: String,
    pub body: String,
    pub published: bool,
}

#[derive(Debug, Clone, Default)]
pub struct EditArticle {
    pub title: Option<String>,
    pub body: Option<String>,
    pub published: Option<bool>,
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl Article {
    /// Find article by ID
    pub async fn find_by_id(id: ArticleId, pool: &PgPool) -> Result<Option<Self>> {
        let article = sqlx::query_as::<_, Article>("SELECT * FROM articles WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(article)
    }

    /// Published articles, newest first
    pub async fn list_published(limit: i64, offset: i64, pool: &PgPool) -> Result<Vec<Self>> {
        let articles = sqlx::query_as::<_, Article>(
            "SELECT * FROM articles
             WHERE published
             ORDER BY created_at DESC
             LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
        Ok(articles)
    }

    /// Create a new article (counter starts at zero)
    pub async fn create(input: CreateArticle, pool: &PgPool) -> Result<Self> {
        let article = sqlx::query_as::<_, Article>(
            "INSERT INTO articles (id, title, body, published, view_count, created_at, updated_at)
             VALUES ($1, $2, $3, $4, 0, NOW(), NOW())
             RETURNING *",
        )
        .bind(ArticleId::new())
        .bind(input.title)
        .bind(input.body)
        .bind(input.published)
        .fetch_one(pool)
        .await?;
        Ok(article)
    }

    /// Apply a partial edit. Returns None if the article does not exist.
    pub async fn update(id: ArticleId, changes: EditArticle, pool: &PgPool) -> Result<Option<Self>> {
        let article = sqlx::query_as::<_, Article>(
            "UPDATE articles
             SET title = COALESCE($2, title),
                 body = COALESCE($3, body),
                 published = COALESCE($4, published),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(changes.title)
        .bind(changes.body)
        .bind(changes.published)
        .fetch_optional(pool)
        .await?;
        Ok(article)
    }

    /// Delete an article. Returns whether a row was removed.
    pub async fn delete(id: ArticleId, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query("DELETE FROM articles WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Increment the view counter and claim the threshold crossing.
    ///
    /// Runs inside the caller's transaction; the first UPDATE takes the row
    /// lock that serializes concurrent views of this article. Returns None
    /// if the article does not exist.
    pub(crate) async fn record_view(
        id: ArticleId,
        threshold: i64,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Option<ViewedContent>, sqlx::Error> {
        let row = sqlx::query_as::<_, (String, i64, Option<DateTime<Utc>>)>(
            "UPDATE articles
             SET view_count = view_count + 1
             WHERE id = $1
             RETURNING title, view_count, notified_at",
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;

        let Some((title, view_count, mut notified_at)) = row else {
            return Ok(None);
        };

        let mut newly_crossed = false;
        if notified_at.is_none() && view_count >= threshold {
            notified_at = Some(
                sqlx::query_scalar::<_, DateTime<Utc>>(
                    "UPDATE articles SET notified_at = NOW() WHERE id = $1 RETURNING notified_at",
                )
                .bind(id)
                .fetch_one(&mut **tx)
                .await?,
            );
            newly_crossed = true;
        }

        Ok(Some(ViewedContent {
            content: ContentRef::Article(id),
            title,
            view_count,
            notified_at,
            newly_crossed,
        }))
    }

    /// Clear the notification marker, re-arming the threshold alert.
    pub async fn reset_notification(id: ArticleId, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query("UPDATE articles SET notified_at = NULL WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
