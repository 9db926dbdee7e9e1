use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::MemberId;

/// Registered site member. Credentials and sessions live in the embedding
/// framework's auth layer, not here.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Member {
    pub id: MemberId,
    pub email: String,
    pub phone_number: Option<String>,
    pub country: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMember {
    pub email: String,
    pub phone_number: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateProfile {
    pub phone_number: Option<String>,
    pub country: Option<String>,
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl Member {
    /// Insert a new member. The unique index on `email` is the duplicate
    /// guard; the store layer translates that violation.
    pub async fn insert(member: NewMember, pool: &PgPool) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Member>(
            "INSERT INTO members (id, email, phone_number, country, created_at, updated_at)
             VALUES ($1, $2, $3, $4, NOW(), NOW())
             RETURNING *",
        )
        .bind(MemberId::new())
        .bind(member.email)
        .bind(member.phone_number)
        .bind(member.country)
        .fetch_one(pool)
        .await
    }

    /// Apply a partial profile edit. Returns None for a missing member.
    pub async fn update_profile(
        id: MemberId,
        changes: UpdateProfile,
        pool: &PgPool,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Member>(
            "UPDATE members
             SET phone_number = COALESCE($2, phone_number),
                 country = COALESCE($3, country),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(changes.phone_number)
        .bind(changes.country)
        .fetch_optional(pool)
        .await
    }
}
