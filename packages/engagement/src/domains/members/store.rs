//! Member persistence port.

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;

use crate::common::MemberId;
use crate::domains::members::models::{Member, NewMember, UpdateProfile};

#[derive(Debug, Error)]
pub enum MemberStoreError {
    #[error("email already registered: {0}")]
    EmailTaken(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait BaseMemberStore: Send + Sync {
    async fn insert(&self, member: NewMember) -> Result<Member, MemberStoreError>;

    async fn update_profile(
        &self,
        id: MemberId,
        changes: UpdateProfile,
    ) -> Result<Option<Member>, MemberStoreError>;
}

pub struct PgMemberStore {
    pool: PgPool,
}

impl PgMemberStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BaseMemberStore for PgMemberStore {
    async fn insert(&self, member: NewMember) -> Result<Member, MemberStoreError> {
        let email = member.email.clone();
        Member::insert(member, &self.pool).await.map_err(|err| {
            if let sqlx::Error::Database(db) = &err {
                if db.code().as_deref() == Some("23505") {
                    return MemberStoreError::EmailTaken(email);
                }
            }
            MemberStoreError::Database(err)
        })
    }

    async fn update_profile(
        &self,
        id: MemberId,
        changes: UpdateProfile,
    ) -> Result<Option<Member>, MemberStoreError> {
        Ok(Member::update_profile(id, changes, &self.pool).await?)
    }
}
