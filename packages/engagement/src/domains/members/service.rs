//! Member registration and profile updates.
//!
//! Registration enqueues the welcome mail through the same dispatch queue
//! the view-threshold alert uses; a failed delivery never fails the
//! registration itself.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::common::MemberId;
use crate::domains::members::models::{Member, NewMember, UpdateProfile};
use crate::domains::members::store::{BaseMemberStore, MemberStoreError};
use crate::domains::notifications::Notification;
use crate::kernel::queue::NotificationQueue;

#[derive(Debug, Error)]
pub enum MemberError {
    #[error("invalid email address: {0}")]
    InvalidEmail(String),
    #[error("email already registered: {0}")]
    EmailTaken(String),
    #[error("member not found: {0}")]
    NotFound(MemberId),
    #[error("could not persist member")]
    Persistence(#[source] MemberStoreError),
}

#[derive(Clone)]
pub struct MemberService {
    store: Arc<dyn BaseMemberStore>,
    queue: NotificationQueue,
}

impl MemberService {
    pub fn new(store: Arc<dyn BaseMemberStore>, queue: NotificationQueue) -> Self {
        Self { store, queue }
    }

    /// Register a member and enqueue the welcome mail.
    pub async fn register(&self, member: NewMember) -> Result<Member, MemberError> {
        if !is_plausible_email(&member.email) {
            return Err(MemberError::InvalidEmail(member.email));
        }

        let member = self.store.insert(member).await.map_err(|err| match err {
            MemberStoreError::EmailTaken(email) => MemberError::EmailTaken(email),
            other => MemberError::Persistence(other),
        })?;

        info!(member_id = %member.id, "member registered");
        self.queue.enqueue(Notification::welcome_for(&member));
        Ok(member)
    }

    pub async fn update_profile(
        &self,
        id: MemberId,
        changes: UpdateProfile,
    ) -> Result<Member, MemberError> {
        match self
            .store
            .update_profile(id, changes)
            .await
            .map_err(MemberError::Persistence)?
        {
            Some(member) => {
                info!(member_id = %member.id, "member profile updated");
                Ok(member)
            }
            None => Err(MemberError::NotFound(id)),
        }
    }
}

/// Enough of a check to catch obvious typos; real validation happened in
/// the submitting form.
fn is_plausible_email(email: &str) -> bool {
    email
        .split_once('@')
        .map(|(local, domain)| !local.is_empty() && domain.contains('.'))
        .unwrap_or(false)
}
