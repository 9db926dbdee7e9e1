// TestDependencies - in-memory implementations for testing
//
// Provides in-memory services that can be injected in place of the
// Postgres stores and the SMTP mailer. Mocks record their calls and can be
// seeded builder-style; scripted failures are consumed in FIFO order.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::common::{ArticleId, MemberId, ProductId};
use crate::domains::content::store::{BaseContentStore, ContentRef, StoreError, ViewedContent};
use crate::domains::members::models::{Member, NewMember, UpdateProfile};
use crate::domains::members::store::{BaseMemberStore, MemberStoreError};
use crate::kernel::traits::{BaseAuditLog, BaseMailer, DispatchAttempt, SendError};

// =============================================================================
// Mock Mailer
// =============================================================================

#[derive(Debug, Clone)]
pub struct SentMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Records outbound messages; scripted failures are returned first.
/// Clones share state, so a test can keep a handle after moving the mock
/// into the dispatcher.
#[derive(Clone)]
pub struct MockMailer {
    sent: Arc<Mutex<Vec<SentMessage>>>,
    failures: Arc<Mutex<VecDeque<SendError>>>,
}

impl MockMailer {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            failures: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    /// Queue a failure for the next send attempt.
    pub fn with_failure(self, err: SendError) -> Self {
        self.failures.lock().unwrap().push_back(err);
        self
    }

    /// All successfully "delivered" messages.
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn was_sent_to(&self, to: &str) -> bool {
        self.sent.lock().unwrap().iter().any(|m| m.to == to)
    }
}

impl Default for MockMailer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseMailer for MockMailer {
    async fn send_message(&self, to: &str, subject: &str, body: &str) -> Result<(), SendError> {
        if let Some(err) = self.failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        self.sent.lock().unwrap().push(SentMessage {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

// =============================================================================
// In-memory Audit Log
// =============================================================================

pub struct InMemoryAuditLog {
    entries: Mutex<Vec<DispatchAttempt>>,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn entries(&self) -> Vec<DispatchAttempt> {
        self.entries.lock().unwrap().clone()
    }
}

impl Default for InMemoryAuditLog {
    fn default() -> Self {
        Self::new()
    }
}

impl BaseAuditLog for InMemoryAuditLog {
    fn record(&self, attempt: DispatchAttempt) {
        self.entries.lock().unwrap().push(attempt);
    }
}

// =============================================================================
// In-memory Content Store
// =============================================================================

struct ContentRow {
    title: String,
    view_count: i64,
    notified_at: Option<DateTime<Utc>>,
}

/// In-memory `BaseContentStore` with the same atomicity contract as the
/// Postgres store: one lock per entity, increment and crossing claim under
/// that lock, no lock shared across entities.
pub struct InMemoryContentStore {
    rows: Mutex<HashMap<ContentRef, Arc<Mutex<ContentRow>>>>,
    failures: Mutex<VecDeque<StoreError>>,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(HashMap::new()),
            failures: Mutex::new(VecDeque::new()),
        }
    }

    pub fn with_article(self, id: ArticleId, title: &str, view_count: i64) -> Self {
        self.seed(ContentRef::Article(id), title, view_count);
        self
    }

    pub fn with_product(self, id: ProductId, name: &str, view_count: i64) -> Self {
        self.seed(ContentRef::Product(id), name, view_count);
        self
    }

    /// Mark an entity as having already fired its notification.
    pub fn with_notified(self, content: ContentRef) -> Self {
        if let Some(row) = self.rows.lock().unwrap().get(&content) {
            row.lock().unwrap().notified_at = Some(Utc::now());
        }
        self
    }

    /// Queue an error for the next `record_view` call.
    pub fn with_failure(self, err: StoreError) -> Self {
        self.failures.lock().unwrap().push_back(err);
        self
    }

    pub fn view_count(&self, content: ContentRef) -> Option<i64> {
        let row = self.rows.lock().unwrap().get(&content).cloned()?;
        let count = row.lock().unwrap().view_count;
        Some(count)
    }

    fn seed(&self, content: ContentRef, title: &str, view_count: i64) {
        self.rows.lock().unwrap().insert(
            content,
            Arc::new(Mutex::new(ContentRow {
                title: title.to_string(),
                view_count,
                notified_at: None,
            })),
        );
    }
}

impl Default for InMemoryContentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseContentStore for InMemoryContentStore {
    async fn record_view(
        &self,
        content: ContentRef,
        threshold: i64,
    ) -> Result<ViewedContent, StoreError> {
        if let Some(err) = self.failures.lock().unwrap().pop_front() {
            return Err(err);
        }

        let row = self
            .rows
            .lock()
            .unwrap()
            .get(&content)
            .cloned()
            .ok_or(StoreError::NotFound(content))?;

        let mut row = row.lock().unwrap();
        row.view_count += 1;

        let mut newly_crossed = false;
        if row.notified_at.is_none() && row.view_count >= threshold {
            row.notified_at = Some(Utc::now());
            newly_crossed = true;
        }

        Ok(ViewedContent {
            content,
            title: row.title.clone(),
            view_count: row.view_count,
            notified_at: row.notified_at,
            newly_crossed,
        })
    }
}

// =============================================================================
// In-memory Member Store
// =============================================================================

pub struct InMemoryMemberStore {
    members: Mutex<Vec<Member>>,
}

impl InMemoryMemberStore {
    pub fn new() -> Self {
        Self {
            members: Mutex::new(Vec::new()),
        }
    }

    pub fn members(&self) -> Vec<Member> {
        self.members.lock().unwrap().clone()
    }
}

impl Default for InMemoryMemberStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseMemberStore for InMemoryMemberStore {
    async fn insert(&self, member: NewMember) -> Result<Member, MemberStoreError> {
        let mut members = self.members.lock().unwrap();
        if members.iter().any(|m| m.email == member.email) {
            return Err(MemberStoreError::EmailTaken(member.email));
        }

        let now = Utc::now();
        let created = Member {
            id: MemberId::new(),
            email: member.email,
            phone_number: member.phone_number,
            country: member.country,
            created_at: now,
            updated_at: now,
        };
        members.push(created.clone());
        Ok(created)
    }

    async fn update_profile(
        &self,
        id: MemberId,
        changes: UpdateProfile,
    ) -> Result<Option<Member>, MemberStoreError> {
        let mut members = self.members.lock().unwrap();
        let Some(member) = members.iter_mut().find(|m| m.id == id) else {
            return Ok(None);
        };

        if let Some(phone_number) = changes.phone_number {
            member.phone_number = Some(phone_number);
        }
        if let Some(country) = changes.country {
            member.country = Some(country);
        }
        member.updated_at = Utc::now();
        Ok(Some(member.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn crossing_is_claimed_exactly_once() {
        let id = ArticleId::new();
        let store = InMemoryContentStore::new().with_article(id, "Colonel", 99);

        let first = store
            .record_view(ContentRef::Article(id), 100)
            .await
            .unwrap();
        assert!(first.newly_crossed);

        let second = store
            .record_view(ContentRef::Article(id), 100)
            .await
            .unwrap();
        assert_eq!(second.view_count, 101);
        assert!(!second.newly_crossed);
    }
}
