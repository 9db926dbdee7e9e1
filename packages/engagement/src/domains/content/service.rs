//! Read-access accounting for viewable content.
//!
//! `record_access` is the entry point the detail-page handlers call: it
//! persists the increment (with bounded retry on write conflicts), and if
//! this view claimed the threshold crossing, hands the notification to the
//! dispatch queue. The caller gets the updated snapshot back immediately;
//! delivery happens on the worker, never on this path.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::domains::content::store::{BaseContentStore, ContentRef, StoreError, ViewedContent};
use crate::domains::notifications::ThresholdNotifier;
use crate::kernel::queue::NotificationQueue;

/// Write conflicts are retried this many times before giving up.
const MAX_CONFLICT_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum EngagementError {
    #[error("content not found: {0}")]
    NotFound(ContentRef),
    #[error("could not persist view count")]
    Persistence(#[source] StoreError),
}

#[derive(Clone)]
pub struct EngagementService {
    store: Arc<dyn BaseContentStore>,
    notifier: ThresholdNotifier,
    queue: NotificationQueue,
}

impl EngagementService {
    pub fn new(
        store: Arc<dyn BaseContentStore>,
        notifier: ThresholdNotifier,
        queue: NotificationQueue,
    ) -> Self {
        Self {
            store,
            notifier,
            queue,
        }
    }

    /// Record one read access: increment the counter, and enqueue the
    /// threshold notification if this view claimed the crossing.
    pub async fn record_access(&self, content: ContentRef) -> Result<ViewedContent, EngagementError> {
        let viewed = self.increment_with_retry(content).await?;

        if let Some(notification) = self.notifier.evaluate(&viewed) {
            self.queue.enqueue(notification);
        }

        Ok(viewed)
    }

    async fn increment_with_retry(
        &self,
        content: ContentRef,
    ) -> Result<ViewedContent, EngagementError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self
                .store
                .record_view(content, self.notifier.threshold())
                .await
            {
                Ok(viewed) => return Ok(viewed),
                Err(StoreError::Conflict(detail)) if attempt < MAX_CONFLICT_RETRIES => {
                    debug!(
                        content = %content,
                        attempt,
                        detail = %detail,
                        "retrying view increment after write conflict"
                    );
                }
                Err(StoreError::NotFound(content)) => {
                    return Err(EngagementError::NotFound(content))
                }
                Err(err) => return Err(EngagementError::Persistence(err)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ArticleId;
    use crate::domains::notifications::Notification;
    use crate::kernel::test_dependencies::InMemoryContentStore;

    fn service(
        store: Arc<InMemoryContentStore>,
        threshold: i64,
    ) -> (
        EngagementService,
        tokio::sync::mpsc::UnboundedReceiver<Notification>,
    ) {
        let (queue, rx) = NotificationQueue::channel();
        (
            EngagementService::new(store, ThresholdNotifier::new(threshold), queue),
            rx,
        )
    }

    fn drain(rx: &mut tokio::sync::mpsc::UnboundedReceiver<Notification>) -> Vec<Notification> {
        let mut out = Vec::new();
        while let Ok(n) = rx.try_recv() {
            out.push(n);
        }
        out
    }

    #[tokio::test]
    async fn crossing_the_threshold_queues_exactly_one_notification() {
        let id = ArticleId::new();
        let store = Arc::new(InMemoryContentStore::new().with_article(id, "Colonel", 99));
        let (service, mut rx) = service(store, 100);

        let viewed = service
            .record_access(ContentRef::Article(id))
            .await
            .unwrap();
        assert_eq!(viewed.view_count, 100);
        assert!(viewed.newly_crossed);

        let queued = drain(&mut rx);
        assert_eq!(queued.len(), 1);
        match &queued[0] {
            Notification::ViewsThreshold {
                title, view_count, ..
            } => {
                assert_eq!(title, "Colonel");
                assert_eq!(*view_count, 100);
            }
            other => panic!("unexpected notification: {:?}", other),
        }
    }

    #[tokio::test]
    async fn accesses_past_an_already_notified_entity_stay_silent() {
        let id = ArticleId::new();
        let store = Arc::new(
            InMemoryContentStore::new()
                .with_article(id, "Colonel", 150)
                .with_notified(ContentRef::Article(id)),
        );
        let (service, mut rx) = service(store, 100);

        let viewed = service
            .record_access(ContentRef::Article(id))
            .await
            .unwrap();
        assert_eq!(viewed.view_count, 151);
        assert!(!viewed.newly_crossed);
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn unknown_content_is_a_not_found_error() {
        let store = Arc::new(InMemoryContentStore::new());
        let (service, mut rx) = service(store, 100);

        let err = service
            .record_access(ContentRef::Article(ArticleId::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, EngagementError::NotFound(_)));
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn concurrent_accesses_do_not_lose_updates_and_notify_once() {
        let id = ArticleId::new();
        let store = Arc::new(InMemoryContentStore::new().with_article(id, "Colonel", 90));
        let (service, mut rx) = service(store.clone(), 100);

        let mut handles = Vec::new();
        for _ in 0..25 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                service.record_access(ContentRef::Article(id)).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.view_count(ContentRef::Article(id)), Some(115));
        assert_eq!(drain(&mut rx).len(), 1);
    }

    #[tokio::test]
    async fn transient_conflicts_are_retried() {
        let id = ArticleId::new();
        let store = Arc::new(
            InMemoryContentStore::new()
                .with_article(id, "Colonel", 5)
                .with_failure(StoreError::Conflict("serialization failure".into()))
                .with_failure(StoreError::Conflict("serialization failure".into())),
        );
        let (service, _rx) = service(store, 100);

        let viewed = service
            .record_access(ContentRef::Article(id))
            .await
            .unwrap();
        assert_eq!(viewed.view_count, 6);
    }

    #[tokio::test]
    async fn exhausted_conflict_retries_surface_a_persistence_error() {
        let id = ArticleId::new();
        let store = Arc::new(
            InMemoryContentStore::new()
                .with_article(id, "Colonel", 5)
                .with_failure(StoreError::Conflict("serialization failure".into()))
                .with_failure(StoreError::Conflict("serialization failure".into()))
                .with_failure(StoreError::Conflict("serialization failure".into())),
        );
        let (service, _rx) = service(store.clone(), 100);

        let err = service
            .record_access(ContentRef::Article(id))
            .await
            .unwrap_err();
        assert!(matches!(err, EngagementError::Persistence(_)));
        // The increment never landed.
        assert_eq!(store.view_count(ContentRef::Article(id)), Some(5));
    }
}
