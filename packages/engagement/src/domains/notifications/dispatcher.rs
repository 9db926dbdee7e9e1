//! Notification delivery with classified failures and an audit trail.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use crate::domains::notifications::event::Notification;
use crate::kernel::traits::{BaseAuditLog, BaseMailer, DispatchAttempt, SendError};

/// Outcome of a dispatch. Deliberately not a `Result`: delivery failures
/// are recorded, classified, and reported here, but they never propagate
/// to whatever triggered the notification.
#[derive(Debug)]
pub struct DispatchResult {
    pub delivered: bool,
    pub attempts: u32,
    pub error: Option<SendError>,
}

pub struct NotificationDispatcher {
    mailer: Arc<dyn BaseMailer>,
    audit: Arc<dyn BaseAuditLog>,
    /// Recipient of threshold alerts; welcome mail goes to the member.
    admin_address: String,
}

impl NotificationDispatcher {
    pub fn new(
        mailer: Arc<dyn BaseMailer>,
        audit: Arc<dyn BaseAuditLog>,
        admin_address: impl Into<String>,
    ) -> Self {
        Self {
            mailer,
            audit,
            admin_address: admin_address.into(),
        }
    }

    /// Deliver a notification, retrying once on a transient failure.
    pub async fn dispatch(&self, notification: &Notification) -> DispatchResult {
        let to = match notification {
            Notification::ViewsThreshold { .. } => self.admin_address.as_str(),
            Notification::Welcome { email, .. } => email.as_str(),
        };
        let subject = notification.subject();
        let body = notification.body();
        let target = notification.describe();

        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.mailer.send_message(to, subject, &body).await {
                Ok(()) => {
                    self.audit.record(DispatchAttempt {
                        at: Utc::now(),
                        target: target.clone(),
                        attempt: attempts,
                        delivered: true,
                        error: None,
                    });
                    debug!(target = %target, attempts, "notification dispatched");
                    return DispatchResult {
                        delivered: true,
                        attempts,
                        error: None,
                    };
                }
                Err(err) => {
                    self.audit.record(DispatchAttempt {
                        at: Utc::now(),
                        target: target.clone(),
                        attempt: attempts,
                        delivered: false,
                        error: Some(err.to_string()),
                    });
                    warn!(
                        target = %target,
                        attempt = attempts,
                        kind = err.kind(),
                        error = %err,
                        "notification delivery attempt failed"
                    );

                    if attempts == 1 && err.is_transient() {
                        continue;
                    }
                    return DispatchResult {
                        delivered: false,
                        attempts,
                        error: Some(err),
                    };
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::common::MemberId;
    use crate::kernel::test_dependencies::{InMemoryAuditLog, MockMailer};

    fn setup(mailer: MockMailer) -> (NotificationDispatcher, Arc<InMemoryAuditLog>) {
        let audit = Arc::new(InMemoryAuditLog::new());
        (
            NotificationDispatcher::new(Arc::new(mailer), audit.clone(), "admin@example.org"),
            audit,
        )
    }

    fn welcome() -> Notification {
        Notification::welcome(MemberId::new(), "member@example.org")
    }

    #[tokio::test]
    async fn clean_delivery_takes_one_attempt() {
        let (dispatcher, audit) = setup(MockMailer::new());

        let result = dispatcher.dispatch(&welcome()).await;
        assert!(result.delivered);
        assert_eq!(result.attempts, 1);
        assert_eq!(audit.entries().len(), 1);
        assert!(audit.entries()[0].delivered);
    }

    #[tokio::test]
    async fn timeout_then_success_retries_and_records_both_attempts() {
        let mailer = MockMailer::new().with_failure(SendError::Timeout(Duration::from_secs(5)));
        let (dispatcher, audit) = setup(mailer);

        let result = dispatcher.dispatch(&welcome()).await;
        assert!(result.delivered);
        assert_eq!(result.attempts, 2);

        let entries = audit.entries();
        assert_eq!(entries.len(), 2);
        assert!(!entries[0].delivered);
        assert!(entries[1].delivered);
    }

    #[tokio::test]
    async fn auth_failures_are_not_retried() {
        let mailer = MockMailer::new().with_failure(SendError::Auth("535 bad credentials".into()));
        let (dispatcher, audit) = setup(mailer);

        let result = dispatcher.dispatch(&welcome()).await;
        assert!(!result.delivered);
        assert_eq!(result.attempts, 1);
        assert_eq!(audit.entries().len(), 1);
        assert!(matches!(result.error, Some(SendError::Auth(_))));
    }

    #[tokio::test]
    async fn transient_failure_is_retried_at_most_once() {
        let mailer = MockMailer::new()
            .with_failure(SendError::Transport {
                detail: "connection reset".into(),
                transient: true,
            })
            .with_failure(SendError::Transport {
                detail: "connection reset".into(),
                transient: true,
            })
            .with_failure(SendError::Transport {
                detail: "connection reset".into(),
                transient: true,
            });
        let (dispatcher, audit) = setup(mailer);

        let result = dispatcher.dispatch(&welcome()).await;
        assert!(!result.delivered);
        assert_eq!(result.attempts, 2);
        assert_eq!(audit.entries().len(), 2);
    }

    #[tokio::test]
    async fn threshold_alerts_go_to_the_admin_address() {
        let mailer = MockMailer::new();
        let (dispatcher, _audit) = setup(mailer.clone());

        let notification = Notification::ViewsThreshold {
            content: crate::domains::content::store::ContentRef::Article(
                crate::common::ArticleId::new(),
            ),
            title: "Colonel".to_string(),
            view_count: 100,
            occurred_at: Utc::now(),
        };
        dispatcher.dispatch(&notification).await;

        let messages = mailer.sent();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].to, "admin@example.org");
        assert_eq!(messages[0].subject, "Nobody writes to the colonel");
    }
}
