//! End-to-end tests for the engagement notification pipeline: record a
//! view, cross the threshold, and watch the mail leave through the queue,
//! worker, and dispatcher — with in-memory stores and a mock transport.

use std::sync::Arc;

use engagement_core::common::ArticleId;
use engagement_core::config::Config;
use engagement_core::domains::content::{ContentRef, EngagementService, PgContentStore};
use engagement_core::domains::members::{MemberService, NewMember, PgMemberStore};
use engagement_core::domains::notifications::{
    NotificationDispatcher, ThresholdNotifier,
};
use engagement_core::kernel::test_dependencies::{
    InMemoryAuditLog, InMemoryContentStore, InMemoryMemberStore, MockMailer,
};
use engagement_core::kernel::{EngagementDeps, NotificationWorker, SendError};

fn dispatcher(mailer: &MockMailer, audit: &Arc<InMemoryAuditLog>) -> NotificationDispatcher {
    NotificationDispatcher::new(Arc::new(mailer.clone()), audit.clone(), "admin@example.org")
}

#[tokio::test]
async fn threshold_crossing_delivers_exactly_one_admin_mail() {
    let id = ArticleId::new();
    let store = Arc::new(InMemoryContentStore::new().with_article(id, "Colonel", 99));
    let mailer = MockMailer::new();
    let audit = Arc::new(InMemoryAuditLog::new());

    let (queue, handle) = NotificationWorker::spawn(dispatcher(&mailer, &audit));
    let service = EngagementService::new(store.clone(), ThresholdNotifier::new(100), queue);

    // The crossing view, then one more past the threshold.
    service
        .record_access(ContentRef::Article(id))
        .await
        .unwrap();
    service
        .record_access(ContentRef::Article(id))
        .await
        .unwrap();
    handle.stop().await;

    assert_eq!(store.view_count(ContentRef::Article(id)), Some(101));

    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "admin@example.org");
    assert_eq!(sent[0].subject, "Nobody writes to the colonel");
    assert!(sent[0].body.contains("increased to 100"));
    assert!(sent[0].body.contains("Colonel"));

    let entries = audit.entries();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].delivered);
}

#[tokio::test]
async fn failed_delivery_never_disturbs_the_read_path() {
    let id = ArticleId::new();
    let store = Arc::new(InMemoryContentStore::new().with_article(id, "Colonel", 99));
    // Both the attempt and its retry fail.
    let mailer = MockMailer::new()
        .with_failure(SendError::Transport {
            detail: "connection reset".into(),
            transient: true,
        })
        .with_failure(SendError::Transport {
            detail: "connection reset".into(),
            transient: true,
        });
    let audit = Arc::new(InMemoryAuditLog::new());

    let (queue, handle) = NotificationWorker::spawn(dispatcher(&mailer, &audit));
    let service = EngagementService::new(store.clone(), ThresholdNotifier::new(100), queue);

    let viewed = service
        .record_access(ContentRef::Article(id))
        .await
        .unwrap();
    handle.stop().await;

    // The read access completed with a consistent count...
    assert_eq!(viewed.view_count, 100);
    assert_eq!(store.view_count(ContentRef::Article(id)), Some(100));

    // ...while the delivery failed, was retried once, and left a trail.
    assert!(mailer.sent().is_empty());
    let entries = audit.entries();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| !e.delivered));
}

#[tokio::test]
async fn registration_sends_the_welcome_mail_to_the_member() {
    let mailer = MockMailer::new();
    let audit = Arc::new(InMemoryAuditLog::new());

    let (queue, handle) = NotificationWorker::spawn(dispatcher(&mailer, &audit));
    let members = MemberService::new(Arc::new(InMemoryMemberStore::new()), queue);

    members
        .register(NewMember {
            email: "fresh@example.org".to_string(),
            phone_number: None,
            country: None,
        })
        .await
        .unwrap();
    handle.stop().await;

    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "fresh@example.org");
    assert_eq!(sent[0].subject, "Welcome to the site!");
}

#[tokio::test]
async fn production_dependency_graph_wires_from_config() {
    let config = Config {
        database_url: "postgres://localhost/engagement".to_string(),
        smtp_host: "smtp.example.org".to_string(),
        smtp_port: 587,
        smtp_login: "mailer@example.org".to_string(),
        smtp_password: "secret".to_string(),
        mail_sender: "mailer@example.org".to_string(),
        notify_recipient: "admin@example.org".to_string(),
        view_threshold: 100,
        smtp_timeout_secs: 5,
    };

    // Lazy pool: nothing connects until a query runs.
    let pool = sqlx::postgres::PgPoolOptions::new()
        .connect_lazy(&config.database_url)
        .unwrap();

    let deps = EngagementDeps::from_config(&config, pool.clone()).unwrap();
    let _content_store = PgContentStore::new(deps.db_pool.clone());
    let _member_store = PgMemberStore::new(pool);
}
