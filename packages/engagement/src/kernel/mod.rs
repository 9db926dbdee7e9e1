//! Kernel module - infrastructure traits, dependencies, and the dispatch worker.

pub mod deps;
pub mod queue;
pub mod test_dependencies;
pub mod traits;
pub mod worker;

pub use deps::{EngagementDeps, MailerAdapter};
pub use queue::NotificationQueue;
pub use traits::{BaseAuditLog, BaseMailer, DispatchAttempt, SendError, TracingAuditLog};
pub use worker::{NotificationWorker, WorkerHandle};
