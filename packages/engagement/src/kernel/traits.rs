// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic. Domain services
// depend on them so tests can substitute in-memory implementations (see
// kernel/test_dependencies.rs).
//
// Naming convention: Base* for trait names (e.g., BaseMailer, BaseAuditLog)

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{info, warn};

// =============================================================================
// Mailer Trait (Infrastructure - outbound mail)
// =============================================================================

/// Classified delivery failure, independent of the concrete transport.
///
/// Constructed by transport adapters (see `MailerAdapter`) and by test
/// doubles; the dispatcher's retry policy keys off `is_transient`.
#[derive(Debug, Clone, Error)]
pub enum SendError {
    #[error("transport rejected credentials: {0}")]
    Auth(String),
    #[error("transport failure: {detail}")]
    Transport { detail: String, transient: bool },
    #[error("delivery timed out after {0:?}")]
    Timeout(Duration),
}

impl SendError {
    /// Whether one immediate retry is worth attempting.
    pub fn is_transient(&self) -> bool {
        match self {
            SendError::Auth(_) => false,
            SendError::Transport { transient, .. } => *transient,
            SendError::Timeout(_) => true,
        }
    }

    /// Short label for logs and audit records.
    pub fn kind(&self) -> &'static str {
        match self {
            SendError::Auth(_) => "auth",
            SendError::Transport { .. } => "transport",
            SendError::Timeout(_) => "timeout",
        }
    }
}

#[async_trait]
pub trait BaseMailer: Send + Sync {
    /// Deliver a plain-text message to a single recipient.
    async fn send_message(&self, to: &str, subject: &str, body: &str) -> Result<(), SendError>;
}

// =============================================================================
// Audit Log Trait (Infrastructure - dispatch outcome sink)
// =============================================================================

/// One delivery attempt, as recorded in the audit log.
#[derive(Debug, Clone)]
pub struct DispatchAttempt {
    pub at: DateTime<Utc>,
    /// Short description of the notification (entity reference or recipient).
    pub target: String,
    /// 1-based attempt number within a single dispatch.
    pub attempt: u32,
    pub delivered: bool,
    pub error: Option<String>,
}

/// Append-only sink for dispatch attempts.
///
/// Rotation and retention are the sink's concern, not the dispatcher's.
pub trait BaseAuditLog: Send + Sync {
    fn record(&self, attempt: DispatchAttempt);
}

/// Production sink: emits one structured tracing event per attempt, leaving
/// persistence to the installed subscriber.
pub struct TracingAuditLog;

impl BaseAuditLog for TracingAuditLog {
    fn record(&self, attempt: DispatchAttempt) {
        if attempt.delivered {
            info!(
                target = %attempt.target,
                attempt = attempt.attempt,
                at = %attempt.at,
                "notification delivered"
            );
        } else {
            warn!(
                target = %attempt.target,
                attempt = attempt.attempt,
                at = %attempt.at,
                error = attempt.error.as_deref().unwrap_or("unknown"),
                "notification delivery failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(SendError::Timeout(Duration::from_secs(5)).is_transient());
        assert!(SendError::Transport {
            detail: "connection reset".into(),
            transient: true
        }
        .is_transient());
        assert!(!SendError::Transport {
            detail: "550 mailbox unavailable".into(),
            transient: false
        }
        .is_transient());
        assert!(!SendError::Auth("535 bad credentials".into()).is_transient());
    }

    #[test]
    fn kind_labels() {
        assert_eq!(SendError::Auth("x".into()).kind(), "auth");
        assert_eq!(SendError::Timeout(Duration::from_secs(1)).kind(), "timeout");
    }
}
