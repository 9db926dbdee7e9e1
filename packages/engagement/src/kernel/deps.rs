//! Dependency container and transport adapters.
//!
//! External services are reached through the `Base*` traits so tests can
//! substitute in-memory implementations; this module wires the production
//! implementations from configuration.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use mailer::{MailError, MailerOptions, MailerService};
use sqlx::PgPool;

use crate::config::Config;
use crate::kernel::traits::{BaseAuditLog, BaseMailer, SendError, TracingAuditLog};

// =============================================================================
// MailerService Adapter (implements BaseMailer trait)
// =============================================================================

/// Wrapper around MailerService that implements the BaseMailer trait,
/// translating transport-specific failures into classified `SendError`s.
pub struct MailerAdapter(pub Arc<MailerService>);

impl MailerAdapter {
    pub fn new(service: Arc<MailerService>) -> Self {
        Self(service)
    }
}

#[async_trait]
impl BaseMailer for MailerAdapter {
    async fn send_message(&self, to: &str, subject: &str, body: &str) -> Result<(), SendError> {
        self.0
            .send_message(to, subject, body)
            .await
            .map_err(|err| match err {
                MailError::Auth(source) => SendError::Auth(source.to_string()),
                MailError::Timeout(limit) => SendError::Timeout(limit),
                other => SendError::Transport {
                    transient: other.is_transient(),
                    detail: other.to_string(),
                },
            })
    }
}

// =============================================================================
// EngagementDeps
// =============================================================================

/// Shared dependencies for the engagement services.
#[derive(Clone)]
pub struct EngagementDeps {
    pub db_pool: PgPool,
    pub mailer: Arc<dyn BaseMailer>,
    pub audit: Arc<dyn BaseAuditLog>,
}

impl EngagementDeps {
    pub fn new(
        db_pool: PgPool,
        mailer: Arc<dyn BaseMailer>,
        audit: Arc<dyn BaseAuditLog>,
    ) -> Self {
        Self {
            db_pool,
            mailer,
            audit,
        }
    }

    /// Build the production dependency graph: SMTP mailer from config,
    /// tracing-backed audit log.
    pub fn from_config(config: &Config, db_pool: PgPool) -> Result<Self> {
        let service = MailerService::new(MailerOptions {
            host: config.smtp_host.clone(),
            port: config.smtp_port,
            login: config.smtp_login.clone(),
            password: config.smtp_password.clone(),
            sender: config.mail_sender.clone(),
            timeout: Duration::from_secs(config.smtp_timeout_secs),
        })?;

        Ok(Self {
            db_pool,
            mailer: Arc::new(MailerAdapter::new(Arc::new(service))),
            audit: Arc::new(TracingAuditLog),
        })
    }
}
