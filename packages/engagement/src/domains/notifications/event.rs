//! Outbound notification messages.
//!
//! Notifications are ephemeral: constructed at the trigger site, carried
//! over the queue, rendered and delivered by the dispatcher, then dropped.
//! Nothing here is persisted.

use chrono::{DateTime, Utc};

use crate::common::MemberId;
use crate::domains::content::store::ContentRef;
use crate::domains::members::models::Member;

/// Subject line of the view-threshold alert.
pub const THRESHOLD_SUBJECT: &str = "Nobody writes to the colonel";

/// Subject line of the registration welcome mail.
pub const WELCOME_SUBJECT: &str = "Welcome to the site!";

#[derive(Debug, Clone)]
pub enum Notification {
    /// An entity's view counter reached the configured threshold.
    ViewsThreshold {
        content: ContentRef,
        title: String,
        view_count: i64,
        occurred_at: DateTime<Utc>,
    },
    /// A member completed registration.
    Welcome {
        member_id: MemberId,
        email: String,
        occurred_at: DateTime<Utc>,
    },
}

impl Notification {
    pub fn welcome_for(member: &Member) -> Self {
        Self::welcome(member.id, &member.email)
    }

    pub fn welcome(member_id: MemberId, email: &str) -> Self {
        Notification::Welcome {
            member_id,
            email: email.to_string(),
            occurred_at: Utc::now(),
        }
    }

    pub fn subject(&self) -> &'static str {
        match self {
            Notification::ViewsThreshold { .. } => THRESHOLD_SUBJECT,
            Notification::Welcome { .. } => WELCOME_SUBJECT,
        }
    }

    pub fn body(&self) -> String {
        match self {
            Notification::ViewsThreshold {
                content,
                title,
                view_count,
                ..
            } => format!(
                "The number of views increased to {view_count}.\n\n{content}: \"{title}\""
            ),
            Notification::Welcome { .. } => {
                "Thanks for registering! We are glad to have you with us.".to_string()
            }
        }
    }

    /// Short reference for logs and audit records.
    pub fn describe(&self) -> String {
        match self {
            Notification::ViewsThreshold { content, .. } => format!("views-threshold {content}"),
            Notification::Welcome { member_id, .. } => format!("welcome member {member_id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ArticleId;

    #[test]
    fn threshold_body_carries_count_and_title() {
        let id = ArticleId::new();
        let notification = Notification::ViewsThreshold {
            content: ContentRef::Article(id),
            title: "Colonel".to_string(),
            view_count: 100,
            occurred_at: Utc::now(),
        };

        assert_eq!(notification.subject(), THRESHOLD_SUBJECT);
        let body = notification.body();
        assert!(body.contains("increased to 100"));
        assert!(body.contains("Colonel"));
        assert!(body.contains(&id.to_string()));
    }

    #[test]
    fn welcome_renders_for_a_member() {
        let notification = Notification::welcome(MemberId::new(), "new@example.org");
        assert_eq!(notification.subject(), WELCOME_SUBJECT);
        assert!(notification.describe().starts_with("welcome member"));
    }
}
