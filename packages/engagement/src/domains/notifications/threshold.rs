//! Threshold policy for view-count notifications.

use chrono::Utc;

use crate::config::DEFAULT_VIEW_THRESHOLD;
use crate::domains::content::store::ViewedContent;
use crate::domains::notifications::event::Notification;

/// Decides whether a recorded view becomes an admin notification.
///
/// The store claims the crossing atomically with the increment (see
/// `BaseContentStore::record_view`), so this policy only turns a claimed
/// crossing into a message; it never re-fires for an entity that already
/// notified, no matter how many views follow.
#[derive(Debug, Clone)]
pub struct ThresholdNotifier {
    threshold: i64,
}

impl ThresholdNotifier {
    pub fn new(threshold: i64) -> Self {
        Self { threshold }
    }

    /// Views at which the notification fires.
    pub fn threshold(&self) -> i64 {
        self.threshold
    }

    pub fn evaluate(&self, viewed: &ViewedContent) -> Option<Notification> {
        if !viewed.newly_crossed {
            return None;
        }

        Some(Notification::ViewsThreshold {
            content: viewed.content,
            title: viewed.title.clone(),
            view_count: viewed.view_count,
            occurred_at: viewed.notified_at.unwrap_or_else(Utc::now),
        })
    }
}

impl Default for ThresholdNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_VIEW_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ProductId;
    use crate::domains::content::store::ContentRef;

    fn viewed(view_count: i64, newly_crossed: bool) -> ViewedContent {
        ViewedContent {
            content: ContentRef::Product(ProductId::new()),
            title: "Sample".to_string(),
            view_count,
            notified_at: newly_crossed.then(Utc::now),
            newly_crossed,
        }
    }

    #[test]
    fn claimed_crossing_becomes_a_notification() {
        let notifier = ThresholdNotifier::default();
        let notification = notifier.evaluate(&viewed(100, true)).unwrap();
        match notification {
            Notification::ViewsThreshold { view_count, .. } => assert_eq!(view_count, 100),
            other => panic!("unexpected notification: {:?}", other),
        }
    }

    #[test]
    fn unclaimed_views_stay_silent() {
        let notifier = ThresholdNotifier::default();
        // Below the threshold, and far past it on an already-notified row.
        assert!(notifier.evaluate(&viewed(99, false)).is_none());
        assert!(notifier.evaluate(&viewed(151, false)).is_none());
    }

    #[test]
    fn default_threshold_is_one_hundred() {
        assert_eq!(ThresholdNotifier::default().threshold(), 100);
    }
}
