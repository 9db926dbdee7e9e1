//! In-process hand-off queue for outbound notifications.
//!
//! The read-access path enqueues and returns immediately; the dispatch
//! worker (kernel/worker.rs) drains the queue off the request path, so no
//! entity lock or caller ever waits on the mail transport.

use tokio::sync::mpsc;
use tracing::warn;

use crate::domains::notifications::Notification;

/// Cloneable producer handle.
#[derive(Clone)]
pub struct NotificationQueue {
    tx: mpsc::UnboundedSender<Notification>,
}

impl NotificationQueue {
    /// Create a queue and the receiver the worker will drain.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Hand a notification to the dispatch worker. Non-blocking; if the
    /// worker has already stopped the notification is dropped with a
    /// warning rather than failing the caller.
    pub fn enqueue(&self, notification: Notification) {
        if self.tx.send(notification).is_err() {
            warn!("dispatch worker is gone, dropping notification");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::MemberId;

    fn welcome() -> Notification {
        Notification::welcome(MemberId::new(), "member@example.org")
    }

    #[tokio::test]
    async fn enqueue_reaches_receiver() {
        let (queue, mut rx) = NotificationQueue::channel();
        queue.enqueue(welcome());
        assert!(rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn enqueue_after_receiver_dropped_does_not_panic() {
        let (queue, rx) = NotificationQueue::channel();
        drop(rx);
        queue.enqueue(welcome());
    }
}
