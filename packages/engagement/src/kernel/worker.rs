//! Dispatch worker for queued notifications.
//!
//! A long-running task that drains the `NotificationQueue` and hands each
//! notification to the `NotificationDispatcher`. Delivery outcomes are the
//! dispatcher's concern (audit log + classified errors); the worker only
//! sequences the work and handles shutdown.

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::domains::notifications::{Notification, NotificationDispatcher};
use crate::kernel::queue::NotificationQueue;

pub struct NotificationWorker {
    rx: UnboundedReceiver<Notification>,
    dispatcher: NotificationDispatcher,
}

/// Handle for stopping a spawned worker.
pub struct WorkerHandle {
    shutdown: CancellationToken,
    handle: JoinHandle<()>,
}

impl WorkerHandle {
    /// Signal shutdown and wait for the worker to drain and exit.
    pub async fn stop(self) {
        self.shutdown.cancel();
        let _ = self.handle.await;
    }
}

impl NotificationWorker {
    pub fn new(rx: UnboundedReceiver<Notification>, dispatcher: NotificationDispatcher) -> Self {
        Self { rx, dispatcher }
    }

    /// Wire a queue to a fresh worker task and start it.
    pub fn spawn(dispatcher: NotificationDispatcher) -> (NotificationQueue, WorkerHandle) {
        let (queue, rx) = NotificationQueue::channel();
        let worker = NotificationWorker::new(rx, dispatcher);
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(worker.run(shutdown.clone()));
        (queue, WorkerHandle { shutdown, handle })
    }

    /// Process notifications until cancelled or all producers are gone.
    /// Anything already queued at shutdown is still dispatched.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!("notification worker starting");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                next = self.rx.recv() => match next {
                    Some(notification) => {
                        let result = self.dispatcher.dispatch(&notification).await;
                        debug!(
                            target = %notification.describe(),
                            delivered = result.delivered,
                            attempts = result.attempts,
                            "notification processed"
                        );
                    }
                    None => break,
                }
            }
        }

        // Drain what was enqueued before the shutdown signal.
        while let Ok(notification) = self.rx.try_recv() {
            self.dispatcher.dispatch(&notification).await;
        }

        info!("notification worker stopped");
    }
}
