pub mod dispatcher;
pub mod event;
pub mod threshold;

pub use dispatcher::{DispatchResult, NotificationDispatcher};
pub use event::Notification;
pub use threshold::ThresholdNotifier;
