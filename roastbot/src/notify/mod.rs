//! Outbound notification seam.
//!
//! Defines the [`Notifier`] trait the reminder scheduler and the overdue
//! sweeper deliver through. The chat transport that actually reaches a user
//! lives outside the engine; [`channel::ChannelNotifier`] hands notifications
//! to whatever task drains its receiver (the console front-end, or a test).

pub mod channel;

use roastbot_proto::task::OwnerId;

pub use channel::{ChannelNotifier, Notification};

/// Errors that can occur while delivering a notification.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// The transport could not deliver the message.
    #[error("delivery to {owner} failed: {reason}")]
    Delivery {
        /// Intended recipient.
        owner: OwnerId,
        /// Transport-specific description.
        reason: String,
    },
}

/// Async capability for sending text to a task owner.
///
/// Callers treat failures as non-fatal: they are logged per notification
/// and never abort a sweep or cancel other timers.
pub trait Notifier: Send + Sync {
    /// Send `text` to `owner`.
    fn send(
        &self,
        owner: &OwnerId,
        text: &str,
    ) -> impl std::future::Future<Output = Result<(), NotifyError>> + Send;
}
