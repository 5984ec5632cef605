//! Channel-backed notifier.
//!
//! Uses a bounded [`tokio::sync::mpsc`] channel. Whoever holds the receiver
//! decides how notifications reach the owner.

use roastbot_proto::task::OwnerId;
use tokio::sync::mpsc;

use super::{Notifier, NotifyError};

/// A notification queued for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Recipient.
    pub owner: OwnerId,
    /// Message body.
    pub text: String,
}

/// [`Notifier`] that pushes every notification into an mpsc channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::Sender<Notification>,
}

impl ChannelNotifier {
    /// Create a notifier and the receiver that drains it.
    ///
    /// `buffer` bounds the number of undelivered notifications; senders wait
    /// when it is full.
    #[must_use]
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<Notification>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    async fn send(&self, owner: &OwnerId, text: &str) -> Result<(), NotifyError> {
        self.tx
            .send(Notification {
                owner: owner.clone(),
                text: text.to_string(),
            })
            .await
            .map_err(|_| NotifyError::Delivery {
                owner: owner.clone(),
                reason: "notification channel closed".to_string(),
            })
    }
}
