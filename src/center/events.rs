use log::debug;
use tokio::sync::mpsc::UnboundedSender;

use crate::disposition::{Point, Rect};
use crate::notification::{ClosingReason, Notification, NotificationId};

/// Lifecycle events emitted by the [`NotificationCenter`](super::NotificationCenter).
#[derive(Debug, Clone, PartialEq)]
pub enum NotificationEvent {
    /// A popup should be shown (or re-shown after a replacement) at `rect`.
    PopupCreated {
        id: NotificationId,
        rect: Rect,
        notification: Notification,
    },
    /// A displayed popup moved during reflow.
    PopupMoved { id: NotificationId, position: Point },
    /// A single popup left the screen.
    PopupRemoved { id: NotificationId },
    /// Every popup left the screen at once.
    AllPopupsRemoved,
    /// Reported exactly once per notification.
    NotificationClosed {
        id: NotificationId,
        reason: ClosingReason,
    },
    ActionInvoked {
        id: NotificationId,
        action_key: String,
    },
    /// Size of the overflow queue changed.
    OverflowCountChanged(usize),
}

/// Receiver of [`NotificationEvent`]s.
pub trait EventSink: Send {
    fn emit(&self, event: &NotificationEvent);
}

impl EventSink for UnboundedSender<NotificationEvent> {
    fn emit(&self, event: &NotificationEvent) {
        if self.send(event.clone()).is_err() {
            debug!("Event receiver dropped, discarding {:?}", event);
        }
    }
}
