//! Notification data model.
//!
//! A [`NotificationDraft`] is what callers hand in and what the modifier
//! pipeline edits in place. Once the pipeline has run, the draft is sealed into
//! a [`Notification`], which only exposes read access to its fields.

mod hints;

pub use hints::{Hint, Hints, ImageData};

use std::fmt;
use std::ops::Deref;

/// Handle identifying a live notification. Zero means "not assigned".
pub type NotificationId = u32;

/// Why a live notification left the live set.
///
/// The discriminants match the reason codes of the freedesktop
/// `NotificationClosed` signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ClosingReason {
    Expired = 1,
    Dismissed = 2,
    ClosedByRequest = 3,
    Undefined = 4,
}

impl ClosingReason {
    pub fn code(self) -> u32 {
        self as u32
    }
}

/// Expiration request carried by a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpireTimeout {
    /// Negative on the wire: the daemon picks the timeout.
    #[default]
    ServerDecides,
    /// Zero on the wire: stays until closed.
    Never,
    /// Positive on the wire: milliseconds until expiry.
    Millis(u32),
}

impl From<i32> for ExpireTimeout {
    fn from(value: i32) -> Self {
        match value {
            v if v < 0 => ExpireTimeout::ServerDecides,
            0 => ExpireTimeout::Never,
            v => ExpireTimeout::Millis(v as u32),
        }
    }
}

impl ExpireTimeout {
    /// Wire representation (`-1`, `0` or milliseconds).
    pub fn as_i32(self) -> i32 {
        match self {
            ExpireTimeout::ServerDecides => -1,
            ExpireTimeout::Never => 0,
            ExpireTimeout::Millis(ms) => i32::try_from(ms).unwrap_or(i32::MAX),
        }
    }
}

/// A button offered by a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub key: String,
    pub label: String,
}

impl Action {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
        }
    }

    /// Pairs a flat `[key, label, key, label, ...]` list.
    ///
    /// A trailing key without a label is dropped.
    pub fn pair_flat<I, S>(flat: I) -> Vec<Action>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut actions = Vec::new();
        let mut iter = flat.into_iter();
        while let Some(key) = iter.next() {
            match iter.next() {
                Some(label) => actions.push(Action::new(key, label)),
                None => {
                    let key: String = key.into();
                    log::warn!("Dropping action '{}' without a label", key);
                }
            }
        }
        actions
    }
}

/// Mutable notification as seen by the modifier pipeline.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NotificationDraft {
    pub id: NotificationId,
    pub replaces_id: NotificationId,
    pub application: String,
    pub title: String,
    pub body: String,
    pub icon_url: String,
    pub actions: Vec<Action>,
    pub hints: Hints,
    pub expire_timeout: ExpireTimeout,
}

impl NotificationDraft {
    pub fn new(
        application: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            application: application.into(),
            title: title.into(),
            body: body.into(),
            ..Self::default()
        }
    }

    pub fn with_replaces_id(mut self, replaces_id: NotificationId) -> Self {
        self.replaces_id = replaces_id;
        self
    }

    pub fn with_icon(mut self, icon_url: impl Into<String>) -> Self {
        self.icon_url = icon_url.into();
        self
    }

    pub fn with_timeout(mut self, expire_timeout: impl Into<ExpireTimeout>) -> Self {
        self.expire_timeout = expire_timeout.into();
        self
    }

    pub fn with_action(mut self, key: impl Into<String>, label: impl Into<String>) -> Self {
        self.actions.push(Action::new(key, label));
        self
    }

    pub fn with_hint(mut self, key: impl Into<String>, hint: Hint) -> Self {
        self.hints.insert(key.into(), hint);
        self
    }

    /// Seals the draft. Fields can no longer be changed afterwards.
    pub fn seal(self) -> Notification {
        Notification(self)
    }
}

/// A display-ready notification produced by the modifier pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification(NotificationDraft);

impl Notification {
    /// Returns a copy carrying a different id. Used when the id is resolved
    /// after the pipeline ran (replacement or late assignment).
    pub(crate) fn with_id(mut self, id: NotificationId) -> Self {
        self.0.id = id;
        self
    }

    pub fn into_draft(self) -> NotificationDraft {
        self.0
    }
}

impl Deref for Notification {
    type Target = NotificationDraft;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.id)?;
        if self.replaces_id != 0 {
            write!(f, "->{}", self.replaces_id)?;
        }
        write!(
            f,
            "|{}|{}|{}|{}|t{}",
            self.application,
            self.title,
            self.body,
            self.icon_url,
            self.expire_timeout.as_i32()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expire_timeout_maps_wire_values() {
        assert_eq!(ExpireTimeout::from(-1), ExpireTimeout::ServerDecides);
        assert_eq!(ExpireTimeout::from(-42), ExpireTimeout::ServerDecides);
        assert_eq!(ExpireTimeout::from(0), ExpireTimeout::Never);
        assert_eq!(ExpireTimeout::from(1500), ExpireTimeout::Millis(1500));
        assert_eq!(ExpireTimeout::Millis(1500).as_i32(), 1500);
        assert_eq!(ExpireTimeout::ServerDecides.as_i32(), -1);
    }

    #[test]
    fn pair_flat_keeps_order_and_drops_dangling_key() {
        let actions = Action::pair_flat(["default", "Open", "reply", "Reply", "orphan"]);
        assert_eq!(
            actions,
            vec![Action::new("default", "Open"), Action::new("reply", "Reply")]
        );
    }

    #[test]
    fn closing_reason_codes_follow_the_bus_protocol() {
        assert_eq!(ClosingReason::Expired.code(), 1);
        assert_eq!(ClosingReason::Dismissed.code(), 2);
        assert_eq!(ClosingReason::ClosedByRequest.code(), 3);
        assert_eq!(ClosingReason::Undefined.code(), 4);
    }

    #[test]
    fn display_includes_replacement_target() {
        let notification = NotificationDraft::new("Mail", "Inbox", "3 new")
            .with_replaces_id(7)
            .seal()
            .with_id(7);
        assert_eq!(notification.to_string(), "#7->7|Mail|Inbox|3 new||t-1");
    }
}
