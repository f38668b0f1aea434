//! Session bus adapter.
//!
//! Serves `org.freedesktop.Notifications` for applications and
//! `org.waynoted.Control` for the popup renderer and other front ends. Both
//! objects only translate calls into [`Request`]s for the daemon loop; no
//! notification state lives here.

use std::collections::HashMap;

use log::{debug, warn};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::sync::oneshot;
use zbus::zvariant::{OwnedValue, Structure, Value};
use zbus::{Connection, SignalContext, fdo, interface};

use crate::center::NotificationEvent;
use crate::daemon::{HistoryRow, Request};
use crate::disposition::Rect;
use crate::notification::{Action, Hint, Hints, ImageData, NotificationDraft};

pub const NOTIFICATIONS_NAME: &str = "org.freedesktop.Notifications";
pub const NOTIFICATIONS_PATH: &str = "/org/freedesktop/Notifications";
pub const CONTROL_NAME: &str = "org.waynoted.Control";
pub const CONTROL_PATH: &str = "/org/waynoted/Control";

const SPEC_VERSION: &str = "1.2";
const CAPABILITIES: &[&str] = &[
    "actions",
    "body",
    "body-markup",
    "icon-static",
    "persistence",
];
const IMAGE_HINT_KEYS: &[&str] = &["image-data", "image_data", "icon_data"];

fn send(requests: &UnboundedSender<Request>, request: Request) -> fdo::Result<()> {
    requests
        .send(request)
        .map_err(|_| fdo::Error::Failed("Notification daemon is shutting down".into()))
}

async fn ask<T>(
    requests: &UnboundedSender<Request>,
    build: impl FnOnce(oneshot::Sender<T>) -> Request,
) -> fdo::Result<T> {
    let (reply_tx, reply_rx) = oneshot::channel();
    send(requests, build(reply_tx))?;
    reply_rx
        .await
        .map_err(|_| fdo::Error::Failed("Notification daemon dropped the request".into()))
}

/// `org.freedesktop.Notifications` object.
pub struct NotificationServer {
    requests: UnboundedSender<Request>,
}

impl NotificationServer {
    pub fn new(requests: UnboundedSender<Request>) -> Self {
        Self { requests }
    }
}

#[interface(name = "org.freedesktop.Notifications")]
impl NotificationServer {
    fn get_capabilities(&self) -> Vec<String> {
        CAPABILITIES.iter().map(|cap| cap.to_string()).collect()
    }

    fn get_server_information(&self) -> (String, String, String, String) {
        (
            env!("CARGO_PKG_NAME").to_string(),
            env!("CARGO_PKG_NAME").to_string(),
            env!("CARGO_PKG_VERSION").to_string(),
            SPEC_VERSION.to_string(),
        )
    }

    #[allow(clippy::too_many_arguments)]
    async fn notify(
        &self,
        app_name: String,
        replaces_id: u32,
        app_icon: String,
        summary: String,
        body: String,
        actions: Vec<String>,
        hints: HashMap<String, OwnedValue>,
        expire_timeout: i32,
    ) -> fdo::Result<u32> {
        debug!(
            "Notify from '{}' (replaces {}, timeout {})",
            app_name, replaces_id, expire_timeout
        );
        let draft = draft_from_call(
            app_name,
            replaces_id,
            app_icon,
            summary,
            body,
            actions,
            convert_hints(&hints),
            expire_timeout,
        );
        ask(&self.requests, |reply| Request::Notify { draft, reply }).await
    }

    fn close_notification(&self, id: u32) -> fdo::Result<()> {
        send(&self.requests, Request::Close(id))
    }

    #[zbus(signal)]
    async fn notification_closed(ctx: &SignalContext<'_>, id: u32, reason: u32)
    -> zbus::Result<()>;

    #[zbus(signal)]
    async fn action_invoked(ctx: &SignalContext<'_>, id: u32, action_key: &str)
    -> zbus::Result<()>;
}

/// `org.waynoted.Control` object.
pub struct ControlServer {
    requests: UnboundedSender<Request>,
}

impl ControlServer {
    pub fn new(requests: UnboundedSender<Request>) -> Self {
        Self { requests }
    }
}

#[interface(name = "org.waynoted.Control")]
impl ControlServer {
    fn dismiss(&self, id: u32) -> fdo::Result<()> {
        send(&self.requests, Request::Dismiss(id))
    }

    fn invoke_action(&self, id: u32, action_key: String) -> fdo::Result<()> {
        send(&self.requests, Request::InvokeAction { id, action_key })
    }

    fn set_expiration(&self, id: u32, active: bool) -> fdo::Result<()> {
        send(&self.requests, Request::SetExpiration { id, active })
    }

    fn drop_all(&self) -> fdo::Result<()> {
        send(&self.requests, Request::DropAll)
    }

    fn drop_queued(&self) -> fdo::Result<()> {
        send(&self.requests, Request::DropQueued)
    }

    fn drop_visible(&self) -> fdo::Result<()> {
        send(&self.requests, Request::DropVisible)
    }

    async fn overflow_count(&self) -> fdo::Result<u32> {
        ask(&self.requests, Request::OverflowCount).await
    }

    /// Received notifications, newest first.
    async fn history(&self) -> fdo::Result<Vec<HistoryRow>> {
        ask(&self.requests, Request::History).await
    }

    /// Where the renderer should put the "+N more" indicator.
    async fn extra_window_position(&self) -> fdo::Result<(i32, i32)> {
        ask(&self.requests, Request::ExtraWindowPosition).await
    }

    /// Reports the usable screen area of the output popups go to.
    fn set_screen_geometry(&self, x: i32, y: i32, width: i32, height: i32) -> fdo::Result<()> {
        if width <= 0 || height <= 0 {
            return Err(fdo::Error::InvalidArgs(format!(
                "Screen size must be positive, got {width}x{height}"
            )));
        }
        if x.checked_add(width).is_none() || y.checked_add(height).is_none() {
            return Err(fdo::Error::InvalidArgs(format!(
                "Screen {width}x{height}+{x}+{y} exceeds the coordinate range"
            )));
        }
        send(
            &self.requests,
            Request::SetScreenGeometry(Rect::new(x, y, width, height)),
        )
    }

    /// Holds popups back while a window is fullscreen on the current desktop.
    fn set_fullscreen_suppression(&self, enabled: bool) -> fdo::Result<()> {
        send(&self.requests, Request::SetFullscreenSuppression(enabled))
    }

    /// Shows queued notifications again, e.g. after a fullscreen window closed.
    fn retry_overflow(&self) -> fdo::Result<()> {
        send(&self.requests, Request::RetryOverflow)
    }

    #[zbus(signal)]
    async fn popup_created(
        ctx: &SignalContext<'_>,
        id: u32,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        application: &str,
        title: &str,
        body: &str,
        icon_url: &str,
    ) -> zbus::Result<()>;

    #[zbus(signal)]
    async fn popup_moved(ctx: &SignalContext<'_>, id: u32, x: i32, y: i32) -> zbus::Result<()>;

    #[zbus(signal)]
    async fn popup_removed(ctx: &SignalContext<'_>, id: u32) -> zbus::Result<()>;

    #[zbus(signal)]
    async fn all_popups_removed(ctx: &SignalContext<'_>) -> zbus::Result<()>;

    #[zbus(signal)]
    async fn overflow_count_changed(ctx: &SignalContext<'_>, count: u32) -> zbus::Result<()>;
}

/// Claims both bus names and serves both objects on the session bus.
pub async fn connect(requests: UnboundedSender<Request>) -> zbus::Result<Connection> {
    zbus::connection::Builder::session()?
        .name(NOTIFICATIONS_NAME)?
        .name(CONTROL_NAME)?
        .serve_at(NOTIFICATIONS_PATH, NotificationServer::new(requests.clone()))?
        .serve_at(CONTROL_PATH, ControlServer::new(requests))?
        .build()
        .await
}

/// Re-emits center events as bus signals until the event channel closes.
pub async fn forward_events(
    connection: Connection,
    mut events: UnboundedReceiver<NotificationEvent>,
) -> zbus::Result<()> {
    let notifications = SignalContext::new(&connection, NOTIFICATIONS_PATH)?;
    let control = SignalContext::new(&connection, CONTROL_PATH)?;

    while let Some(event) = events.recv().await {
        if let Err(err) = emit(&notifications, &control, &event).await {
            warn!("Failed to emit {:?}: {}", event, err);
        }
    }
    debug!("Event channel closed, stopping signal forwarder");
    Ok(())
}

async fn emit(
    notifications: &SignalContext<'_>,
    control: &SignalContext<'_>,
    event: &NotificationEvent,
) -> zbus::Result<()> {
    match event {
        NotificationEvent::PopupCreated {
            id,
            rect,
            notification,
        } => {
            debug!("Popup {} at {}", id, rect);
            ControlServer::popup_created(
                control,
                *id,
                rect.x,
                rect.y,
                rect.width,
                rect.height,
                &notification.application,
                &notification.title,
                &notification.body,
                &notification.icon_url,
            )
            .await
        }
        NotificationEvent::PopupMoved { id, position } => {
            debug!("Popup {} moved to {}", id, position);
            ControlServer::popup_moved(control, *id, position.x, position.y).await
        }
        NotificationEvent::PopupRemoved { id } => ControlServer::popup_removed(control, *id).await,
        NotificationEvent::AllPopupsRemoved => ControlServer::all_popups_removed(control).await,
        NotificationEvent::NotificationClosed { id, reason } => {
            NotificationServer::notification_closed(notifications, *id, reason.code()).await
        }
        NotificationEvent::ActionInvoked { id, action_key } => {
            NotificationServer::action_invoked(notifications, *id, action_key).await
        }
        NotificationEvent::OverflowCountChanged(count) => {
            let count = u32::try_from(*count).unwrap_or(u32::MAX);
            ControlServer::overflow_count_changed(control, count).await
        }
    }
}

/// Builds a draft from the arguments of a `Notify` call.
#[allow(clippy::too_many_arguments)]
pub fn draft_from_call(
    app_name: String,
    replaces_id: u32,
    app_icon: String,
    summary: String,
    body: String,
    actions: Vec<String>,
    hints: Hints,
    expire_timeout: i32,
) -> NotificationDraft {
    NotificationDraft {
        replaces_id,
        application: app_name,
        title: summary,
        body,
        icon_url: app_icon,
        actions: Action::pair_flat(actions),
        hints,
        expire_timeout: expire_timeout.into(),
        ..NotificationDraft::default()
    }
}

pub fn convert_hints(hints: &HashMap<String, OwnedValue>) -> Hints {
    hints
        .iter()
        .filter_map(|(key, value)| convert_hint(key, value).map(|hint| (key.clone(), hint)))
        .collect()
}

/// Converts one bus hint. Unsupported value types are skipped.
pub fn convert_hint(key: &str, value: &Value<'_>) -> Option<Hint> {
    let hint = match value {
        Value::Value(inner) => return convert_hint(key, inner),
        Value::Str(text) => Hint::String(text.to_string()),
        Value::Bool(flag) => Hint::Boolean(*flag),
        Value::U8(n) => Hint::Number(i64::from(*n)),
        Value::I16(n) => Hint::Number(i64::from(*n)),
        Value::U16(n) => Hint::Number(i64::from(*n)),
        Value::I32(n) => Hint::Number(i64::from(*n)),
        Value::U32(n) => Hint::Number(i64::from(*n)),
        Value::I64(n) => Hint::Number(*n),
        Value::Structure(structure) if IMAGE_HINT_KEYS.contains(&key) => {
            match parse_image(structure) {
                Some(image) => Hint::Image(image),
                None => {
                    warn!("Ignoring malformed '{}' hint", key);
                    return None;
                }
            }
        }
        other => {
            debug!("Skipping hint '{}' of type {}", key, other.value_signature());
            return None;
        }
    };
    Some(hint)
}

/// Decodes an `(iiibiiay)` image structure.
fn parse_image(structure: &Structure<'_>) -> Option<ImageData> {
    let [width, height, rowstride, has_alpha, bits, channels, data] = structure.fields() else {
        return None;
    };
    let int = |value: &Value<'_>| match value {
        Value::I32(n) => Some(*n),
        _ => None,
    };
    let data = match data {
        Value::Array(array) => array
            .iter()
            .map(|value| match value {
                Value::U8(byte) => Some(*byte),
                _ => None,
            })
            .collect::<Option<Vec<u8>>>()?,
        _ => return None,
    };
    let has_alpha = match has_alpha {
        Value::Bool(flag) => *flag,
        _ => return None,
    };

    Some(ImageData {
        width: int(width)?,
        height: int(height)?,
        rowstride: int(rowstride)?,
        has_alpha,
        bits_per_sample: int(bits)?,
        channels: int(channels)?,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::ExpireTimeout;

    #[test]
    fn scalar_hints_are_converted() {
        assert_eq!(
            convert_hint("category", &Value::from("email")),
            Some(Hint::String("email".into()))
        );
        assert_eq!(convert_hint("urgency", &Value::from(2u8)), Some(Hint::Number(2)));
        assert_eq!(
            convert_hint("transient", &Value::from(true)),
            Some(Hint::Boolean(true))
        );
        assert_eq!(convert_hint("x", &Value::from(1.5f64)), None);
    }

    #[test]
    fn image_structure_becomes_image_hint() {
        let value = Value::from((2i32, 1i32, 8i32, true, 8i32, 4i32, vec![1u8, 2, 3, 4, 5, 6, 7, 8]));
        let hint = convert_hint("image-data", &value).unwrap();
        let image = hint.as_image().unwrap();
        assert_eq!((image.width, image.height, image.rowstride), (2, 1, 8));
        assert!(image.has_alpha);
        assert_eq!(image.data.len(), 8);
    }

    #[test]
    fn structures_under_other_keys_are_skipped() {
        let value = Value::from((1i32, 2i32));
        assert_eq!(convert_hint("custom", &value), None);
        assert_eq!(convert_hint("image-data", &value), None);
    }

    #[test]
    fn notify_arguments_map_onto_draft() {
        let draft = draft_from_call(
            "Mail".into(),
            7,
            "mail-unread".into(),
            "Inbox".into(),
            "3 new".into(),
            vec!["default".into(), "Open".into(), "dangling".into()],
            Hints::new(),
            -1,
        );

        assert_eq!(draft.replaces_id, 7);
        assert_eq!(draft.application, "Mail");
        assert_eq!(draft.title, "Inbox");
        assert_eq!(draft.icon_url, "mail-unread");
        assert_eq!(draft.actions, vec![Action::new("default", "Open")]);
        assert_eq!(draft.expire_timeout, ExpireTimeout::ServerDecides);
        assert_eq!(draft.id, 0);
    }

    #[test]
    fn screen_geometry_must_be_positive() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let control = ControlServer::new(tx);

        assert!(control.set_screen_geometry(0, 0, 0, 1080).is_err());
        assert!(control.set_screen_geometry(i32::MAX - 10, 0, 400, 260).is_err());
        assert!(control.set_screen_geometry(0, i32::MAX, 400, 1).is_err());
        control.set_screen_geometry(0, 0, 1920, 1080).unwrap();

        assert!(matches!(
            rx.try_recv(),
            Ok(Request::SetScreenGeometry(rect)) if rect == Rect::new(0, 0, 1920, 1080)
        ));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn capabilities_advertise_actions() {
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let server = NotificationServer::new(tx);
        assert!(server.get_capabilities().contains(&"actions".to_string()));
        assert_eq!(server.get_server_information().3, "1.2");
    }

    #[tokio::test]
    async fn control_calls_become_requests() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let control = ControlServer::new(tx);

        control.dismiss(4).unwrap();
        control.set_expiration(4, false).unwrap();
        control.drop_queued().unwrap();

        assert!(matches!(rx.recv().await, Some(Request::Dismiss(4))));
        assert!(matches!(
            rx.recv().await,
            Some(Request::SetExpiration { id: 4, active: false })
        ));
        assert!(matches!(rx.recv().await, Some(Request::DropQueued)));
    }

    #[tokio::test]
    async fn overflow_count_waits_for_the_loop() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let control = ControlServer::new(tx);

        let loop_side = tokio::spawn(async move {
            match rx.recv().await {
                Some(Request::OverflowCount(reply)) => reply.send(3).unwrap(),
                _ => panic!("expected an overflow count request"),
            }
        });

        assert_eq!(control.overflow_count().await.unwrap(), 3);
        loop_side.await.unwrap();
    }
}
