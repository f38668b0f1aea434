//! The notification center: owns every live notification.
//!
//! Inbound requests run through the modifier pipeline, then either get a
//! popup slot from the disposition or wait in the overflow queue. Closing a
//! popup reflows the others and drains the queue in arrival order. All state
//! lives here and is driven from a single event loop.

mod events;
mod fullscreen;
mod history;


pub use events::{EventSink, NotificationEvent};
pub use fullscreen::{FullscreenDetector, FullscreenPolicy, NoFullscreen};
pub use history::{History, HistoryEntry};

use std::collections::{HashMap, VecDeque};
use std::time::Instant;

use chrono::Local;
use log::{debug, info, warn};

use crate::config::{Config, FALLBACK_TIMEOUT_MS, PopupConfig};
use crate::disposition::{self, Disposition, Point, Rect, Size};
use crate::expiration::{Clock, ExpirationController, SystemClock};
use crate::modifiers::{IdSequence, Pipeline};
use crate::notification::{
    ClosingReason, ExpireTimeout, Notification, NotificationDraft, NotificationId,
};

struct Popup {
    notification: Notification,
    expiration: ExpirationController,
}

pub struct NotificationCenter {
    pipeline: Pipeline,
    ids: IdSequence,
    popup_config: PopupConfig,
    screen: Rect,
    popup_size: Size,
    disposition: Box<dyn Disposition>,
    popups: HashMap<NotificationId, Popup>,
    queue: VecDeque<Notification>,
    fullscreen: FullscreenPolicy,
    history: History,
    clock: Box<dyn Clock>,
    sinks: Vec<Box<dyn EventSink>>,
}

impl NotificationCenter {
    /// Builds a center with the configured pipeline and a fresh id sequence.
    pub fn from_config(config: &Config) -> Self {
        let ids = IdSequence::new();
        let pipeline = Pipeline::from_config(config, ids.clone());
        Self::new(config, pipeline, ids)
    }

    /// `ids` must be the sequence the pipeline's id assigner draws from.
    pub fn new(config: &Config, pipeline: Pipeline, ids: IdSequence) -> Self {
        let screen = config.screen_geometry();
        let popup_config = config.popups.clone();
        Self {
            pipeline,
            ids,
            popup_size: popup_config.popup_size(screen),
            disposition: disposition::for_anchor(
                popup_config.anchor,
                popup_config.layout_params(screen),
            ),
            fullscreen: FullscreenPolicy::new(Box::new(NoFullscreen), &popup_config),
            popup_config,
            screen,
            popups: HashMap::new(),
            queue: VecDeque::new(),
            history: History::new(&config.history),
            clock: Box::new(SystemClock),
            sinks: Vec::new(),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn set_fullscreen_detector(&mut self, detector: impl FullscreenDetector + 'static) {
        self.fullscreen.set_detector(Box::new(detector));
    }

    /// Registers an observer for lifecycle events.
    pub fn subscribe(&mut self, sink: impl EventSink + 'static) {
        self.sinks.push(Box::new(sink));
    }

    fn emit(&self, event: NotificationEvent) {
        for sink in &self.sinks {
            sink.emit(&event);
        }
    }

    /// Accepts a notification and returns its id.
    ///
    /// A request replacing a live notification keeps that id: a displayed one
    /// is re-issued at its current position, a queued one is updated in place.
    /// Anything else gets shown if there is room, or queued behind earlier
    /// arrivals.
    pub fn submit(&mut self, draft: NotificationDraft) -> NotificationId {
        let notification = self.pipeline.run(draft);
        let replacing =
            notification.replaces_id != 0 && self.is_live(notification.replaces_id);
        let id = self.resolve_id(&notification, replacing);
        let notification = notification.with_id(id);
        debug!("Incoming notification {}", notification);

        self.history.record(notification.clone(), Local::now());

        if replacing {
            if self.popups.contains_key(&id) {
                self.replace_displayed(notification);
                return id;
            }
            if let Some(entry) = self.queue.iter_mut().find(|queued| queued.id == id) {
                *entry = notification;
                return id;
            }
        }

        self.drain_queue();
        if !self.queue.is_empty() || self.fullscreen.should_suppress_popup() {
            self.enqueue(notification);
        } else if let Err(notification) = self.try_display(notification) {
            self.enqueue(notification);
        }
        id
    }

    fn resolve_id(&self, notification: &Notification, replacing: bool) -> NotificationId {
        if replacing {
            return notification.replaces_id;
        }
        if notification.replaces_id != 0 {
            debug!(
                "Replace target {} is not live, assigning a fresh id",
                notification.replaces_id
            );
            return self.ids.next_id();
        }
        match notification.id {
            0 => self.ids.next_id(),
            id => id,
        }
    }

    fn replace_displayed(&mut self, notification: Notification) {
        let id = notification.id;
        let Some(rect) = self.disposition.placement(id) else {
            warn!("Displayed notification {} has no placement", id);
            return;
        };
        let now = self.clock.now();
        if let Some(popup) = self.popups.get_mut(&id) {
            popup
                .expiration
                .set_timeout(effective_timeout_ms(&notification), now);
            popup.notification = notification.clone();
        }
        self.emit(NotificationEvent::PopupCreated {
            id,
            rect,
            notification,
        });
    }

    /// Shows `notification` if the disposition has a slot, hands it back otherwise.
    fn try_display(&mut self, notification: Notification) -> Result<(), Notification> {
        let id = notification.id;
        let position = match self.disposition.place(id, self.popup_size) {
            Ok(Some(position)) => position,
            Ok(None) => return Err(notification),
            Err(err) => {
                warn!("Cannot place notification {}: {}", id, err);
                return Err(notification);
            }
        };

        let rect = Rect::from_parts(position, self.popup_size);
        let mut expiration = ExpirationController::new();
        expiration.set_timeout(effective_timeout_ms(&notification), self.clock.now());
        self.popups.insert(
            id,
            Popup {
                notification: notification.clone(),
                expiration,
            },
        );
        self.emit(NotificationEvent::PopupCreated {
            id,
            rect,
            notification,
        });
        Ok(())
    }

    fn enqueue(&mut self, notification: Notification) {
        debug!("Queueing notification {}", notification.id);
        self.queue.push_back(notification);
        self.emit(NotificationEvent::OverflowCountChanged(self.queue.len()));
    }

    /// Shows queued notifications, oldest first, until one does not fit.
    fn drain_queue(&mut self) {
        if self.queue.is_empty() || self.fullscreen.should_suppress_popup() {
            return;
        }

        let before = self.queue.len();
        while let Some(next) = self.queue.pop_front() {
            if let Err(next) = self.try_display(next) {
                self.queue.push_front(next);
                break;
            }
        }

        if self.queue.len() != before {
            self.emit(NotificationEvent::OverflowCountChanged(self.queue.len()));
        }
    }

    /// Explicit close request from the notifying application.
    pub fn close(&mut self, id: NotificationId) -> bool {
        self.close_with_reason(id, ClosingReason::ClosedByRequest)
    }

    /// Closing a displayed popup reflows the others and drains the queue.
    /// Closing a queued notification just removes it. Unknown ids are ignored.
    pub fn close_with_reason(&mut self, id: NotificationId, reason: ClosingReason) -> bool {
        if self.popups.remove(&id).is_some() {
            for moved in self.disposition.remove(id) {
                self.emit(NotificationEvent::PopupMoved {
                    id: moved.id,
                    position: moved.position,
                });
            }
            self.emit(NotificationEvent::PopupRemoved { id });
            self.emit(NotificationEvent::NotificationClosed { id, reason });
            self.drain_queue();
            return true;
        }

        if let Some(index) = self.queue.iter().position(|queued| queued.id == id) {
            self.queue.remove(index);
            self.emit(NotificationEvent::NotificationClosed { id, reason });
            self.emit(NotificationEvent::OverflowCountChanged(self.queue.len()));
            return true;
        }

        debug!("Ignoring close of unknown notification {}", id);
        false
    }

    pub fn dismiss(&mut self, id: NotificationId) -> bool {
        self.close_with_reason(id, ClosingReason::Dismissed)
    }

    /// Expires a displayed popup. Ids that are no longer displayed are ignored.
    pub fn expire(&mut self, id: NotificationId) -> bool {
        if !self.popups.contains_key(&id) {
            debug!("Ignoring expiry of notification {} that is not displayed", id);
            return false;
        }
        self.close_with_reason(id, ClosingReason::Expired)
    }

    /// Reports `action_key` and dismisses the popup.
    pub fn invoke_action(&mut self, id: NotificationId, action_key: &str) -> bool {
        let Some(popup) = self.popups.get(&id) else {
            debug!("Ignoring action on notification {} that is not displayed", id);
            return false;
        };
        if !popup
            .notification
            .actions
            .iter()
            .any(|action| action.key == action_key)
        {
            debug!("Notification {} has no action '{}'", id, action_key);
        }

        self.emit(NotificationEvent::ActionInvoked {
            id,
            action_key: action_key.to_string(),
        });
        self.close_with_reason(id, ClosingReason::Dismissed)
    }

    /// Drops the queue without reporting anything for it, then dismisses
    /// every displayed popup at once.
    pub fn drop_all(&mut self) {
        self.queue.clear();
        let closed = self.clear_displayed();
        info!("Dropped all notifications ({} displayed)", closed.len());
        self.emit(NotificationEvent::OverflowCountChanged(0));
    }

    /// Drops queued notifications only.
    pub fn drop_queued(&mut self) {
        if self.queue.is_empty() {
            return;
        }
        self.queue.clear();
        self.emit(NotificationEvent::OverflowCountChanged(0));
    }

    /// Dismisses every displayed popup, then shows what was queued.
    pub fn drop_visible(&mut self) {
        self.clear_displayed();
        self.drain_queue();
    }

    fn clear_displayed(&mut self) -> Vec<NotificationId> {
        let ids: Vec<NotificationId> = self
            .disposition
            .placements()
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        self.disposition.remove_all();
        self.popups.clear();

        for id in &ids {
            self.emit(NotificationEvent::NotificationClosed {
                id: *id,
                reason: ClosingReason::Dismissed,
            });
        }
        self.emit(NotificationEvent::AllPopupsRemoved);
        ids
    }

    /// Pauses or restarts the timer of a displayed popup.
    pub fn set_expiration(&mut self, id: NotificationId, active: bool) -> bool {
        let now = self.clock.now();
        match self.popups.get_mut(&id) {
            Some(popup) => {
                popup.expiration.set_expiration(active, now);
                true
            }
            None => false,
        }
    }

    /// Earliest pending expiration among displayed popups.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.popups
            .values()
            .filter_map(|popup| popup.expiration.deadline())
            .min()
    }

    /// Expires every displayed popup whose deadline passed, in stacking order.
    pub fn poll_expired(&mut self) -> Vec<NotificationId> {
        let now = self.clock.now();
        let mut fired: Vec<NotificationId> = Vec::new();
        for (id, _) in self.disposition.placements() {
            let expired = self
                .popups
                .get_mut(&id)
                .is_some_and(|popup| popup.expiration.poll(now));
            if expired {
                fired.push(id);
            }
        }

        for id in &fired {
            self.expire(*id);
        }
        fired
    }

    /// Shows queued notifications if space or suppression changed.
    pub fn retry_overflow(&mut self) {
        self.drain_queue();
    }

    /// Toggles suppression while something is fullscreen on the current
    /// desktop. Returns whether the setting changed.
    pub fn set_suppress_on_current_desktop(&mut self, enabled: bool) -> bool {
        let changed = self.fullscreen.current_desktop() != enabled;
        self.fullscreen.set_current_desktop(enabled);
        self.drain_queue();
        changed
    }

    pub fn should_suppress_popup(&self) -> bool {
        self.fullscreen.should_suppress_popup()
    }

    /// Applies the screen geometry reported by the renderer.
    pub fn set_screen_geometry(&mut self, screen: Rect) {
        if screen == self.screen {
            return;
        }
        info!("Screen geometry changed to {}", screen);
        self.screen = screen;
        self.apply_layout(false);
    }

    /// Applies a reloaded configuration. The id sequence is kept.
    pub fn reconfigure(&mut self, config: &Config) {
        let anchor_changed = config.popups.anchor != self.popup_config.anchor;
        self.popup_config = config.popups.clone();
        self.screen = config.screen_geometry();
        self.fullscreen.apply_config(&self.popup_config);
        self.history.apply_config(&config.history);
        self.pipeline = Pipeline::from_config(config, self.ids.clone());
        self.apply_layout(anchor_changed);
    }

    /// Re-derives layout inputs and lays displayed popups out again whenever
    /// they changed. Popups that shifted are reported as moves, or as new
    /// popups when the strategy or popup size changed; the ones that no
    /// longer fit go back to the front of the queue.
    fn apply_layout(&mut self, new_strategy: bool) {
        let params = self.popup_config.layout_params(self.screen);
        let popup_size = self.popup_config.popup_size(self.screen);
        let resized = popup_size != self.popup_size;

        if !new_strategy && !resized && params == self.disposition.params() {
            self.drain_queue();
            return;
        }

        let previous = self.disposition.placements();
        self.popup_size = popup_size;
        self.disposition = disposition::for_anchor(self.popup_config.anchor, params);

        let mut bumped = Vec::new();
        for (id, old_rect) in previous {
            let Some(notification) = self.popups.get(&id).map(|p| p.notification.clone()) else {
                continue;
            };
            match self.disposition.place(id, popup_size) {
                Ok(Some(position)) if new_strategy || resized => {
                    self.emit(NotificationEvent::PopupCreated {
                        id,
                        rect: Rect::from_parts(position, popup_size),
                        notification,
                    })
                }
                Ok(Some(position)) => {
                    if position != old_rect.top_left() {
                        self.emit(NotificationEvent::PopupMoved { id, position });
                    }
                }
                _ => bumped.push(id),
            }
        }

        for id in bumped.iter().rev() {
            if let Some(popup) = self.popups.remove(id) {
                self.emit(NotificationEvent::PopupRemoved { id: *id });
                self.queue.push_front(popup.notification);
            }
        }
        if !bumped.is_empty() {
            self.emit(NotificationEvent::OverflowCountChanged(self.queue.len()));
        }
        self.drain_queue();
    }

    /// Where the overflow indicator goes.
    pub fn extra_window_position(&self) -> Point {
        self.disposition.extra_window_position()
    }

    pub fn overflow_count(&self) -> usize {
        self.queue.len()
    }

    pub fn is_displayed(&self, id: NotificationId) -> bool {
        self.popups.contains_key(&id)
    }

    pub fn is_queued(&self, id: NotificationId) -> bool {
        self.queue.iter().any(|queued| queued.id == id)
    }

    pub fn is_live(&self, id: NotificationId) -> bool {
        self.is_displayed(id) || self.is_queued(id)
    }

    /// Displayed popups in stacking order.
    pub fn displayed(&self) -> Vec<(NotificationId, Rect)> {
        self.disposition.placements()
    }

    pub fn queued_ids(&self) -> Vec<NotificationId> {
        self.queue.iter().map(|queued| queued.id).collect()
    }

    pub fn notification(&self, id: NotificationId) -> Option<&Notification> {
        self.popups
            .get(&id)
            .map(|popup| &popup.notification)
            .or_else(|| self.queue.iter().find(|queued| queued.id == id))
    }

    pub fn popup_size(&self) -> Size {
        self.popup_size
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut History {
        &mut self.history
    }
}

/// Timeout the expiration controller is armed with.
fn effective_timeout_ms(notification: &Notification) -> u32 {
    match notification.expire_timeout {
        ExpireTimeout::Millis(ms) => ms,
        ExpireTimeout::Never => 0,
        ExpireTimeout::ServerDecides => FALLBACK_TIMEOUT_MS,
    }
}
