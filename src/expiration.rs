//! Per-notification expiration countdown.
//!
//! The controller does not own an OS timer. It records a deadline and the
//! event loop asks it whether the deadline passed, which keeps every timer on
//! the single thread that owns the notification state.

use std::time::{Duration, Instant};

/// Observable state of an [`ExpirationController`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpirationState {
    /// Timeout is zero; nothing will fire.
    Disabled,
    /// A timeout is configured and has not fired yet. It may be paused.
    Armed,
    /// The single-shot timer already fired.
    Fired,
}

/// Single-shot expiration timer for one notification.
#[derive(Debug, Clone)]
pub struct ExpirationController {
    timeout: Duration,
    deadline: Option<Instant>,
    state: ExpirationState,
}

impl Default for ExpirationController {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpirationController {
    pub fn new() -> Self {
        Self {
            timeout: Duration::ZERO,
            deadline: None,
            state: ExpirationState::Disabled,
        }
    }

    /// Sets the timeout in milliseconds.
    ///
    /// A positive value arms a fresh timer starting at `now`, replacing any
    /// previous one. Zero disables the controller and drops the timer.
    pub fn set_timeout(&mut self, timeout_ms: u32, now: Instant) {
        if timeout_ms == 0 {
            self.timeout = Duration::ZERO;
            self.deadline = None;
            self.state = ExpirationState::Disabled;
            return;
        }

        self.timeout = Duration::from_millis(u64::from(timeout_ms));
        self.deadline = Some(now + self.timeout);
        self.state = ExpirationState::Armed;
    }

    /// Configured timeout in milliseconds, zero when disabled.
    pub fn timeout_ms(&self) -> u32 {
        u32::try_from(self.timeout.as_millis()).unwrap_or(u32::MAX)
    }

    /// Pauses (`false`) or restarts (`true`) an armed timer.
    ///
    /// Restarting counts the full timeout again from `now`. Has no effect when
    /// disabled or already fired.
    pub fn set_expiration(&mut self, active: bool, now: Instant) {
        if self.state != ExpirationState::Armed {
            return;
        }
        self.deadline = active.then(|| now + self.timeout);
    }

    /// Whether the timer is currently counting down.
    pub fn expiration(&self) -> bool {
        self.state == ExpirationState::Armed && self.deadline.is_some()
    }

    pub fn state(&self) -> ExpirationState {
        self.state
    }

    /// When the timer will fire, if it is counting down.
    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            ExpirationState::Armed => self.deadline,
            _ => None,
        }
    }

    /// Returns `true` exactly once, when `now` reaches the deadline.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline() {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                self.state = ExpirationState::Fired;
                true
            }
            _ => false,
        }
    }
}

/// Source of the current time for expiration bookkeeping.
pub trait Clock: Send {
    fn now(&self) -> Instant;
}

/// Monotonic system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
