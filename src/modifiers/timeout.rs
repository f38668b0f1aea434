use super::Modifier;
use crate::config::FALLBACK_TIMEOUT_MS;
use crate::notification::{ExpireTimeout, NotificationDraft};

/// Fills in the timeout of notifications that leave it to the daemon.
pub struct DefaultTimeout {
    timeout_ms: u32,
}

impl DefaultTimeout {
    /// A configured default of 0 falls back to [`FALLBACK_TIMEOUT_MS`].
    pub fn new(configured_ms: u32) -> Self {
        let timeout_ms = if configured_ms == 0 {
            FALLBACK_TIMEOUT_MS
        } else {
            configured_ms
        };
        Self { timeout_ms }
    }

    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }
}

impl Modifier for DefaultTimeout {
    fn name(&self) -> &'static str {
        "default-timeout"
    }

    fn modify(&mut self, draft: &mut NotificationDraft) {
        if draft.expire_timeout == ExpireTimeout::ServerDecides {
            draft.expire_timeout = ExpireTimeout::Millis(self.timeout_ms);
        }
    }
}
