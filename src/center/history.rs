//! Record of received notifications, newest first.

use std::collections::VecDeque;

use chrono::{DateTime, Local};

use crate::config::HistoryConfig;
use crate::notification::{Notification, NotificationId};

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub received: DateTime<Local>,
    pub notification: Notification,
}

#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
    enabled: bool,
    max_entries: usize,
}

impl History {
    pub fn new(config: &HistoryConfig) -> Self {
        Self {
            entries: VecDeque::new(),
            enabled: config.enabled,
            max_entries: config.max_entries,
        }
    }

    pub fn apply_config(&mut self, config: &HistoryConfig) {
        self.enabled = config.enabled;
        self.max_entries = config.max_entries;
        if !self.enabled {
            self.entries.clear();
        }
        self.truncate();
    }

    /// Adds `notification` at the front. A replacement supersedes the entry with the same id.
    pub fn record(&mut self, notification: Notification, received: DateTime<Local>) {
        if !self.enabled {
            return;
        }
        self.entries
            .retain(|entry| entry.notification.id != notification.id);
        self.entries.push_front(HistoryEntry {
            received,
            notification,
        });
        self.truncate();
    }

    fn truncate(&mut self) {
        if self.max_entries > 0 {
            self.entries.truncate(self.max_entries);
        }
    }

    pub fn get(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    pub fn find(&self, id: NotificationId) -> Option<&HistoryEntry> {
        self.entries
            .iter()
            .find(|entry| entry.notification.id == id)
    }

    pub fn remove(&mut self, index: usize) -> Option<HistoryEntry> {
        self.entries.remove(index)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
