use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use super::Modifier;
use crate::notification::{NotificationDraft, NotificationId};

/// Process-wide id counter. Clones share the same sequence.
///
/// Ids start at 1 and are never handed out twice; zero is skipped on wrap.
#[derive(Debug, Clone, Default)]
pub struct IdSequence(Arc<AtomicU32>);

impl IdSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> NotificationId {
        loop {
            let id = self.0.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
            if id != 0 {
                return id;
            }
        }
    }
}

/// Gives new notifications a fresh id. Replacements are left for the center.
pub struct IdAssigner {
    ids: IdSequence,
}

impl IdAssigner {
    pub fn new(ids: IdSequence) -> Self {
        Self { ids }
    }
}

impl Modifier for IdAssigner {
    fn name(&self) -> &'static str {
        "id-assigner"
    }

    fn modify(&mut self, draft: &mut NotificationDraft) {
        if draft.replaces_id == 0 {
            draft.id = self.ids.next_id();
        }
    }
}
