use super::{Modifier, same_ignoring_case};
use crate::notification::NotificationDraft;

/// Uses the application name as an icon name when nothing else supplied one.
///
/// Only kicks in when the title just repeats the application name. The result is
/// a bare theme name; an icon resolver placed later turns it into a file.
pub struct TitleToIcon;

impl Modifier for TitleToIcon {
    fn name(&self) -> &'static str {
        "title-to-icon"
    }

    fn modify(&mut self, draft: &mut NotificationDraft) {
        if draft.icon_url.is_empty() && same_ignoring_case(&draft.application, &draft.title) {
            draft.icon_url = draft.application.to_lowercase().replace(' ', "-");
        }
    }
}

/// Moves the body into the title when the title only repeats the application name.
pub struct BodyPromotion;

impl Modifier for BodyPromotion {
    fn name(&self) -> &'static str {
        "body-promotion"
    }

    fn modify(&mut self, draft: &mut NotificationDraft) {
        if same_ignoring_case(&draft.application, &draft.title) {
            draft.title = std::mem::take(&mut draft.body);
        }
    }
}

const PLAIN_DASH: &str = " - ";
const EM_DASH: &str = " \u{2014} ";

/// Replaces spaced hyphens with em dashes.
pub struct TextSanitizer {
    title: bool,
    body: bool,
}

impl TextSanitizer {
    pub fn new(title: bool, body: bool) -> Self {
        Self { title, body }
    }
}

impl Modifier for TextSanitizer {
    fn name(&self) -> &'static str {
        "text-sanitizer"
    }

    fn modify(&mut self, draft: &mut NotificationDraft) {
        if self.title && draft.title.contains(PLAIN_DASH) {
            draft.title = draft.title.replace(PLAIN_DASH, EM_DASH);
        }
        if self.body && draft.body.contains(PLAIN_DASH) {
            draft.body = draft.body.replace(PLAIN_DASH, EM_DASH);
        }
    }
}
