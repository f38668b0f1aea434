use std::path::Path;

use log::warn;

use super::Modifier;
use crate::icons::{self, IconCache};
use crate::notification::{Hints, ImageData, NotificationDraft};

const IMAGE_DATA_KEYS: &[&str] = &["image-data", "image_data"];
const IMAGE_PATH_KEYS: &[&str] = &["image-path", "image_path"];
const LEGACY_ICON_DATA_KEY: &str = "icon_data";

/// Turns image hints and icon names into `file://` URLs of cached PNGs.
///
/// Sources are tried in order: inline image hint, image path hint, then the
/// icon string itself. Remote `http(s)` icons are left alone. When every source
/// fails the icon is cleared and the notification is shown without one.
pub struct IconResolver {
    cache: IconCache,
}

impl IconResolver {
    pub fn new(cache: IconCache) -> Self {
        Self { cache }
    }

    fn cache_image(&mut self, image: &ImageData) -> Option<String> {
        match self.cache.cache_image(image) {
            Ok(path) => Some(to_url(&path)),
            Err(err) => {
                warn!("Dropping image hint: {}", err);
                None
            }
        }
    }

    fn resolve(&mut self, icon: &str) -> Option<String> {
        match self.cache.resolve(icon) {
            Ok(path) => Some(to_url(&path)),
            Err(err) => {
                warn!("Cannot resolve icon '{}': {}", icon, err);
                None
            }
        }
    }
}

impl Modifier for IconResolver {
    fn name(&self) -> &'static str {
        "icon-resolver"
    }

    fn modify(&mut self, draft: &mut NotificationDraft) {
        if let Some(image) = image_hint(&draft.hints, IMAGE_DATA_KEYS) {
            if let Some(url) = self.cache_image(image) {
                draft.icon_url = url;
                return;
            }
        }

        if let Some(path) = string_hint(&draft.hints, IMAGE_PATH_KEYS) {
            if let Some(url) = self.resolve(path) {
                draft.icon_url = url;
                return;
            }
        }

        if is_remote(&draft.icon_url) {
            return;
        }

        if !draft.icon_url.is_empty() {
            let resolved = self.resolve(&draft.icon_url);
            draft.icon_url = resolved.unwrap_or_default();
            return;
        }

        if let Some(image) = image_hint(&draft.hints, &[LEGACY_ICON_DATA_KEY]) {
            if let Some(url) = self.cache_image(image) {
                draft.icon_url = url;
            }
        }
    }
}

fn image_hint<'a>(hints: &'a Hints, keys: &[&str]) -> Option<&'a ImageData> {
    keys.iter()
        .find_map(|key| hints.get(*key).and_then(|hint| hint.as_image()))
}

fn string_hint<'a>(hints: &'a Hints, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|key| {
        hints
            .get(*key)
            .and_then(|hint| hint.as_str())
            .filter(|value| !value.is_empty())
    })
}

/// http(s) URLs, scheme matched case-insensitively.
fn is_remote(icon: &str) -> bool {
    ["http://", "https://"].iter().any(|scheme| {
        icon.get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    })
}

fn to_url(path: &Path) -> String {
    icons::file_url(path).unwrap_or_else(|| path.display().to_string())
}
