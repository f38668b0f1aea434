//! Modifier pipeline.
//!
//! Every inbound notification passes through an ordered list of [`Modifier`]s
//! before the center decides where it goes. Each stage edits the draft in
//! place and later stages see what earlier ones did. The order comes from the
//! `[modifiers]` config section.

mod icon;
mod id;
mod text;
mod timeout;

#[cfg(test)]
mod tests;

pub use icon::IconResolver;
pub use id::{IdAssigner, IdSequence};
pub use text::{BodyPromotion, TextSanitizer, TitleToIcon};
pub use timeout::DefaultTimeout;

use log::debug;

use crate::config::{Config, ModifierConfig, ModifierKind};
use crate::icons::IconCache;
use crate::notification::{Notification, NotificationDraft};

/// A single pipeline stage.
pub trait Modifier: Send {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn modify(&mut self, draft: &mut NotificationDraft);
}

/// Ordered list of modifiers.
#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Box<dyn Modifier>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the configured pipeline with an icon cache in the configured cache dir.
    pub fn from_config(config: &Config, ids: IdSequence) -> Self {
        let cache = IconCache::new(
            config.icon_cache_dir(),
            config.icons.size,
            &config.icons.theme,
        );
        Self::with_icon_cache(&config.modifiers, ids, cache)
    }

    /// Builds the configured pipeline around an existing icon cache.
    ///
    /// The cache is only consumed if the pipeline contains an icon resolver.
    pub fn with_icon_cache(config: &ModifierConfig, ids: IdSequence, cache: IconCache) -> Self {
        let mut pipeline = Self::new();
        let mut cache = Some(cache);

        for kind in &config.pipeline {
            match kind {
                ModifierKind::IdAssigner => pipeline.push(IdAssigner::new(ids.clone())),
                ModifierKind::DefaultTimeout => {
                    pipeline.push(DefaultTimeout::new(config.default_timeout))
                }
                ModifierKind::TitleToIcon => pipeline.push(TitleToIcon),
                ModifierKind::IconResolver => match cache.take() {
                    Some(cache) => pipeline.push(IconResolver::new(cache)),
                    None => log::warn!("Icon resolver listed twice, ignoring the repeat"),
                },
                ModifierKind::BodyPromotion => pipeline.push(BodyPromotion),
                ModifierKind::TextSanitizer => {
                    pipeline.push(TextSanitizer::new(config.sanitize_title, config.sanitize_body))
                }
            }
        }

        if pipeline.is_empty() {
            log::warn!("Every modifier is disabled, notifications are shown as sent");
        } else {
            debug!(
                "Modifier pipeline ({} stages): {:?}",
                pipeline.len(),
                pipeline.stage_names()
            );
        }
        pipeline
    }

    pub fn push(&mut self, modifier: impl Modifier + 'static) {
        self.stages.push(Box::new(modifier));
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Runs every stage in order and seals the result.
    pub fn run(&mut self, mut draft: NotificationDraft) -> Notification {
        for stage in &mut self.stages {
            stage.modify(&mut draft);
        }
        draft.seal()
    }
}

/// Case-insensitive string comparison used by the app/title heuristics.
pub(crate) fn same_ignoring_case(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}
