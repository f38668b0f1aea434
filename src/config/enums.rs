//! Configuration enum types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Screen corner the popup stack grows from.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum PopupAnchor {
    /// Top-right corner, stacking downward
    #[default]
    TopRight,
    /// Top-left corner, stacking downward
    TopLeft,
}

/// Modifier stages that can appear in the notification pipeline.
///
/// # Example
/// ```toml
/// [modifiers]
/// pipeline = ["id-assigner", "default-timeout", "icon-resolver"]
/// ```
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ModifierKind {
    /// Hands out a fresh id to new notifications
    IdAssigner,
    /// Replaces "server decides" timeouts with the configured default
    DefaultTimeout,
    /// Uses the application name as icon name when no icon was given
    TitleToIcon,
    /// Resolves image hints and icon names to cached files
    IconResolver,
    /// Moves the body into the title when the title only repeats the app name
    BodyPromotion,
    /// Replaces " - " with an em dash
    TextSanitizer,
}

impl ModifierKind {
    /// Default pipeline order.
    pub const DEFAULT_ORDER: [ModifierKind; 6] = [
        ModifierKind::IdAssigner,
        ModifierKind::DefaultTimeout,
        ModifierKind::TitleToIcon,
        ModifierKind::IconResolver,
        ModifierKind::BodyPromotion,
        ModifierKind::TextSanitizer,
    ];
}
