//! Configuration type definitions.

use super::enums::{ModifierKind, PopupAnchor};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Screen area popups are laid out in.
///
/// The renderer can report the real output geometry at runtime; these values
/// are used until it does.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ScreenConfig {
    #[serde(default)]
    pub x: i32,

    #[serde(default)]
    pub y: i32,

    /// Available width in pixels
    #[serde(default = "default_screen_width")]
    pub width: i32,

    /// Available height in pixels
    #[serde(default = "default_screen_height")]
    pub height: i32,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            width: default_screen_width(),
            height: default_screen_height(),
        }
    }
}

/// Popup geometry and visibility policy.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PopupConfig {
    /// Popup width in pixels; 0 derives it from the screen width
    #[serde(default)]
    pub width: i32,

    /// Popup height in pixels; 0 derives it from the screen height
    #[serde(default)]
    pub height: i32,

    /// Gap between stacked popups in pixels
    #[serde(default)]
    pub spacing: i32,

    /// Screen margins as `[left, top, right, bottom]`; unset derives them from the screen height
    #[serde(default)]
    pub margins: Option<[i32; 4]>,

    /// Width of the overflow indicator window; 0 derives it from the screen width
    #[serde(default)]
    pub extra_window_width: i32,

    /// Height of the overflow indicator window; 0 derives it from the screen height
    #[serde(default)]
    pub extra_window_height: i32,

    /// Corner the stack grows from
    #[serde(default)]
    pub anchor: PopupAnchor,

    /// Queue popups while any window is fullscreen
    #[serde(default)]
    pub dont_show_when_fullscreen_any: bool,

    /// Queue popups while a window on the current desktop is fullscreen
    #[serde(default)]
    pub dont_show_when_fullscreen_current_desktop: bool,
}

impl Default for PopupConfig {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            spacing: 0,
            margins: None,
            extra_window_width: 0,
            extra_window_height: 0,
            anchor: PopupAnchor::default(),
            dont_show_when_fullscreen_any: false,
            dont_show_when_fullscreen_current_desktop: false,
        }
    }
}

/// Notification modifier pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ModifierConfig {
    /// Stages to run, in order. Stages left out are disabled.
    #[serde(default = "default_pipeline")]
    pub pipeline: Vec<ModifierKind>,

    /// Timeout in milliseconds for notifications that let the daemon decide (0 = 3500)
    #[serde(default = "default_timeout")]
    pub default_timeout: u32,

    /// Replace " - " with an em dash in titles
    #[serde(default = "default_true")]
    pub sanitize_title: bool,

    /// Replace " - " with an em dash in bodies
    #[serde(default = "default_true")]
    pub sanitize_body: bool,
}

impl Default for ModifierConfig {
    fn default() -> Self {
        Self {
            pipeline: default_pipeline(),
            default_timeout: default_timeout(),
            sanitize_title: true,
            sanitize_body: true,
        }
    }
}

/// Icon lookup and caching.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct IconConfig {
    /// Icon theme searched before `hicolor`
    #[serde(default = "default_icon_theme")]
    pub theme: String,

    /// Edge length in pixels theme icons are rasterized to (valid range: 16 - 1024)
    #[serde(default = "default_icon_size")]
    pub size: u32,

    /// Directory for cached icons; defaults to `~/.cache/waynoted`
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
}

impl Default for IconConfig {
    fn default() -> Self {
        Self {
            theme: default_icon_theme(),
            size: default_icon_size(),
            cache_dir: None,
        }
    }
}

/// Notification history.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HistoryConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Entries kept before the oldest is dropped (0 = unbounded)
    #[serde(default = "default_history_entries")]
    pub max_entries: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: default_history_entries(),
        }
    }
}

fn default_screen_width() -> i32 {
    1920
}

fn default_screen_height() -> i32 {
    1080
}

fn default_pipeline() -> Vec<ModifierKind> {
    ModifierKind::DEFAULT_ORDER.to_vec()
}

fn default_timeout() -> u32 {
    super::FALLBACK_TIMEOUT_MS
}

fn default_true() -> bool {
    true
}

fn default_icon_theme() -> String {
    "hicolor".to_string()
}

fn default_icon_size() -> u32 {
    256
}

fn default_history_entries() -> usize {
    100
}
