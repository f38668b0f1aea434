//! Configuration file support for waynoted.
//!
//! This module handles loading and validating user settings from the configuration file
//! located at `~/.config/waynoted/config.toml`. Settings include popup geometry, the
//! modifier pipeline, icon lookup and history.
//!
//! If no config file exists, sensible defaults are used automatically.

pub mod enums;
pub mod types;

pub use enums::{ModifierKind, PopupAnchor};
pub use types::{HistoryConfig, IconConfig, ModifierConfig, PopupConfig, ScreenConfig};

use crate::disposition::{LayoutParams, Margins, Rect, Size};
use anyhow::{Context, Result};
use log::{debug, info};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Timeout used when the configured default is zero.
pub const FALLBACK_TIMEOUT_MS: u32 = 3500;

const WIDTH_FACTOR: f64 = 0.21961932650073206442;
const HEIGHT_FACTOR: f64 = 0.28198433420365535248;
const MARGINS_FACTOR: f64 = 0.02610966057441253264;
const EXTRA_WINDOW_WIDTH_FACTOR: f64 = 0.21961932650073206442;
const EXTRA_WINDOW_HEIGHT_FACTOR: f64 = 0.08355091383812010444 / 2.0;

/// Main configuration structure containing all user settings.
///
/// # Example TOML
/// ```toml
/// [popups]
/// width = 420
/// height = 300
/// spacing = 8
/// margins = [16, 16, 16, 16]
///
/// [modifiers]
/// default_timeout = 5000
/// sanitize_body = false
///
/// [history]
/// max_entries = 50
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, JsonSchema)]
pub struct Config {
    /// Fallback screen geometry
    #[serde(default)]
    pub screen: ScreenConfig,

    /// Popup size, spacing, margins and fullscreen policy
    #[serde(default)]
    pub popups: PopupConfig,

    /// Modifier pipeline order and options
    #[serde(default)]
    pub modifiers: ModifierConfig,

    /// Icon theme and cache settings
    #[serde(default)]
    pub icons: IconConfig,

    /// Notification history settings
    #[serde(default)]
    pub history: HistoryConfig,
}

impl Config {
    /// Validates and clamps all configuration values to acceptable ranges.
    ///
    /// Validated ranges:
    /// - screen and popup extents: 0 - 10000
    /// - `spacing` and margins: 0 - 500
    /// - `default_timeout`: up to 600000 ms
    /// - `icons.size`: 16 - 1024
    fn validate_and_clamp(&mut self) {
        clamp_extent("screen.width", &mut self.screen.width, 1);
        clamp_extent("screen.height", &mut self.screen.height, 1);
        clamp_extent("popups.width", &mut self.popups.width, 0);
        clamp_extent("popups.height", &mut self.popups.height, 0);
        clamp_extent(
            "popups.extra_window_width",
            &mut self.popups.extra_window_width,
            0,
        );
        clamp_extent(
            "popups.extra_window_height",
            &mut self.popups.extra_window_height,
            0,
        );

        if !(0..=500).contains(&self.popups.spacing) {
            log::warn!(
                "Invalid spacing {}, clamping to 0-500 range",
                self.popups.spacing
            );
            self.popups.spacing = self.popups.spacing.clamp(0, 500);
        }

        if let Some(margins) = self.popups.margins.as_mut() {
            for margin in margins.iter_mut() {
                if !(0..=500).contains(margin) {
                    log::warn!("Invalid margin {}, clamping to 0-500 range", margin);
                    *margin = (*margin).clamp(0, 500);
                }
            }
        }

        if self.modifiers.default_timeout > 600_000 {
            log::warn!(
                "Invalid default_timeout {}, clamping to 600000 ms",
                self.modifiers.default_timeout
            );
            self.modifiers.default_timeout = 600_000;
        }

        let mut seen = Vec::with_capacity(self.modifiers.pipeline.len());
        self.modifiers.pipeline.retain(|kind| {
            if seen.contains(kind) {
                log::warn!("Modifier {:?} listed twice, keeping the first", kind);
                false
            } else {
                seen.push(*kind);
                true
            }
        });

        if !(16..=1024).contains(&self.icons.size) {
            log::warn!(
                "Invalid icon size {}, clamping to 16-1024 range",
                self.icons.size
            );
            self.icons.size = self.icons.size.clamp(16, 1024);
        }

        if self.icons.theme.trim().is_empty() {
            log::warn!("Empty icon theme, falling back to 'hicolor'");
            self.icons.theme = "hicolor".to_string();
        }
    }

    /// Screen rectangle from the `[screen]` section.
    pub fn screen_geometry(&self) -> Rect {
        Rect::new(
            self.screen.x,
            self.screen.y,
            self.screen.width,
            self.screen.height,
        )
    }

    /// Directory icons are cached in.
    pub fn icon_cache_dir(&self) -> PathBuf {
        self.icons.cache_dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("waynoted")
        })
    }

    /// Returns the path to the configuration file.
    ///
    /// The config file is located at `~/.config/waynoted/config.toml`.
    ///
    /// # Errors
    /// Returns an error if the config directory cannot be determined (e.g., HOME not set).
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not find config directory")?
            .join("waynoted");

        Ok(config_dir.join("config.toml"))
    }

    /// Loads configuration from file, or returns defaults if not found.
    ///
    /// All loaded values are validated and clamped to acceptable ranges.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The config directory path cannot be determined
    /// - The file exists but cannot be read
    /// - The file exists but contains invalid TOML syntax
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            info!("Config file not found, using defaults");
            debug!("Expected config at: {}", config_path.display());
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    /// Loads and validates the config file at `config_path`.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let config_str = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config from {}", config_path.display()))?;

        let mut config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config from {}", config_path.display()))?;

        config.validate_and_clamp();

        info!("Loaded config from {}", config_path.display());
        debug!("Config: {:?}", config);

        Ok(config)
    }

    /// Saves the configuration to `config_path`.
    ///
    /// Creates the parent directory if it doesn't exist. Used when a setting is
    /// changed at runtime, e.g. toggling fullscreen suppression over the bus.
    /// Comments in an existing file are not preserved.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The config directory cannot be created
    /// - The config cannot be serialized to TOML
    /// - The file cannot be written
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let config_str = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(config_path, config_str)
            .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

        info!("Saved config to {}", config_path.display());
        Ok(())
    }

    /// Creates a default configuration file with documentation comments.
    ///
    /// Writes the example config from `config.example.toml` to the user's config directory.
    ///
    /// # Errors
    /// Returns an error if:
    /// - A config file already exists at the target path
    /// - The config directory cannot be created
    /// - The file cannot be written
    pub fn create_default_file() -> Result<PathBuf> {
        let config_path = Self::get_config_path()?;

        if config_path.exists() {
            return Err(anyhow::anyhow!(
                "Config file already exists at {}",
                config_path.display()
            ));
        }

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let default_config = include_str!("../../config.example.toml");
        fs::write(&config_path, default_config)?;

        info!("Created default config at {}", config_path.display());
        Ok(config_path)
    }

    /// JSON schema describing the config file.
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Config)
    }
}

impl PopupConfig {
    /// Popup size, deriving unset extents from `screen`.
    pub fn popup_size(&self, screen: Rect) -> Size {
        derived_size(
            self.width,
            self.height,
            screen,
            WIDTH_FACTOR,
            HEIGHT_FACTOR,
        )
    }

    /// Overflow indicator size, deriving unset extents from `screen`.
    pub fn extra_window_size(&self, screen: Rect) -> Size {
        derived_size(
            self.extra_window_width,
            self.extra_window_height,
            screen,
            EXTRA_WINDOW_WIDTH_FACTOR,
            EXTRA_WINDOW_HEIGHT_FACTOR,
        )
    }

    pub fn margins(&self, screen: Rect) -> Margins {
        match self.margins {
            Some([left, top, right, bottom]) => Margins::new(left, top, right, bottom),
            None => Margins::uniform((MARGINS_FACTOR * f64::from(screen.height)) as i32),
        }
    }

    /// Everything a disposition needs to derive its available region.
    pub fn layout_params(&self, screen: Rect) -> LayoutParams {
        LayoutParams {
            screen,
            margins: self.margins(screen),
            spacing: self.spacing,
            extra_window_size: self.extra_window_size(screen),
        }
    }
}

fn derived_size(
    width: i32,
    height: i32,
    screen: Rect,
    width_factor: f64,
    height_factor: f64,
) -> Size {
    if width > 0 && height > 0 {
        return Size::new(width, height);
    }
    Size::new(
        (width_factor * f64::from(screen.width)) as i32,
        (height_factor * f64::from(screen.height)) as i32,
    )
}

fn clamp_extent(name: &str, value: &mut i32, min: i32) {
    if !(min..=10_000).contains(value) {
        log::warn!(
            "Invalid {} {}, clamping to {}-10000 range",
            name,
            value,
            min
        );
        *value = (*value).clamp(min, 10_000);
    }
}
