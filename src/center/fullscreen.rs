//! Popup suppression while a fullscreen window is up.

use crate::config::PopupConfig;

/// Platform query for fullscreen windows.
pub trait FullscreenDetector: Send {
    fn fullscreen_on_current_desktop(&self) -> bool;
    fn fullscreen_anywhere(&self) -> bool;
}

/// Detector for platforms without fullscreen information.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFullscreen;

impl FullscreenDetector for NoFullscreen {
    fn fullscreen_on_current_desktop(&self) -> bool {
        false
    }

    fn fullscreen_anywhere(&self) -> bool {
        false
    }
}

/// Decides whether popups are held back. The detector is asked every time.
pub struct FullscreenPolicy {
    detector: Box<dyn FullscreenDetector>,
    any: bool,
    current_desktop: bool,
}

impl FullscreenPolicy {
    pub fn new(detector: Box<dyn FullscreenDetector>, config: &PopupConfig) -> Self {
        Self {
            detector,
            any: config.dont_show_when_fullscreen_any,
            current_desktop: config.dont_show_when_fullscreen_current_desktop,
        }
    }

    pub fn set_detector(&mut self, detector: Box<dyn FullscreenDetector>) {
        self.detector = detector;
    }

    pub fn apply_config(&mut self, config: &PopupConfig) {
        self.any = config.dont_show_when_fullscreen_any;
        self.current_desktop = config.dont_show_when_fullscreen_current_desktop;
    }

    pub fn set_current_desktop(&mut self, enabled: bool) {
        self.current_desktop = enabled;
    }

    pub fn current_desktop(&self) -> bool {
        self.current_desktop
    }

    /// Each enabled flag is checked on its own; either one suppresses.
    pub fn should_suppress_popup(&self) -> bool {
        (self.current_desktop && self.detector.fullscreen_on_current_desktop())
            || (self.any && self.detector.fullscreen_anywhere())
    }
}
