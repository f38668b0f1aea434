use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::icons::{IconError, raster, theme::XdgThemeLookup};
use crate::notification::ImageData;

/// Abstraction over turning pixels and icon files into cached PNGs.
pub trait IconRasterizer: Send + Sync {
    /// Encodes a raw pixel payload as PNG at `dest`.
    fn encode_pixels(&self, image: &ImageData, dest: &Path) -> Result<(), IconError>;

    /// Rasterizes the icon file at `source` to a `size`-pixel PNG at `dest`.
    fn rasterize_file(&self, source: &Path, size: u32, dest: &Path) -> Result<(), IconError>;
}

/// Abstraction over icon theme lookup.
pub trait IconThemeLookup: Send + Sync {
    /// Finds the file backing icon `name`, if the theme has one.
    fn lookup(&self, name: &str) -> Option<PathBuf>;
}

/// Bundle of dependencies used by the icon cache. Each component can be mocked in tests.
#[derive(Clone)]
pub struct IconDependencies {
    pub rasterizer: Arc<dyn IconRasterizer>,
    pub theme: Arc<dyn IconThemeLookup>,
}

impl IconDependencies {
    /// Production dependencies searching `theme` before `hicolor`.
    pub fn for_theme(theme: &str) -> Self {
        Self {
            rasterizer: Arc::new(CairoRasterizer),
            theme: Arc::new(XdgThemeLookup::new(theme)),
        }
    }
}

impl Default for IconDependencies {
    fn default() -> Self {
        Self::for_theme("hicolor")
    }
}

struct CairoRasterizer;

impl IconRasterizer for CairoRasterizer {
    fn encode_pixels(&self, image: &ImageData, dest: &Path) -> Result<(), IconError> {
        raster::encode_pixels(image, dest)
    }

    fn rasterize_file(&self, source: &Path, size: u32, dest: &Path) -> Result<(), IconError> {
        raster::rasterize_file(source, size, dest)
    }
}
