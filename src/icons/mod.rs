//! Icon cache used by the icon resolver.
//!
//! Image hints and theme icons are written once as PNG files named after a
//! blake3 digest of their content, so the same payload always maps to the same
//! file and later lookups are served from memory.

mod dependencies;
mod raster;
mod theme;

#[cfg(test)]
mod tests;

pub use dependencies::{IconDependencies, IconRasterizer, IconThemeLookup};
pub use theme::XdgThemeLookup;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use thiserror::Error;

use crate::notification::ImageData;

/// Prefix of every file the cache writes.
pub const CACHE_FILE_PREFIX: &str = "waynoted-cached_";

/// Errors that can occur while resolving or caching an icon.
#[derive(Debug, Error)]
pub enum IconError {
    #[error("Malformed image payload: {0}")]
    InvalidImage(String),

    #[error("Icon '{0}' not found")]
    NotFound(String),

    #[error("Unsupported icon format: {0}")]
    Unsupported(String),

    #[error("Failed to rasterize icon: {0}")]
    Raster(String),

    #[error("Icon cache I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Content-addressed PNG cache.
pub struct IconCache {
    dir: PathBuf,
    size: u32,
    entries: HashMap<String, PathBuf>,
    deps: IconDependencies,
}

impl IconCache {
    pub fn new(dir: impl Into<PathBuf>, size: u32, theme: &str) -> Self {
        Self::with_dependencies(dir, size, IconDependencies::for_theme(theme))
    }

    pub fn with_dependencies(dir: impl Into<PathBuf>, size: u32, deps: IconDependencies) -> Self {
        Self {
            dir: dir.into(),
            size,
            entries: HashMap::new(),
            deps,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of payloads cached during this session.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stores a raw pixel payload and returns the PNG path.
    pub fn cache_image(&mut self, image: &ImageData) -> Result<PathBuf, IconError> {
        raster::validate_payload(image)?;
        let key = image_key(image);
        let rasterizer = self.deps.rasterizer.clone();
        self.store(key, |dest| rasterizer.encode_pixels(image, dest))
    }

    /// Resolves an icon string to a local file.
    ///
    /// An existing local path (plain or `file://`) is returned as is. Anything
    /// else is treated as a theme icon name and rasterized into the cache.
    pub fn resolve(&mut self, icon: &str) -> Result<PathBuf, IconError> {
        if let Some(path) = local_file(icon) {
            return Ok(path);
        }

        let source = self
            .deps
            .theme
            .lookup(icon)
            .ok_or_else(|| IconError::NotFound(icon.to_string()))?;

        let key = theme_key(icon, &source, self.size);
        let rasterizer = self.deps.rasterizer.clone();
        let size = self.size;
        self.store(key, |dest| rasterizer.rasterize_file(&source, size, dest))
    }

    fn store<F>(&mut self, key: String, write: F) -> Result<PathBuf, IconError>
    where
        F: FnOnce(&Path) -> Result<(), IconError>,
    {
        if let Some(path) = self.entries.get(&key) {
            if path.is_file() {
                return Ok(path.clone());
            }
            warn!("Cached icon {} vanished, re-creating", path.display());
        }

        let path = self.dir.join(format!("{CACHE_FILE_PREFIX}{key}.png"));
        if !path.is_file() {
            fs::create_dir_all(&self.dir)?;
            write(&path)?;
            debug!("Cached icon at {}", path.display());
        }

        self.entries.insert(key, path.clone());
        Ok(path)
    }
}

fn image_key(image: &ImageData) -> String {
    let mut hasher = blake3::Hasher::new();
    for field in [
        image.width,
        image.height,
        image.rowstride,
        image.bits_per_sample,
        image.channels,
    ] {
        hasher.update(&field.to_le_bytes());
    }
    hasher.update(&[u8::from(image.has_alpha)]);
    hasher.update(&image.data);
    hasher.finalize().to_hex().to_string()
}

fn theme_key(name: &str, source: &Path, size: u32) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(b"theme\0");
    hasher.update(name.as_bytes());
    hasher.update(b"\0");
    hasher.update(source.as_os_str().as_encoded_bytes());
    hasher.update(&size.to_le_bytes());
    hasher.finalize().to_hex().to_string()
}

fn local_file(icon: &str) -> Option<PathBuf> {
    let path = if icon.starts_with("file://") {
        url::Url::parse(icon).ok()?.to_file_path().ok()?
    } else {
        PathBuf::from(icon)
    };
    (path.is_absolute() && path.is_file()).then_some(path)
}

/// Converts an absolute path to a `file://` URL string.
pub fn file_url(path: &Path) -> Option<String> {
    url::Url::from_file_path(path).ok().map(String::from)
}
