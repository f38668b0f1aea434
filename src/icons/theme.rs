//! Minimal freedesktop icon theme lookup.

use std::env;
use std::path::PathBuf;

use super::IconThemeLookup;

const SIZES: &[&str] = &[
    "scalable", "512x512", "256x256", "192x192", "128x128", "96x96", "64x64", "48x48", "32x32",
    "24x24", "22x22", "16x16",
];

const CONTEXTS: &[&str] = &[
    "apps",
    "status",
    "devices",
    "actions",
    "categories",
    "emblems",
    "mimetypes",
    "places",
];

const EXTENSIONS: &[&str] = &["svg", "png"];

/// Searches XDG icon directories for a named icon.
///
/// Themes are tried in order (the configured one, then `hicolor`), and within a
/// theme scalable icons win over the largest fixed size.
#[derive(Debug, Clone)]
pub struct XdgThemeLookup {
    themes: Vec<String>,
    base_dirs: Vec<PathBuf>,
    pixmap_dirs: Vec<PathBuf>,
}

impl XdgThemeLookup {
    pub fn new(theme: &str) -> Self {
        let mut themes = vec![theme.to_string()];
        if theme != "hicolor" {
            themes.push("hicolor".to_string());
        }

        let mut base_dirs = Vec::new();
        if let Some(data) = dirs::data_dir() {
            base_dirs.push(data.join("icons"));
        }
        if let Some(home) = dirs::home_dir() {
            base_dirs.push(home.join(".icons"));
        }
        let data_dirs = env::var("XDG_DATA_DIRS")
            .ok()
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| "/usr/local/share:/usr/share".to_string());
        base_dirs.extend(
            data_dirs
                .split(':')
                .filter(|dir| !dir.is_empty())
                .map(|dir| PathBuf::from(dir).join("icons")),
        );

        Self::with_dirs(themes, base_dirs, vec![PathBuf::from("/usr/share/pixmaps")])
    }

    pub fn with_dirs(
        themes: Vec<String>,
        base_dirs: Vec<PathBuf>,
        pixmap_dirs: Vec<PathBuf>,
    ) -> Self {
        Self {
            themes,
            base_dirs,
            pixmap_dirs,
        }
    }
}

impl IconThemeLookup for XdgThemeLookup {
    fn lookup(&self, name: &str) -> Option<PathBuf> {
        if name.is_empty() || name.contains('/') {
            return None;
        }

        for theme in &self.themes {
            for base in &self.base_dirs {
                let theme_dir = base.join(theme);
                if !theme_dir.is_dir() {
                    continue;
                }
                for size in SIZES {
                    for context in CONTEXTS {
                        for ext in EXTENSIONS {
                            let candidate =
                                theme_dir.join(size).join(context).join(format!("{name}.{ext}"));
                            if candidate.is_file() {
                                return Some(candidate);
                            }
                        }
                    }
                }
            }
        }

        self.pixmap_dirs.iter().find_map(|dir| {
            EXTENSIONS
                .iter()
                .map(|ext| dir.join(format!("{name}.{ext}")))
                .find(|candidate| candidate.is_file())
        })
    }
}
