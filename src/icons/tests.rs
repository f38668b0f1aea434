use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::*;

#[derive(Clone, Default)]
struct MockRasterizer {
    encodes: Arc<Mutex<usize>>,
    rasterized: Arc<Mutex<Vec<PathBuf>>>,
}

impl IconRasterizer for MockRasterizer {
    fn encode_pixels(&self, _image: &ImageData, dest: &Path) -> Result<(), IconError> {
        *self.encodes.lock().unwrap() += 1;
        fs::write(dest, b"png")?;
        Ok(())
    }

    fn rasterize_file(&self, source: &Path, _size: u32, dest: &Path) -> Result<(), IconError> {
        self.rasterized.lock().unwrap().push(source.to_path_buf());
        fs::write(dest, b"png")?;
        Ok(())
    }
}

#[derive(Clone, Default)]
struct MockTheme {
    icons: HashMap<String, PathBuf>,
}

impl IconThemeLookup for MockTheme {
    fn lookup(&self, name: &str) -> Option<PathBuf> {
        self.icons.get(name).cloned()
    }
}

fn mock_cache(dir: &Path, theme: MockTheme) -> (IconCache, MockRasterizer) {
    let rasterizer = MockRasterizer::default();
    let deps = IconDependencies {
        rasterizer: Arc::new(rasterizer.clone()),
        theme: Arc::new(theme),
    };
    (IconCache::with_dependencies(dir, 64, deps), rasterizer)
}

fn red_square() -> ImageData {
    ImageData::rgba(2, 2, [255, 0, 0, 255].repeat(4))
}

#[test]
fn identical_payloads_share_one_cached_file() {
    let dir = tempfile::tempdir().unwrap();
    let (mut cache, rasterizer) = mock_cache(dir.path(), MockTheme::default());

    let first = cache.cache_image(&red_square()).unwrap();
    let second = cache.cache_image(&red_square()).unwrap();

    assert_eq!(first, second);
    assert_eq!(*rasterizer.encodes.lock().unwrap(), 1);
    assert_eq!(cache.len(), 1);
    let name = first.file_name().unwrap().to_str().unwrap();
    assert!(name.starts_with(CACHE_FILE_PREFIX));
    assert!(name.ends_with(".png"));
}

#[test]
fn different_payloads_get_different_files() {
    let dir = tempfile::tempdir().unwrap();
    let (mut cache, _) = mock_cache(dir.path(), MockTheme::default());

    let red = cache.cache_image(&red_square()).unwrap();
    let blue = cache
        .cache_image(&ImageData::rgba(2, 2, [0, 0, 255, 255].repeat(4)))
        .unwrap();

    assert_ne!(red, blue);
}

#[test]
fn file_left_by_previous_run_is_reused() {
    let dir = tempfile::tempdir().unwrap();
    let (mut first_run, _) = mock_cache(dir.path(), MockTheme::default());
    let path = first_run.cache_image(&red_square()).unwrap();

    let (mut second_run, rasterizer) = mock_cache(dir.path(), MockTheme::default());
    assert_eq!(second_run.cache_image(&red_square()).unwrap(), path);
    assert_eq!(*rasterizer.encodes.lock().unwrap(), 0);
}

#[test]
fn truncated_payload_is_rejected_before_encoding() {
    let dir = tempfile::tempdir().unwrap();
    let (mut cache, rasterizer) = mock_cache(dir.path(), MockTheme::default());

    let truncated = ImageData::rgba(4, 4, vec![0; 10]);
    assert!(matches!(
        cache.cache_image(&truncated),
        Err(IconError::InvalidImage(_))
    ));
    assert_eq!(*rasterizer.encodes.lock().unwrap(), 0);
}

#[test]
fn existing_local_path_wins_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let icon = dir.path().join("local.png");
    fs::write(&icon, b"png").unwrap();
    let (mut cache, rasterizer) = mock_cache(dir.path(), MockTheme::default());

    assert_eq!(cache.resolve(icon.to_str().unwrap()).unwrap(), icon);
    let url = file_url(&icon).unwrap();
    assert_eq!(cache.resolve(&url).unwrap(), icon);
    assert!(rasterizer.rasterized.lock().unwrap().is_empty());
}

#[test]
fn theme_icon_is_rasterized_once() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("mail.svg");
    fs::write(&source, b"<svg/>").unwrap();
    let theme = MockTheme {
        icons: HashMap::from([("mail".to_string(), source.clone())]),
    };
    let (mut cache, rasterizer) = mock_cache(&dir.path().join("cache"), theme);

    let first = cache.resolve("mail").unwrap();
    let second = cache.resolve("mail").unwrap();

    assert_eq!(first, second);
    assert!(first.starts_with(dir.path().join("cache")));
    assert_eq!(*rasterizer.rasterized.lock().unwrap(), vec![source]);
}

#[test]
fn unknown_name_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let (mut cache, _) = mock_cache(dir.path(), MockTheme::default());
    assert!(matches!(
        cache.resolve("no-such-icon"),
        Err(IconError::NotFound(name)) if name == "no-such-icon"
    ));
}

#[test]
fn cairo_encoder_writes_png() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("out.png");

    raster::encode_pixels(&red_square(), &dest).unwrap();

    let bytes = fs::read(&dest).unwrap();
    assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G']));
}

#[test]
fn rgb_payload_without_alpha_is_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("rgb.png");
    let image = ImageData {
        width: 2,
        height: 1,
        rowstride: 8,
        has_alpha: false,
        bits_per_sample: 8,
        channels: 3,
        data: vec![10, 20, 30, 40, 50, 60, 0, 0],
    };

    raster::encode_pixels(&image, &dest).unwrap();
    assert!(dest.is_file());
}

#[test]
fn svg_rasterizes_to_requested_size() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("dot.svg");
    fs::write(
        &source,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="16" height="16"><circle cx="8" cy="8" r="8" fill="red"/></svg>"#,
    )
    .unwrap();
    let dest = dir.path().join("dot.png");

    raster::rasterize_file(&source, 32, &dest).unwrap();

    let mut file = fs::File::open(&dest).unwrap();
    let surface = cairo::ImageSurface::create_from_png(&mut file).unwrap();
    assert_eq!((surface.width(), surface.height()), (32, 32));
}

#[test]
fn unsupported_extension_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("icon.xpm");
    fs::write(&source, b"/* XPM */").unwrap();
    assert!(matches!(
        raster::rasterize_file(&source, 32, &dir.path().join("x.png")),
        Err(IconError::Unsupported(_))
    ));
}

#[test]
fn xdg_lookup_prefers_configured_theme_and_scalable() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("icons");
    let hicolor = base.join("hicolor/48x48/apps");
    let custom_fixed = base.join("Custom/48x48/apps");
    let custom_scalable = base.join("Custom/scalable/apps");
    for d in [&hicolor, &custom_fixed, &custom_scalable] {
        fs::create_dir_all(d).unwrap();
    }
    fs::write(hicolor.join("mail.png"), b"png").unwrap();
    fs::write(custom_fixed.join("mail.png"), b"png").unwrap();
    fs::write(custom_scalable.join("mail.svg"), b"<svg/>").unwrap();
    fs::write(hicolor.join("only-hicolor.png"), b"png").unwrap();

    let lookup = XdgThemeLookup::with_dirs(
        vec!["Custom".to_string(), "hicolor".to_string()],
        vec![base],
        Vec::new(),
    );

    assert_eq!(lookup.lookup("mail"), Some(custom_scalable.join("mail.svg")));
    assert_eq!(
        lookup.lookup("only-hicolor"),
        Some(hicolor.join("only-hicolor.png"))
    );
    assert_eq!(lookup.lookup("missing"), None);
    assert_eq!(lookup.lookup("../etc/passwd"), None);
}

#[test]
fn xdg_lookup_falls_back_to_pixmaps() {
    let dir = tempfile::tempdir().unwrap();
    let pixmaps = dir.path().join("pixmaps");
    fs::create_dir_all(&pixmaps).unwrap();
    fs::write(pixmaps.join("legacy.png"), b"png").unwrap();

    let lookup = XdgThemeLookup::with_dirs(
        vec!["hicolor".to_string()],
        vec![dir.path().join("icons")],
        vec![pixmaps.clone()],
    );
    assert_eq!(lookup.lookup("legacy"), Some(pixmaps.join("legacy.png")));
}
