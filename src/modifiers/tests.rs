use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::*;
use crate::icons::{IconDependencies, IconError, IconRasterizer, IconThemeLookup};
use crate::notification::{ExpireTimeout, Hint, ImageData};

#[derive(Clone, Default)]
struct CountingRasterizer {
    calls: Arc<Mutex<usize>>,
}

impl IconRasterizer for CountingRasterizer {
    fn encode_pixels(&self, _image: &ImageData, dest: &Path) -> Result<(), IconError> {
        *self.calls.lock().unwrap() += 1;
        fs::write(dest, b"png")?;
        Ok(())
    }

    fn rasterize_file(&self, _source: &Path, _size: u32, dest: &Path) -> Result<(), IconError> {
        *self.calls.lock().unwrap() += 1;
        fs::write(dest, b"png")?;
        Ok(())
    }
}

struct FixedTheme(Option<PathBuf>);

impl IconThemeLookup for FixedTheme {
    fn lookup(&self, _name: &str) -> Option<PathBuf> {
        self.0.clone()
    }
}

fn cache_in(dir: &Path, theme_hit: Option<PathBuf>) -> (IconCache, CountingRasterizer) {
    let rasterizer = CountingRasterizer::default();
    let deps = IconDependencies {
        rasterizer: Arc::new(rasterizer.clone()),
        theme: Arc::new(FixedTheme(theme_hit)),
    };
    (IconCache::with_dependencies(dir, 64, deps), rasterizer)
}

fn default_pipeline(dir: &Path, ids: IdSequence) -> Pipeline {
    let (cache, _) = cache_in(dir, None);
    Pipeline::with_icon_cache(&ModifierConfig::default(), ids, cache)
}

#[test]
fn default_pipeline_runs_every_stage_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = default_pipeline(dir.path(), IdSequence::new());
    assert_eq!(
        pipeline.stage_names(),
        vec![
            "id-assigner",
            "default-timeout",
            "title-to-icon",
            "icon-resolver",
            "body-promotion",
            "text-sanitizer",
        ]
    );
}

#[test]
fn mail_notification_promotes_body_and_gets_default_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let mut pipeline = default_pipeline(dir.path(), IdSequence::new());

    let notification = pipeline.run(
        NotificationDraft::new("Mail", "Mail", "You have 3 new messages").with_timeout(-1),
    );

    assert_eq!(notification.title, "You have 3 new messages");
    assert_eq!(notification.body, "");
    assert_eq!(notification.expire_timeout, ExpireTimeout::Millis(3500));
    assert_eq!(notification.id, 1);
}

#[test]
fn id_assigner_shares_the_sequence_and_skips_replacements() {
    let ids = IdSequence::new();
    let mut assigner = IdAssigner::new(ids.clone());

    let mut first = NotificationDraft::new("a", "b", "c");
    let mut second = NotificationDraft::new("a", "b", "c");
    let mut replacement = NotificationDraft::new("a", "b", "c").with_replaces_id(1);
    assigner.modify(&mut first);
    assigner.modify(&mut second);
    assigner.modify(&mut replacement);

    assert_eq!((first.id, second.id, replacement.id), (1, 2, 0));
    assert_eq!(ids.next_id(), 3);
}

#[test]
fn default_timeout_only_touches_server_decides() {
    let mut modifier = DefaultTimeout::new(8000);

    let mut server = NotificationDraft::new("a", "b", "c").with_timeout(-1);
    let mut never = NotificationDraft::new("a", "b", "c").with_timeout(0);
    let mut explicit = NotificationDraft::new("a", "b", "c").with_timeout(1200);
    for draft in [&mut server, &mut never, &mut explicit] {
        modifier.modify(draft);
    }

    assert_eq!(server.expire_timeout, ExpireTimeout::Millis(8000));
    assert_eq!(never.expire_timeout, ExpireTimeout::Never);
    assert_eq!(explicit.expire_timeout, ExpireTimeout::Millis(1200));
}

#[test]
fn configured_zero_timeout_falls_back() {
    assert_eq!(DefaultTimeout::new(0).timeout_ms(), 3500);
}

#[test]
fn title_to_icon_derives_theme_name() {
    let mut draft = NotificationDraft::new("Network Manager", "network manager", "Connected");
    TitleToIcon.modify(&mut draft);
    assert_eq!(draft.icon_url, "network-manager");

    let mut with_icon = NotificationDraft::new("Mail", "Mail", "x").with_icon("mail-unread");
    TitleToIcon.modify(&mut with_icon);
    assert_eq!(with_icon.icon_url, "mail-unread");

    let mut distinct = NotificationDraft::new("Mail", "Inbox", "x");
    TitleToIcon.modify(&mut distinct);
    assert!(distinct.icon_url.is_empty());
}

#[test]
fn body_promotion_requires_matching_title() {
    let mut distinct = NotificationDraft::new("Mail", "Inbox", "3 new");
    BodyPromotion.modify(&mut distinct);
    assert_eq!((distinct.title.as_str(), distinct.body.as_str()), ("Inbox", "3 new"));
}

#[test]
fn sanitizer_respects_toggles() {
    let mut both = TextSanitizer::new(true, true);
    let mut title_only = TextSanitizer::new(true, false);

    let mut a = NotificationDraft::new("app", "Song - Artist", "A - B - C");
    let mut b = a.clone();
    both.modify(&mut a);
    title_only.modify(&mut b);

    assert_eq!(a.title, "Song \u{2014} Artist");
    assert_eq!(a.body, "A \u{2014} B \u{2014} C");
    assert_eq!(b.title, "Song \u{2014} Artist");
    assert_eq!(b.body, "A - B - C");
}

#[test]
fn sanitizer_leaves_unspaced_hyphens() {
    let mut draft = NotificationDraft::new("app", "well-known", "x-y");
    TextSanitizer::new(true, true).modify(&mut draft);
    assert_eq!(draft.title, "well-known");
    assert_eq!(draft.body, "x-y");
}

#[test]
fn http_icon_survives_repeated_resolution() {
    let dir = tempfile::tempdir().unwrap();
    let (cache, rasterizer) = cache_in(dir.path(), None);
    let mut resolver = IconResolver::new(cache);

    let mut draft =
        NotificationDraft::new("a", "b", "c").with_icon("http://example.org/icon.png?v=1");
    resolver.modify(&mut draft);
    resolver.modify(&mut draft);

    assert_eq!(draft.icon_url, "http://example.org/icon.png?v=1");
    assert_eq!(*rasterizer.calls.lock().unwrap(), 0);
}

#[test]
fn uppercase_scheme_counts_as_remote() {
    let dir = tempfile::tempdir().unwrap();
    let (cache, rasterizer) = cache_in(dir.path(), None);
    let mut resolver = IconResolver::new(cache);

    let mut upper = NotificationDraft::new("a", "b", "c").with_icon("HTTPS://example.com/a.png");
    let mut mixed = NotificationDraft::new("a", "b", "c").with_icon("Http://example.com/b.png");
    let mut lookalike = NotificationDraft::new("a", "b", "c").with_icon("httpx");
    resolver.modify(&mut upper);
    resolver.modify(&mut mixed);
    resolver.modify(&mut lookalike);

    assert_eq!(upper.icon_url, "HTTPS://example.com/a.png");
    assert_eq!(mixed.icon_url, "Http://example.com/b.png");
    assert_eq!(lookalike.icon_url, "");
    assert_eq!(*rasterizer.calls.lock().unwrap(), 0);
}

#[test]
fn image_hint_wins_and_is_cached_once() {
    let dir = tempfile::tempdir().unwrap();
    let (cache, rasterizer) = cache_in(dir.path(), None);
    let mut resolver = IconResolver::new(cache);
    let image = ImageData::rgba(1, 1, vec![1, 2, 3, 255]);

    let mut first = NotificationDraft::new("a", "b", "c")
        .with_icon("https://example.org/x.png")
        .with_hint("image-data", Hint::Image(image.clone()));
    let mut second =
        NotificationDraft::new("a", "b", "c").with_hint("image_data", Hint::Image(image));
    resolver.modify(&mut first);
    resolver.modify(&mut second);

    assert!(first.icon_url.starts_with("file://"));
    assert!(first.icon_url.ends_with(".png"));
    assert_eq!(first.icon_url, second.icon_url);
    assert_eq!(*rasterizer.calls.lock().unwrap(), 1);
}

#[test]
fn local_path_becomes_file_url() {
    let dir = tempfile::tempdir().unwrap();
    let icon = dir.path().join("app icon.png");
    fs::write(&icon, b"png").unwrap();
    let (cache, _) = cache_in(dir.path(), None);
    let mut resolver = IconResolver::new(cache);

    let mut draft = NotificationDraft::new("a", "b", "c").with_icon(icon.to_str().unwrap());
    resolver.modify(&mut draft);

    let expected = url::Url::from_file_path(&icon).unwrap().to_string();
    assert_eq!(draft.icon_url, expected);
    assert!(draft.icon_url.contains("%20"));

    // Already a URL: resolving again is stable.
    resolver.modify(&mut draft);
    assert_eq!(draft.icon_url, expected);
}

#[test]
fn image_path_hint_resolves_theme_names() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("mail.svg");
    fs::write(&source, b"<svg/>").unwrap();
    let (cache, rasterizer) = cache_in(&dir.path().join("cache"), Some(source));
    let mut resolver = IconResolver::new(cache);

    let mut draft = NotificationDraft::new("a", "b", "c")
        .with_hint("image-path", Hint::String("mail-unread".to_string()));
    resolver.modify(&mut draft);

    assert!(draft.icon_url.starts_with("file://"));
    assert!(draft.icon_url.contains("waynoted-cached_"));
    assert_eq!(*rasterizer.calls.lock().unwrap(), 1);
}

#[test]
fn unresolvable_icon_is_cleared() {
    let dir = tempfile::tempdir().unwrap();
    let (cache, _) = cache_in(dir.path(), None);
    let mut resolver = IconResolver::new(cache);

    let mut draft = NotificationDraft::new("a", "b", "c").with_icon("no-such-icon");
    resolver.modify(&mut draft);
    assert!(draft.icon_url.is_empty());
}

#[test]
fn broken_image_hint_falls_back_to_icon_string() {
    let dir = tempfile::tempdir().unwrap();
    let (cache, _) = cache_in(dir.path(), None);
    let mut resolver = IconResolver::new(cache);

    let mut draft = NotificationDraft::new("a", "b", "c")
        .with_icon("https://example.org/icon.png")
        .with_hint("image-data", Hint::Image(ImageData::rgba(8, 8, vec![0; 3])));
    resolver.modify(&mut draft);
    assert_eq!(draft.icon_url, "https://example.org/icon.png");
}

#[test]
fn legacy_icon_data_only_used_without_icon() {
    let dir = tempfile::tempdir().unwrap();
    let (cache, _) = cache_in(dir.path(), None);
    let mut resolver = IconResolver::new(cache);

    let mut draft = NotificationDraft::new("a", "b", "c")
        .with_hint("icon_data", Hint::Image(ImageData::rgba(1, 1, vec![0, 0, 0, 255])));
    resolver.modify(&mut draft);
    assert!(draft.icon_url.starts_with("file://"));
}

#[test]
fn disabled_stages_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let (cache, _) = cache_in(dir.path(), None);
    let config = ModifierConfig {
        pipeline: vec![ModifierKind::TextSanitizer],
        ..ModifierConfig::default()
    };
    let mut pipeline = Pipeline::with_icon_cache(&config, IdSequence::new(), cache);

    let notification =
        pipeline.run(NotificationDraft::new("Mail", "Mail", "a - b").with_timeout(-1));

    assert_eq!(pipeline.len(), 1);
    assert_eq!(notification.id, 0);
    assert_eq!(notification.title, "Mail");
    assert_eq!(notification.body, "a \u{2014} b");
    assert_eq!(notification.expire_timeout, ExpireTimeout::ServerDecides);
}
