use crate::loader::AssetLoader;
use crate::model::{PackedImage, SpriteSet};
use crate::stylesheet::Stylesheet;
use regex::Regex;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, trace, warn};

static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"url\(\s*['"]?([^'")]*)['"]?\s*\)"#).expect("static url pattern")
});

/// Returns the URL of the last `url(...)` in a declaration value.
///
/// Quotes are optional on either side. When a value carries several URLs (layered
/// backgrounds) the last one is the one that gets sprited. Blank URLs yield `None`.
pub fn extract_background_url(value: &str) -> Option<&str> {
    URL_PATTERN
        .captures_iter(value)
        .last()
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|url| !url.is_empty())
}

/// Resolves a stylesheet URL against the asset root, lexically (no filesystem access).
pub fn resolve_asset_path(root: &Path, url: &str) -> PathBuf {
    let mut out = root.to_path_buf();
    for component in Path::new(url.trim_start_matches(['/', '\\'])).components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::ParentDir => {
                out.pop();
            }
            _ => {}
        }
    }
    out
}

fn is_sprite_candidate(path: &Path) -> bool {
    path.to_str().is_some_and(|s| s.ends_with(".png"))
}

/// Collects every PNG referenced from a `background*` declaration, keyed by resolved
/// path. The first block that references a path owns it. Images that fail to load are
/// logged and left out.
pub fn scan_stylesheet(sheet: &Stylesheet, root: &Path, loader: &dyn AssetLoader) -> SpriteSet {
    let mut set = SpriteSet::new();
    for block in &sheet.blocks {
        for decl in block.background_declarations() {
            let Some(url) = extract_background_url(&decl.value) else {
                continue;
            };
            let path = resolve_asset_path(root, url);
            if !is_sprite_candidate(&path) {
                trace!(url, "skip non-png background");
                continue;
            }
            if set.contains(&path) {
                trace!(?path, "already collected");
                continue;
            }
            match loader.load(&path) {
                Ok(asset) => {
                    debug!(?path, w = asset.width, h = asset.height, "collected background");
                    set.insert(PackedImage::new(asset, block.clone()));
                }
                Err(e) => {
                    warn!(?path, error = %e, "skip background image");
                }
            }
        }
    }
    set
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_quotes_are_optional() {
        assert_eq!(extract_background_url("url('/a.png')"), Some("/a.png"));
        assert_eq!(extract_background_url("url(\"/a.png\") no-repeat"), Some("/a.png"));
        assert_eq!(extract_background_url("#fff url(/a.png) right top"), Some("/a.png"));
        assert_eq!(extract_background_url("url( b.png )"), Some("b.png"));
        assert_eq!(extract_background_url("none"), None);
        assert_eq!(extract_background_url("url('')"), None);
    }

    #[test]
    fn last_url_wins() {
        assert_eq!(
            extract_background_url("url(/first.png), url('/second.png')"),
            Some("/second.png")
        );
    }

    #[test]
    fn resolves_relative_to_root() {
        let root = Path::new("/srv/app");
        assert_eq!(
            resolve_asset_path(root, "/public/images/a.png"),
            PathBuf::from("/srv/app/public/images/a.png")
        );
        assert_eq!(
            resolve_asset_path(root, "public/./images/../img/b.png"),
            PathBuf::from("/srv/app/public/img/b.png")
        );
    }

    #[test]
    fn only_png_is_a_candidate() {
        assert!(is_sprite_candidate(Path::new("/x/a.png")));
        assert!(!is_sprite_candidate(Path::new("/x/a.gif")));
        assert!(!is_sprite_candidate(Path::new("/x/a.PNG")));
    }
}
