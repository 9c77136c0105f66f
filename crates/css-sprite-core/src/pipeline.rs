use crate::compositing::{compose_atlas, encode_png};
use crate::config::SpriteConfig;
use crate::error::{Result, SpriteError};
use crate::loader::{AssetLoader, FsLoader};
use crate::model::Atlas;
use crate::packer::pack_sprites;
use crate::rewrite::render_stylesheet;
use crate::scanner::scan_stylesheet;
use crate::stylesheet::{Stylesheet, parse_stylesheet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// In-memory result of one sprite build.
pub struct SpriteOutput {
    pub atlas: Atlas,
    /// PNG bytes of the atlas. `None` when the atlas has no area or encoding failed.
    pub png: Option<Vec<u8>>,
    /// Generated stylesheet text (empty when nothing was packed).
    pub css: String,
    /// Compositing stopped early; `png` holds whatever was drawn before it.
    pub blit_error: Option<SpriteError>,
    pub encode_error: Option<SpriteError>,
}

/// What happened to one destination file.
#[derive(Debug)]
pub enum ArtifactOutcome {
    Written(PathBuf),
    /// Nothing to write (zero-area atlas); any previous file was removed.
    Skipped(PathBuf),
    Failed(SpriteError),
}

impl ArtifactOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, ArtifactOutcome::Written(_))
    }
}

/// Summary of a run.
#[derive(Debug)]
pub struct RunReport {
    pub atlas_size: (u32, u32),
    pub placements: usize,
    pub image: ArtifactOutcome,
    pub stylesheet: ArtifactOutcome,
    /// Compositing stopped early; the written atlas is partial.
    pub blit_error: Option<SpriteError>,
}

impl RunReport {
    /// Images were packed but no atlas file backs the generated stylesheet.
    pub fn atlas_missing(&self) -> bool {
        self.placements > 0 && !self.image.is_written()
    }
}

#[instrument(skip_all)]
/// Scans `sheet`, packs the referenced images and renders both artifacts in memory.
///
/// Output is deterministic: the same stylesheet and images give byte-identical PNG
/// and CSS.
pub fn build_sprite(sheet: &Stylesheet, loader: &dyn AssetLoader, cfg: &SpriteConfig) -> SpriteOutput {
    let set = scan_stylesheet(sheet, &cfg.app_root, loader);
    info!(count = set.len(), "collected background images");
    let atlas = pack_sprites(set, cfg.row_height);
    info!(width = atlas.width, height = atlas.height, "packed atlas");

    let (png, blit_error, encode_error) = if atlas.is_empty() {
        (None, None, None)
    } else {
        let composed = compose_atlas(&atlas);
        match encode_png(&composed.canvas) {
            Ok(bytes) => (Some(bytes), composed.error, None),
            Err(e) => (None, composed.error, Some(e)),
        }
    };
    let css = render_stylesheet(&atlas, &cfg.atlas_url(), &cfg.background_color);
    SpriteOutput {
        atlas,
        png,
        css,
        blit_error,
        encode_error,
    }
}

#[instrument(skip_all)]
/// Runs the whole job once: read and parse the stylesheet, build the sprite, and
/// replace the atlas image and the generated stylesheet under `app_root`.
///
/// Only configuration, read and parse errors abort the run. Per-image failures are
/// logged and skipped; a failure writing one artifact does not prevent the other.
pub fn run(cfg: &SpriteConfig) -> Result<RunReport> {
    run_with_loader(cfg, &FsLoader)
}

/// [`run`] with a custom image loader.
pub fn run_with_loader(cfg: &SpriteConfig, loader: &dyn AssetLoader) -> Result<RunReport> {
    cfg.validate()?;
    let css_path = cfg.stylesheet_path();
    info!(?css_path, "building sprite");
    let text = fs::read_to_string(&css_path)?;
    let sheet = parse_stylesheet(&text)?;
    debug!(blocks = sheet.blocks.len(), "parsed stylesheet");

    let out = build_sprite(&sheet, loader, cfg);
    if let Some(e) = &out.blit_error {
        warn!(error = %e, "atlas is incomplete");
    }

    let image_dest = cfg.image_destination();
    remove_previous(&image_dest);
    let image = match (&out.png, out.encode_error) {
        (Some(bytes), _) => write_artifact(&image_dest, bytes),
        (None, Some(e)) => {
            warn!(error = %e, "atlas not encoded");
            ArtifactOutcome::Failed(e)
        }
        (None, None) if out.atlas.placements.is_empty() => {
            info!(path = ?image_dest, "atlas is empty, no image written");
            ArtifactOutcome::Skipped(image_dest)
        }
        (None, None) => {
            warn!(
                path = ?image_dest,
                width = out.atlas.width,
                height = out.atlas.height,
                "atlas has no area, generated stylesheet references a missing image"
            );
            ArtifactOutcome::Skipped(image_dest)
        }
    };

    let css_dest = cfg.css_destination();
    remove_previous(&css_dest);
    let stylesheet = write_artifact(&css_dest, out.css.as_bytes());

    let stats = out.atlas.stats();
    info!("{}", stats.summary());
    Ok(RunReport {
        atlas_size: (out.atlas.width, out.atlas.height),
        placements: out.atlas.placements.len(),
        image,
        stylesheet,
        blit_error: out.blit_error,
    })
}

fn remove_previous(path: &Path) {
    if !path.exists() {
        return;
    }
    debug!(?path, "removing previous artifact");
    if let Err(e) = fs::remove_file(path) {
        warn!(?path, error = %e, "cannot remove previous artifact");
    }
}

fn write_artifact(path: &Path, bytes: &[u8]) -> ArtifactOutcome {
    let result = path
        .parent()
        .map_or(Ok(()), fs::create_dir_all)
        .and_then(|_| fs::write(path, bytes));
    match result {
        Ok(()) => {
            info!(?path, bytes = bytes.len(), "artifact written");
            ArtifactOutcome::Written(path.to_path_buf())
        }
        Err(source) => {
            let e = SpriteError::Write {
                path: path.to_path_buf(),
                source,
            };
            warn!(error = %e, "artifact not written");
            ArtifactOutcome::Failed(e)
        }
    }
}
