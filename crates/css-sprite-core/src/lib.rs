//! Core library for building CSS sprites.
//!
//! - Scanner: finds `url(...)` PNG references in `background*` declarations of a stylesheet
//! - Packer: row-flow layout, widest image first, deterministic
//! - Compositing: draws every image onto one RGBA atlas and encodes it as PNG
//! - Rewrite: emits one shared `background` rule plus a `background-position` rule per image
//! - Pipeline: `run` does all of the above once and replaces the two artifacts on disk
//!
//! Quick example:
//! ```ignore
//! use css_sprite_core::{SpriteConfig, run};
//! # fn main() -> anyhow::Result<()> {
//! let cfg = SpriteConfig::builder().app_root("/srv/app").build();
//! let report = run(&cfg)?;
//! println!("{} images, atlas {:?}", report.placements, report.atlas_size);
//! # Ok(()) }
//! ```

pub mod compositing;
pub mod config;
pub mod error;
pub mod export;
pub mod loader;
pub mod model;
pub mod packer;
pub mod pipeline;
pub mod rewrite;
pub mod scanner;
pub mod selector;
pub mod stylesheet;

pub use config::*;
pub use error::*;
pub use export::*;
pub use loader::*;
pub use model::*;
pub use packer::*;
pub use pipeline::*;
pub use selector::*;
pub use stylesheet::*;

/// Convenience prelude for common types and functions.
/// Importing `css_sprite_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::config::{RowHeightPolicy, SpriteConfig, SpriteConfigBuilder};
    pub use crate::loader::{AssetLoader, FsLoader};
    pub use crate::model::{Atlas, ImageAsset, PackedImage, SpriteSet, SpriteStats};
    pub use crate::selector::SelectorNode;
    pub use crate::stylesheet::{Declaration, StyleBlock, Stylesheet, parse_selector, parse_stylesheet};
    pub use crate::{
        ArtifactOutcome, RunReport, SpriteError, SpriteOutput, build_sprite, pack_sprites, run,
        run_with_loader,
    };
}
