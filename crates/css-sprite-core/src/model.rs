use crate::stylesheet::StyleBlock;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// A decoded source image. Never mutated after load.
#[derive(Debug, Clone)]
pub struct ImageAsset {
    pub source_path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub pixels: RgbaImage,
}

impl ImageAsset {
    pub fn new(source_path: impl Into<PathBuf>, pixels: RgbaImage) -> Self {
        let (width, height) = pixels.dimensions();
        Self {
            source_path: source_path.into(),
            width,
            height,
            pixels,
        }
    }
}

/// An image and the rule that referenced it, plus its origin in the atlas.
/// `x`/`y` stay `(0, 0)` until the packer assigns them.
#[derive(Debug, Clone)]
pub struct PackedImage {
    pub asset: ImageAsset,
    pub origin: StyleBlock,
    pub x: u32,
    pub y: u32,
}

impl PackedImage {
    pub fn new(asset: ImageAsset, origin: StyleBlock) -> Self {
        Self {
            asset,
            origin,
            x: 0,
            y: 0,
        }
    }

    pub fn key(&self) -> &Path {
        &self.asset.source_path
    }
}

/// Per-run arena of packing candidates, one per resolved source path, in
/// discovery order.
#[derive(Debug, Default)]
pub struct SpriteSet {
    images: Vec<PackedImage>,
    index: HashMap<PathBuf, usize>,
}

impl SpriteSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.index.contains_key(path)
    }

    /// Inserts a candidate unless its path is already known. Returns whether it was added.
    pub fn insert(&mut self, image: PackedImage) -> bool {
        if self.contains(image.key()) {
            return false;
        }
        self.index
            .insert(image.key().to_path_buf(), self.images.len());
        self.images.push(image);
        true
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn into_vec(self) -> Vec<PackedImage> {
        self.images
    }
}

/// Result of packing: atlas size and placements in packing order.
#[derive(Debug, Clone, Default)]
pub struct Atlas {
    pub width: u32,
    pub height: u32,
    pub placements: Vec<PackedImage>,
}

impl Atlas {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Computes packing statistics for this atlas.
    pub fn stats(&self) -> SpriteStats {
        let atlas_area = (self.width as u64) * (self.height as u64);
        let used_area: u64 = self
            .placements
            .iter()
            .map(|p| (p.asset.width as u64) * (p.asset.height as u64))
            .sum();
        let occupancy = if atlas_area > 0 {
            used_area as f64 / atlas_area as f64
        } else {
            0.0
        };
        SpriteStats {
            num_images: self.placements.len(),
            width: self.width,
            height: self.height,
            atlas_area,
            used_area,
            occupancy,
        }
    }
}

/// Statistics about atlas packing efficiency.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SpriteStats {
    pub num_images: usize,
    pub width: u32,
    pub height: u32,
    pub atlas_area: u64,
    /// Sum of image areas. May exceed `atlas_area` when legacy rows overlap.
    pub used_area: u64,
    pub occupancy: f64,
}

impl SpriteStats {
    /// Returns a human-readable summary of the statistics.
    pub fn summary(&self) -> String {
        format!(
            "Images: {}, Atlas: {}x{}, Occupancy: {:.2}%, Used Area: {} px²",
            self.num_images,
            self.width,
            self.height,
            self.occupancy * 100.0,
            self.used_area,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::SelectorNode;

    fn candidate(path: &str, class: &str) -> PackedImage {
        PackedImage::new(
            ImageAsset::new(path, RgbaImage::new(4, 4)),
            StyleBlock::new(SelectorNode::ClassName(class.into()), vec![]),
        )
    }

    #[test]
    fn sprite_set_keeps_first_owner_in_discovery_order() {
        let mut set = SpriteSet::new();
        assert!(set.insert(candidate("/a.png", "one")));
        assert!(set.insert(candidate("/b.png", "two")));
        assert!(!set.insert(candidate("/a.png", "three")));
        assert_eq!(set.len(), 2);
        assert!(set.contains(Path::new("/b.png")));

        let owners: Vec<String> = set
            .into_vec()
            .into_iter()
            .map(|p| p.origin.selector.reconstruct())
            .collect();
        assert_eq!(owners, vec![".one ", ".two "]);
    }
}
