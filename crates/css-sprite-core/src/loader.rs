use crate::error::{Result, SpriteError};
use crate::model::ImageAsset;
use image::ImageReader;
use std::path::Path;

/// Decodes referenced images. The scanner calls it once per distinct path.
pub trait AssetLoader {
    fn load(&self, path: &Path) -> Result<ImageAsset>;
}

/// Reads and decodes images from disk into RGBA8.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsLoader;

impl AssetLoader for FsLoader {
    fn load(&self, path: &Path) -> Result<ImageAsset> {
        let decoded = ImageReader::open(path)
            .map_err(|e| SpriteError::Decode {
                path: path.to_path_buf(),
                source: image::ImageError::IoError(e),
            })?
            .with_guessed_format()
            .map_err(|e| SpriteError::Decode {
                path: path.to_path_buf(),
                source: image::ImageError::IoError(e),
            })?
            .decode()
            .map_err(|source| SpriteError::Decode {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(ImageAsset::new(path, decoded.to_rgba8()))
    }
}
