use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// How the row-flow packer accounts for row heights.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RowHeightPolicy {
    /// Historical behaviour: a row's bottom is taken from the last image placed in it,
    /// and wrapping advances by the wrapping image's height. Output is byte-compatible
    /// with sprites generated by earlier versions, but tall images may overlap the next row.
    #[default]
    LastPlaced,
    /// A row advances by its tallest image and the atlas height covers every placement.
    Tallest,
}

impl FromStr for RowHeightPolicy {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "last_placed" | "legacy" => Ok(Self::LastPlaced),
            "tallest" | "max" => Ok(Self::Tallest),
            _ => Err(()),
        }
    }
}

/// Where to read the stylesheet from, where to write the two artifacts, and how to pack.
///
/// All relative paths are resolved against `app_root`, which is also the root that
/// `url(...)` references inside the stylesheet are resolved against.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpriteConfig {
    /// Application root (static asset root).
    pub app_root: PathBuf,
    /// Input stylesheet, relative to `app_root`.
    pub stylesheet: PathBuf,
    /// Directory receiving the atlas image, relative to `app_root`.
    pub image_dir: PathBuf,
    /// Directory receiving the generated stylesheet, relative to `app_root`.
    pub css_dir: PathBuf,
    /// Base file name of both artifacts (`<name>.png`, `<name>.css`).
    pub sprite_name: String,
    /// URL of the atlas as written in the generated stylesheet.
    /// `None` derives `/<image_dir>/<sprite_name>.png`.
    #[serde(default)]
    pub sprite_url: Option<String>,
    /// Fallback color of the shared background rule.
    #[serde(default = "default_background_color")]
    pub background_color: String,
    #[serde(default)]
    pub row_height: RowHeightPolicy,
}

impl Default for SpriteConfig {
    fn default() -> Self {
        Self {
            app_root: PathBuf::from("."),
            stylesheet: PathBuf::from("public/stylesheets/main.css"),
            image_dir: PathBuf::from("public/images"),
            css_dir: PathBuf::from("public/stylesheets"),
            sprite_name: "play-sprite".to_string(),
            sprite_url: None,
            background_color: default_background_color(),
            row_height: RowHeightPolicy::default(),
        }
    }
}

fn default_background_color() -> String {
    "white".to_string()
}

impl SpriteConfig {
    /// Validates the configuration parameters.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::SpriteError;

        if self.sprite_name.trim().is_empty() {
            return Err(SpriteError::InvalidConfig(
                "sprite_name must not be empty".into(),
            ));
        }
        if self.sprite_name.contains(['/', '\\']) {
            return Err(SpriteError::InvalidConfig(format!(
                "sprite_name must be a bare file name, got '{}'",
                self.sprite_name
            )));
        }
        if self.background_color.trim().is_empty() {
            return Err(SpriteError::InvalidConfig(
                "background_color must not be empty".into(),
            ));
        }
        Ok(())
    }

    pub fn stylesheet_path(&self) -> PathBuf {
        self.app_root.join(&self.stylesheet)
    }

    pub fn image_destination(&self) -> PathBuf {
        self.app_root
            .join(&self.image_dir)
            .join(format!("{}.png", self.sprite_name))
    }

    pub fn css_destination(&self) -> PathBuf {
        self.app_root
            .join(&self.css_dir)
            .join(format!("{}.css", self.sprite_name))
    }

    /// URL of the atlas as referenced from the generated stylesheet.
    pub fn atlas_url(&self) -> String {
        match &self.sprite_url {
            Some(url) => url.clone(),
            None => {
                let dir = url_path(&self.image_dir);
                if dir.is_empty() {
                    format!("/{}.png", self.sprite_name)
                } else {
                    format!("/{}/{}.png", dir, self.sprite_name)
                }
            }
        }
    }
}

fn url_path(p: &Path) -> String {
    p.components()
        .filter_map(|c| c.as_os_str().to_str())
        .filter(|s| *s != "." && *s != "/")
        .collect::<Vec<_>>()
        .join("/")
}

/// Builder for `SpriteConfig` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct SpriteConfigBuilder {
    cfg: SpriteConfig,
}

impl SpriteConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: SpriteConfig::default(),
        }
    }
    pub fn app_root(mut self, v: impl Into<PathBuf>) -> Self {
        self.cfg.app_root = v.into();
        self
    }
    pub fn stylesheet(mut self, v: impl Into<PathBuf>) -> Self {
        self.cfg.stylesheet = v.into();
        self
    }
    pub fn image_dir(mut self, v: impl Into<PathBuf>) -> Self {
        self.cfg.image_dir = v.into();
        self
    }
    pub fn css_dir(mut self, v: impl Into<PathBuf>) -> Self {
        self.cfg.css_dir = v.into();
        self
    }
    pub fn sprite_name(mut self, v: impl Into<String>) -> Self {
        self.cfg.sprite_name = v.into();
        self
    }
    pub fn sprite_url(mut self, v: Option<String>) -> Self {
        self.cfg.sprite_url = v;
        self
    }
    pub fn background_color(mut self, v: impl Into<String>) -> Self {
        self.cfg.background_color = v.into();
        self
    }
    pub fn row_height(mut self, v: RowHeightPolicy) -> Self {
        self.cfg.row_height = v;
        self
    }
    pub fn build(self) -> SpriteConfig {
        self.cfg
    }
}

impl SpriteConfig {
    /// Create a fluent builder for `SpriteConfig`.
    pub fn builder() -> SpriteConfigBuilder {
        SpriteConfigBuilder::new()
    }
}
