use crate::error::{Result, SpriteError};
use crate::model::Atlas;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, Rgba, RgbaImage};
use tracing::{debug, warn};

/// Canvas produced by [`compose_atlas`]. `error` is set when compositing stopped
/// early; the canvas then holds every image drawn before the failure.
pub struct ComposedAtlas {
    pub canvas: RgbaImage,
    pub error: Option<SpriteError>,
}

/// Draw `src` onto `canvas` with its top-left at (dx, dy), source-over, clipped to the canvas.
pub fn blit_rgba(src: &RgbaImage, canvas: &mut RgbaImage, dx: u32, dy: u32) {
    let (cw, ch) = canvas.dimensions();
    let (sw, sh) = src.dimensions();
    for yy in 0..sh {
        if dy + yy >= ch {
            break;
        }
        for xx in 0..sw {
            if dx + xx >= cw {
                break;
            }
            let s = *src.get_pixel(xx, yy);
            let d = canvas.get_pixel_mut(dx + xx, dy + yy);
            *d = source_over(s, *d);
        }
    }
}

fn source_over(s: Rgba<u8>, d: Rgba<u8>) -> Rgba<u8> {
    let sa = s[3] as u32;
    if sa == 255 {
        return s;
    }
    if sa == 0 {
        return d;
    }
    let da = d[3] as u32 * (255 - sa) / 255;
    let out_a = sa + da;
    let mut out = [0u8; 4];
    for c in 0..3 {
        out[c] = ((s[c] as u32 * sa + d[c] as u32 * da + out_a / 2) / out_a) as u8;
    }
    out[3] = out_a as u8;
    Rgba(out)
}

/// Draws every placement onto a transparent canvas of the atlas size, in packing order.
///
/// A placement whose raster does not match its recorded size stops compositing;
/// the remaining placements are skipped.
pub fn compose_atlas(atlas: &Atlas) -> ComposedAtlas {
    let mut canvas = RgbaImage::new(atlas.width, atlas.height);
    for p in &atlas.placements {
        let asset = &p.asset;
        if asset.pixels.dimensions() != (asset.width, asset.height) {
            let (rw, rh) = asset.pixels.dimensions();
            let error = SpriteError::Blit {
                path: asset.source_path.clone(),
                reason: format!(
                    "raster is {}x{} but image is recorded as {}x{}",
                    rw, rh, asset.width, asset.height
                ),
            };
            warn!(error = %error, "stop compositing");
            return ComposedAtlas {
                canvas,
                error: Some(error),
            };
        }
        if p.x + asset.width > atlas.width || p.y + asset.height > atlas.height {
            debug!(path = ?asset.source_path, x = p.x, y = p.y, "image clipped at atlas edge");
        }
        blit_rgba(&asset.pixels, &mut canvas, p.x, p.y);
    }
    ComposedAtlas {
        canvas,
        error: None,
    }
}

/// Encodes the canvas as PNG.
pub fn encode_png(canvas: &RgbaImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let (w, h) = canvas.dimensions();
    PngEncoder::new(&mut buf).write_image(canvas.as_raw(), w, h, ExtendedColorType::Rgba8)?;
    Ok(buf)
}
