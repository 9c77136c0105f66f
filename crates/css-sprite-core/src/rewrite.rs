//! Generated stylesheet: one shared rule binding the atlas as background image,
//! then one `background-position` rule per placement.

use crate::model::{Atlas, PackedImage};
use crate::stylesheet::StyleBlock;
use tracing::debug;

/// True when a `background*` declaration of the block mentions `right`.
pub fn requests_right_alignment(block: &StyleBlock) -> bool {
    block
        .background_declarations()
        .any(|d| d.value.contains("right"))
}

/// Formats one axis of `background-position`. Atlas offsets are emitted negated
/// since the background moves up/left to expose the sub-image.
fn offset(v: u32) -> String {
    if v > 0 {
        format!("-{v}px")
    } else {
        "0px".to_string()
    }
}

/// `<selector>{ background-position: <h> <v>px; }` for one placement.
pub fn position_rule(image: &PackedImage) -> String {
    let selector = image.origin.selector.reconstruct();
    let horizontal = if image.x == 0 && requests_right_alignment(&image.origin) {
        "right".to_string()
    } else {
        offset(image.x)
    };
    format!(
        "{selector}{{ background-position: {horizontal} {}; }}",
        offset(image.y)
    )
}

/// Rule listing every sprited selector and binding the atlas as their background.
pub fn shared_rule(selectors: &[String], atlas_url: &str, background_color: &str) -> String {
    format!(
        "{} {{ background: {background_color} url({atlas_url}) no-repeat left top;}}",
        selectors.join(", ")
    )
}

/// Renders the whole generated stylesheet. Empty when nothing was packed.
pub fn render_stylesheet(atlas: &Atlas, atlas_url: &str, background_color: &str) -> String {
    if atlas.placements.is_empty() {
        return String::new();
    }
    let selectors: Vec<String> = atlas
        .placements
        .iter()
        .map(|p| p.origin.selector.reconstruct())
        .collect();
    let shared = shared_rule(&selectors, atlas_url, background_color);
    debug!("{shared}");

    let mut out = shared;
    out.push('\n');
    for p in &atlas.placements {
        let rule = position_rule(p);
        debug!("{rule}");
        out.push_str(&rule);
        out.push('\n');
    }
    out.push('\n');
    out
}
