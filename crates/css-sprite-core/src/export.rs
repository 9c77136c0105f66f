use crate::model::Atlas;
use serde_json::{Value, json};

/// Serialize the atlas layout as `{ width, height, placements: [...] }`.
/// Each placement carries its source path, reconstructed selector, frame and the
/// `background-position` rule that addresses it.
pub fn to_json_layout(atlas: &Atlas, atlas_url: &str) -> Value {
    let placements: Vec<Value> = atlas
        .placements
        .iter()
        .map(|p| {
            json!({
                "source": p.asset.source_path.to_string_lossy().replace('\\', "/"),
                "selector": p.origin.selector.reconstruct(),
                "frame": {"x": p.x, "y": p.y, "w": p.asset.width, "h": p.asset.height},
                "rule": crate::rewrite::position_rule(p),
            })
        })
        .collect();
    json!({
        "image": atlas_url,
        "width": atlas.width,
        "height": atlas.height,
        "placements": placements,
        "stats": atlas.stats(),
    })
}
