use crate::config::RowHeightPolicy;
use crate::model::{Atlas, SpriteSet};
use tracing::debug;

pub mod row_flow;

pub use row_flow::RowFlowPacker;

/// Orders candidates for packing: widest first, ties in discovery order.
pub fn sort_for_packing<T>(items: &mut [T], width: impl Fn(&T) -> u32) {
    items.sort_by(|a, b| width(b).cmp(&width(a)));
}

/// Lays out every candidate of `set` and returns the atlas with its placements
/// in packing order.
pub fn pack_sprites(set: SpriteSet, policy: RowHeightPolicy) -> Atlas {
    let mut placements = set.into_vec();
    sort_for_packing(&mut placements, |p| p.asset.width);

    let atlas_width = placements.first().map_or(0, |p| p.asset.width);
    let mut packer = RowFlowPacker::new(atlas_width, policy);
    for p in placements.iter_mut() {
        let (x, y) = packer.place(p.asset.width, p.asset.height);
        p.x = x;
        p.y = y;
        debug!(path = ?p.asset.source_path, x, y, "placed");
    }
    let (width, height) = packer.size();
    debug!(width, height, "atlas size");
    Atlas {
        width,
        height,
        placements,
    }
}
