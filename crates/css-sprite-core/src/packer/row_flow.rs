use crate::config::RowHeightPolicy;

/// Row-flow layout: images go left to right until the row reaches the atlas width,
/// then the cursor wraps below.
///
/// The atlas width is fixed up front (the widest image). An image whose right edge
/// reaches the atlas width still goes in the current row and closes it.
#[derive(Debug, Clone)]
pub struct RowFlowPacker {
    width: u32,
    policy: RowHeightPolicy,
    cursor_x: u32,
    cursor_y: u32,
    height: u32,
    row_height: u32,
}

impl RowFlowPacker {
    pub fn new(width: u32, policy: RowHeightPolicy) -> Self {
        Self {
            width,
            policy,
            cursor_x: 0,
            cursor_y: 0,
            height: 0,
            row_height: 0,
        }
    }

    /// Places a `w`×`h` image and returns its origin.
    pub fn place(&mut self, w: u32, h: u32) -> (u32, u32) {
        let origin = (self.cursor_x, self.cursor_y);
        match self.policy {
            RowHeightPolicy::LastPlaced => {
                if self.cursor_x + w < self.width {
                    self.cursor_x += w;
                    // bottom of the row comes from the last image placed in it
                    self.height = self.cursor_y + h;
                } else {
                    self.cursor_x = 0;
                    self.cursor_y += h;
                }
            }
            RowHeightPolicy::Tallest => {
                self.row_height = self.row_height.max(h);
                self.height = self.height.max(self.cursor_y + h);
                if self.cursor_x + w < self.width {
                    self.cursor_x += w;
                } else {
                    self.cursor_x = 0;
                    self.cursor_y += self.row_height;
                    self.row_height = 0;
                }
            }
        }
        origin
    }

    /// Atlas `(width, height)` for everything placed so far.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
