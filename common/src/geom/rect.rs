use super::coord::TileCoord;

/// Inclusive rectangle of tile coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TileRect {
    pub min: TileCoord,
    pub max: TileCoord,
}

impl TileRect {
    pub fn new(min: TileCoord, max: TileCoord) -> Self {
        Self { min, max }
    }

    /// Smallest rectangle containing both coordinates.
    pub fn bounding(a: TileCoord, b: TileCoord) -> Self {
        Self {
            min: TileCoord::new(a.x.min(b.x), a.y.min(b.y)),
            max: TileCoord::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    /// Extent along x, as `max - min`.
    pub fn width(&self) -> u32 {
        self.min.x.abs_diff(self.max.x)
    }
    /// Extent along y, as `max - min`.
    pub fn height(&self) -> u32 {
        self.min.y.abs_diff(self.max.y)
    }

    pub fn expanded(&self, dx: i32, dy: i32) -> Self {
        Self {
            min: TileCoord::new(self.min.x.saturating_sub(dx), self.min.y.saturating_sub(dy)),
            max: TileCoord::new(self.max.x.saturating_add(dx), self.max.y.saturating_add(dy)),
        }
    }
}
