use super::coord::TileCoord;
use super::rect::TileRect;
use crate::db::indices::TileId;
use rstar::{AABB, RTree};

/// R-tree over tile coordinates, used for rectangular window queries.
pub struct SpatialIndex {
    tree: RTree<IndexedTile>,
}

struct IndexedTile {
    coord: TileCoord,
    id: TileId,
}

impl rstar::RTreeObject for IndexedTile {
    type Envelope = AABB<[i32; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.coord.x, self.coord.y])
    }
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self { tree: RTree::new() }
    }

    pub fn insert(&mut self, coord: TileCoord, id: TileId) {
        self.tree.insert(IndexedTile { coord, id });
    }

    /// Tiles inside `rect` (inclusive), sorted by id.
    pub fn query(&self, rect: TileRect) -> Vec<TileId> {
        let aabb = AABB::from_corners([rect.min.x, rect.min.y], [rect.max.x, rect.max.y]);
        let mut ids: Vec<TileId> = self
            .tree
            .locate_in_envelope(&aabb)
            .map(|item| item.id)
            .collect();
        ids.sort_unstable();
        ids
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_is_inclusive() {
        let mut index = SpatialIndex::new();
        let mut n = 0;
        for y in 0..4 {
            for x in 0..4 {
                index.insert(TileCoord::new(x, y), TileId::new(n));
                n += 1;
            }
        }
        let hits = index.query(TileRect::new(TileCoord::new(1, 1), TileCoord::new(2, 2)));
        assert_eq!(
            hits,
            vec![TileId::new(5), TileId::new(6), TileId::new(9), TileId::new(10)]
        );
        assert!(
            index
                .query(TileRect::new(TileCoord::new(10, 10), TileCoord::new(12, 12)))
                .is_empty()
        );
    }
}
