use crate::db::fabric::{FabricDB, Location};
use crate::db::indices::TileId;
use crate::geom::rect::TileRect;
use std::collections::BTreeSet;

/// The set of tiles currently eligible for routing-graph construction.
///
/// Tiles are kept ordered so every scan over the window visits them in the
/// same sequence. The window only ever grows.
#[derive(Clone, Debug)]
pub struct SelectionWindow {
    tiles: BTreeSet<TileId>,
    expand_margin: i32,
}

impl SelectionWindow {
    pub fn new(expand_margin: i32) -> Self {
        Self {
            tiles: BTreeSet::new(),
            expand_margin: expand_margin.max(0),
        }
    }

    pub fn expand_margin(&self) -> i32 {
        self.expand_margin
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn contains_tile(&self, tile: TileId) -> bool {
        self.tiles.contains(&tile)
    }

    pub fn contains(&self, loc: &Location) -> bool {
        self.tiles.contains(&loc.tile)
    }

    pub fn tiles(&self) -> impl Iterator<Item = TileId> + '_ {
        self.tiles.iter().copied()
    }

    /// Every port location on every selected tile.
    pub fn locations(&self, fabric: &FabricDB) -> Vec<Location> {
        self.tiles
            .iter()
            .flat_map(|&t| fabric.tile_locations(t))
            .collect()
    }

    pub fn add_tile(&mut self, tile: TileId) -> bool {
        self.tiles.insert(tile)
    }

    /// Adds every fabric tile inside `rect`. Returns the number of new tiles.
    pub fn add_region(&mut self, fabric: &FabricDB, rect: TileRect) -> usize {
        let before = self.tiles.len();
        self.tiles.extend(fabric.tiles_in_rect(rect));
        let added = self.tiles.len() - before;
        log::debug!(
            "Selection: add region ({}, {})..({}, {}) -> +{} tiles",
            rect.min.x,
            rect.min.y,
            rect.max.x,
            rect.max.y,
            added
        );
        added
    }

    /// Grows the window by `expand_margin` tiles around its current contents.
    pub fn expand(&mut self, fabric: &FabricDB) -> usize {
        if self.expand_margin == 0 || self.tiles.is_empty() {
            return 0;
        }
        let m = self.expand_margin;
        let grown: Vec<TileId> = self
            .tiles
            .iter()
            .flat_map(|&t| {
                let c = fabric.tile(t).coord;
                fabric.tiles_in_rect(TileRect::new(c, c).expanded(m, m))
            })
            .collect();

        let before = self.tiles.len();
        self.tiles.extend(grown);
        let added = self.tiles.len() - before;
        log::debug!("Selection: expand by {} -> +{} tiles", m, added);
        added
    }
}

impl Default for SelectionWindow {
    fn default() -> Self {
        Self::new(1)
    }
}
