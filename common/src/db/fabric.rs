use crate::db::indices::*;
use crate::geom::coord::TileCoord;
use crate::geom::rect::TileRect;
use crate::geom::rtree::SpatialIndex;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum FabricError {
    #[error("duplicate tile name '{0}'")]
    DuplicateTile(String),
    #[error("tile '{name}' overlaps an existing tile at ({x}, {y})")]
    DuplicateCoord { name: String, x: i32, y: i32 },
    #[error("duplicate port '{port}' on tile '{tile}'")]
    DuplicatePort { tile: String, port: String },
    #[error("unknown tile '{0}'")]
    UnknownTile(String),
    #[error("unknown port '{port}' on tile '{tile}'")]
    UnknownPort { tile: String, port: String },
    #[error("wire cost {0} is not a finite non-negative number")]
    InvalidCost(f64),
}

/// Graph vertex identity: a port on a specific tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Location {
    pub tile: TileId,
    pub port: PortId,
}

impl Location {
    pub fn new(tile: TileId, port: PortId) -> Self {
        Self { tile, port }
    }
}

#[derive(Clone, Debug)]
pub struct TileData {
    pub name: String,
    pub coord: TileCoord,
    pub ports: Vec<PortId>,
    pub wires: Vec<WireId>,
}

#[derive(Clone, Debug)]
pub struct PortData {
    pub name: String,
    pub tile: TileId,
}

/// Directed, costed connection owned by `tile`, leaving through `from` and
/// arriving at `to_port` on `to_tile` (possibly a neighbour).
#[derive(Clone, Debug)]
pub struct WireData {
    pub tile: TileId,
    pub from: PortId,
    pub to_tile: TileId,
    pub to_port: PortId,
    pub cost: f64,
}

impl WireData {
    pub fn source(&self) -> Location {
        Location::new(self.tile, self.from)
    }
    pub fn destination(&self) -> Location {
        Location::new(self.to_tile, self.to_port)
    }
}

/// Read-mostly model of the routing fabric. The only mutable state after
/// loading is the per-wire blocked flag.
pub struct FabricDB {
    pub tiles: Vec<TileData>,
    pub ports: Vec<PortData>,
    pub wires: Vec<WireData>,
    blocked: Vec<bool>,

    tile_name_map: HashMap<String, TileId>,
    tile_coord_map: HashMap<TileCoord, TileId>,
    port_name_map: HashMap<(TileId, String), PortId>,
    spatial: SpatialIndex,
}

impl FabricDB {
    pub fn new() -> Self {
        Self {
            tiles: Vec::new(),
            ports: Vec::new(),
            wires: Vec::new(),
            blocked: Vec::new(),
            tile_name_map: HashMap::new(),
            tile_coord_map: HashMap::new(),
            port_name_map: HashMap::new(),
            spatial: SpatialIndex::new(),
        }
    }

    pub fn num_tiles(&self) -> usize {
        self.tiles.len()
    }
    pub fn num_ports(&self) -> usize {
        self.ports.len()
    }
    pub fn num_wires(&self) -> usize {
        self.wires.len()
    }

    pub fn add_tile(&mut self, name: &str, coord: TileCoord) -> Result<TileId, FabricError> {
        if self.tile_name_map.contains_key(name) {
            return Err(FabricError::DuplicateTile(name.to_string()));
        }
        if self.tile_coord_map.contains_key(&coord) {
            return Err(FabricError::DuplicateCoord {
                name: name.to_string(),
                x: coord.x,
                y: coord.y,
            });
        }
        let id = TileId::new(self.tiles.len());
        self.tiles.push(TileData {
            name: name.to_string(),
            coord,
            ports: Vec::new(),
            wires: Vec::new(),
        });
        self.tile_name_map.insert(name.to_string(), id);
        self.tile_coord_map.insert(coord, id);
        self.spatial.insert(coord, id);
        Ok(id)
    }

    pub fn add_port(&mut self, tile: TileId, name: &str) -> Result<PortId, FabricError> {
        let key = (tile, name.to_string());
        if self.port_name_map.contains_key(&key) {
            return Err(FabricError::DuplicatePort {
                tile: self.tiles[tile.index()].name.clone(),
                port: name.to_string(),
            });
        }
        let id = PortId::new(self.ports.len());
        self.ports.push(PortData {
            name: name.to_string(),
            tile,
        });
        self.tiles[tile.index()].ports.push(id);
        self.port_name_map.insert(key, id);
        Ok(id)
    }

    pub fn add_wire(
        &mut self,
        from: Location,
        to: Location,
        cost: f64,
    ) -> Result<WireId, FabricError> {
        if !cost.is_finite() || cost < 0.0 {
            return Err(FabricError::InvalidCost(cost));
        }
        let id = WireId::new(self.wires.len());
        self.wires.push(WireData {
            tile: from.tile,
            from: from.port,
            to_tile: to.tile,
            to_port: to.port,
            cost,
        });
        self.blocked.push(false);
        self.tiles[from.tile.index()].wires.push(id);
        Ok(id)
    }

    pub fn tile(&self, id: TileId) -> &TileData {
        &self.tiles[id.index()]
    }
    pub fn port(&self, id: PortId) -> &PortData {
        &self.ports[id.index()]
    }
    pub fn wire(&self, id: WireId) -> &WireData {
        &self.wires[id.index()]
    }

    pub fn tile_by_name(&self, name: &str) -> Option<TileId> {
        self.tile_name_map.get(name).copied()
    }

    pub fn tile_at(&self, coord: TileCoord) -> Option<TileId> {
        self.tile_coord_map.get(&coord).copied()
    }

    pub fn port_by_name(&self, tile: TileId, name: &str) -> Option<PortId> {
        self.port_name_map.get(&(tile, name.to_string())).copied()
    }

    /// Resolves `tile_name`/`port_name` into a location, reporting which
    /// half of the lookup failed.
    pub fn resolve_location(
        &self,
        tile_name: &str,
        port_name: &str,
    ) -> Result<Location, FabricError> {
        let tile = self
            .tile_by_name(tile_name)
            .ok_or_else(|| FabricError::UnknownTile(tile_name.to_string()))?;
        let port = self
            .port_by_name(tile, port_name)
            .ok_or_else(|| FabricError::UnknownPort {
                tile: tile_name.to_string(),
                port: port_name.to_string(),
            })?;
        Ok(Location::new(tile, port))
    }

    pub fn find_wire(&self, from: Location, to: Location) -> Option<WireId> {
        self.tiles[from.tile.index()]
            .wires
            .iter()
            .copied()
            .find(|&w| {
                let wire = &self.wires[w.index()];
                wire.from == from.port && wire.destination() == to
            })
    }

    pub fn tile_wires(&self, tile: TileId) -> impl Iterator<Item = (WireId, &WireData)> + '_ {
        self.tiles[tile.index()]
            .wires
            .iter()
            .map(move |&w| (w, &self.wires[w.index()]))
    }

    /// Wires of `tile` that routing may still use.
    pub fn usable_wires(&self, tile: TileId) -> impl Iterator<Item = (WireId, &WireData)> + '_ {
        self.tile_wires(tile)
            .filter(move |(w, _)| !self.blocked[w.index()])
    }

    pub fn tile_locations(&self, tile: TileId) -> impl Iterator<Item = Location> + '_ {
        self.tiles[tile.index()]
            .ports
            .iter()
            .map(move |&p| Location::new(tile, p))
    }

    pub fn is_blocked(&self, wire: WireId) -> bool {
        self.blocked[wire.index()]
    }

    /// Marks wires as consumed. Returns how many were not blocked before.
    pub fn block_wires(&mut self, wires: impl IntoIterator<Item = WireId>) -> usize {
        let mut newly_blocked = 0;
        for w in wires {
            let flag = &mut self.blocked[w.index()];
            if !*flag {
                *flag = true;
                newly_blocked += 1;
            }
        }
        newly_blocked
    }

    pub fn blocked_count(&self) -> usize {
        self.blocked.iter().filter(|&&b| b).count()
    }

    pub fn tiles_in_rect(&self, rect: TileRect) -> Vec<TileId> {
        self.spatial.query(rect)
    }

    /// Bounding rectangle of all tiles, `None` for an empty fabric.
    pub fn bounds(&self) -> Option<TileRect> {
        let first = self.tiles.first()?.coord;
        let mut rect = TileRect::new(first, first);
        for t in &self.tiles[1..] {
            rect.min.x = rect.min.x.min(t.coord.x);
            rect.min.y = rect.min.y.min(t.coord.y);
            rect.max.x = rect.max.x.max(t.coord.x);
            rect.max.y = rect.max.y.max(t.coord.y);
        }
        Some(rect)
    }

    pub fn location_name(&self, loc: Location) -> String {
        format!(
            "{}.{}",
            self.tiles[loc.tile.index()].name,
            self.ports[loc.port.index()].name
        )
    }
}

impl Default for FabricDB {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_tiles() -> (FabricDB, Location, Location) {
        let mut fabric = FabricDB::new();
        let a = fabric.add_tile("A", TileCoord::new(0, 0)).unwrap();
        let b = fabric.add_tile("B", TileCoord::new(1, 0)).unwrap();
        let pa = fabric.add_port(a, "E").unwrap();
        let pb = fabric.add_port(b, "W").unwrap();
        (fabric, Location::new(a, pa), Location::new(b, pb))
    }

    #[test]
    fn rejects_duplicates() {
        let (mut fabric, la, _) = two_tiles();
        assert_eq!(
            fabric.add_tile("A", TileCoord::new(5, 5)),
            Err(FabricError::DuplicateTile("A".into()))
        );
        assert!(matches!(
            fabric.add_tile("C", TileCoord::new(1, 0)),
            Err(FabricError::DuplicateCoord { .. })
        ));
        assert!(matches!(
            fabric.add_port(la.tile, "E"),
            Err(FabricError::DuplicatePort { .. })
        ));
    }

    #[test]
    fn rejects_bad_costs() {
        let (mut fabric, la, lb) = two_tiles();
        assert_eq!(
            fabric.add_wire(la, lb, -1.0),
            Err(FabricError::InvalidCost(-1.0))
        );
        assert!(fabric.add_wire(la, lb, f64::NAN).is_err());
        assert!(fabric.add_wire(la, lb, 0.0).is_ok());
    }

    #[test]
    fn blocked_wires_are_not_usable() {
        let (mut fabric, la, lb) = two_tiles();
        let w = fabric.add_wire(la, lb, 2.0).unwrap();
        assert_eq!(fabric.usable_wires(la.tile).count(), 1);
        assert_eq!(fabric.block_wires([w]), 1);
        assert_eq!(fabric.block_wires([w]), 0);
        assert!(fabric.is_blocked(w));
        assert_eq!(fabric.usable_wires(la.tile).count(), 0);
        assert_eq!(fabric.tile_wires(la.tile).count(), 1);
        assert_eq!(fabric.blocked_count(), 1);
    }

    #[test]
    fn lookups() {
        let (mut fabric, la, lb) = two_tiles();
        let w = fabric.add_wire(la, lb, 1.5).unwrap();
        assert_eq!(fabric.find_wire(la, lb), Some(w));
        assert_eq!(fabric.find_wire(lb, la), None);
        assert_eq!(fabric.resolve_location("B", "W"), Ok(lb));
        assert_eq!(
            fabric.resolve_location("B", "X"),
            Err(FabricError::UnknownPort {
                tile: "B".into(),
                port: "X".into()
            })
        );
        assert_eq!(fabric.location_name(la), "A.E");
        let bounds = fabric.bounds().unwrap();
        assert_eq!((bounds.min, bounds.max), (TileCoord::new(0, 0), TileCoord::new(1, 0)));
    }
}
