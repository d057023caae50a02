//! Weighted directed graph of fabric locations.
//!
//! A graph is built from the current selection window for one
//! (start, target) pair, searched once and dropped.

use crate::context::RouteContext;
use fpga_common::db::fabric::Location;
use fpga_common::db::indices::WireId;
use rayon::prelude::*;
use std::collections::HashMap;

/// Opaque key of a graph vertex.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline(always)]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Edge {
    pub to: NodeId,
    pub cost: f64,
    pub wire: WireId,
}

pub struct RoutingGraph {
    nodes: Vec<Location>,
    index: HashMap<Location, NodeId>,
    edges: Vec<Vec<Edge>>,
    num_edges: usize,
}

type TileScan = (Vec<Location>, Vec<(Location, Location, f64, WireId)>);

impl RoutingGraph {
    /// Empty graph holding only the two endpoints.
    pub fn new(start: Location, target: Location) -> Self {
        let mut graph = Self {
            nodes: Vec::new(),
            index: HashMap::new(),
            edges: Vec::new(),
            num_edges: 0,
        };
        graph.add_node(start);
        graph.add_node(target);
        graph
    }

    /// Builds the graph over every tile of the selection window. Blocked
    /// wires are never turned into edges.
    pub fn build(ctx: &RouteContext, start: Location, target: Location) -> Self {
        let mut graph = Self::new(start, target);
        let fabric = &ctx.fabric;

        let tiles: Vec<_> = ctx.selection.tiles().collect();
        let scanned: Vec<TileScan> = tiles
            .par_iter()
            .map(|&tile| {
                let locations = fabric.tile_locations(tile).collect();
                let wires = fabric
                    .usable_wires(tile)
                    .map(|(id, w)| (w.source(), w.destination(), w.cost, id))
                    .collect();
                (locations, wires)
            })
            .collect();

        // Sequential insertion in tile order keeps node numbering stable.
        for (locations, wires) in scanned {
            for loc in locations {
                graph.add_node(loc);
            }
            for (from, to, cost, wire) in wires {
                let a = graph.add_node(from);
                let b = graph.add_node(to);
                graph.connect(a, b, cost, wire);
            }
        }

        log::debug!(
            "Routing graph: {} nodes, {} edges over {} tiles",
            graph.num_nodes(),
            graph.num_edges(),
            tiles.len()
        );
        graph
    }

    /// Returns the existing key for `loc` or inserts a new node.
    pub fn add_node(&mut self, loc: Location) -> NodeId {
        if let Some(&id) = self.index.get(&loc) {
            return id;
        }
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(loc);
        self.edges.push(Vec::new());
        self.index.insert(loc, id);
        id
    }

    pub fn connect(&mut self, from: NodeId, to: NodeId, cost: f64, wire: WireId) {
        debug_assert!(cost >= 0.0, "negative edge weight");
        self.edges[from.index()].push(Edge { to, cost, wire });
        self.num_edges += 1;
    }

    pub fn node_id(&self, loc: Location) -> Option<NodeId> {
        self.index.get(&loc).copied()
    }

    pub fn location(&self, id: NodeId) -> Location {
        self.nodes[id.index()]
    }

    pub fn edges(&self, id: NodeId) -> &[Edge] {
        &self.edges[id.index()]
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_edges(&self) -> usize {
        self.num_edges
    }

    pub fn offers_wire(&self, wire: WireId) -> bool {
        self.edges.iter().flatten().any(|e| e.wire == wire)
    }
}
