use crate::context::RouteContext;
use fpga_common::db::fabric::{FabricDB, Location};
use fpga_common::db::indices::{PortId, TileId};
use fpga_common::db::netlist::{Netlist, PinDirection};
use fpga_common::db::selection::SelectionWindow;
use fpga_common::geom::coord::TileCoord;

pub(crate) struct Triangle {
    pub ctx: RouteContext,
    pub netlist: Netlist,
    pub a: Location,
    pub b: Location,
    pub c: Location,
}

impl Triangle {
    pub fn select_all(&mut self) {
        for i in 0..self.ctx.fabric.num_tiles() {
            self.ctx.selection.add_tile(TileId::new(i));
        }
    }
}

/// Three tiles in a row. A.O reaches C.I directly at cost 5 or through
/// B.I at cost 1 + 1. Net `n0` is driven by A.O and sinks C.I then B.I.
pub(crate) fn triangle() -> Triangle {
    let mut fabric = FabricDB::new();
    let ta = fabric.add_tile("A", TileCoord::new(0, 0)).unwrap();
    let tb = fabric.add_tile("B", TileCoord::new(1, 0)).unwrap();
    let tc = fabric.add_tile("C", TileCoord::new(2, 0)).unwrap();
    let a = Location::new(ta, fabric.add_port(ta, "O").unwrap());
    let b = Location::new(tb, fabric.add_port(tb, "I").unwrap());
    let c = Location::new(tc, fabric.add_port(tc, "I").unwrap());
    fabric.add_port(tc, "O").unwrap();
    fabric.add_wire(a, b, 1.0).unwrap();
    fabric.add_wire(a, c, 5.0).unwrap();
    fabric.add_wire(b, c, 1.0).unwrap();

    let mut netlist = Netlist::new();
    netlist.add_instance("p0", ta).unwrap();
    netlist.add_instance("p1", tb).unwrap();
    netlist.add_instance("p2", tc).unwrap();
    let net = netlist.add_net("n0").unwrap();
    netlist
        .add_pin(&fabric, net, PinDirection::Source, "p0", "O")
        .unwrap();
    netlist
        .add_pin(&fabric, net, PinDirection::Sink, "p2", "I")
        .unwrap();
    netlist
        .add_pin(&fabric, net, PinDirection::Sink, "p1", "I")
        .unwrap();

    Triangle {
        ctx: RouteContext::new(fabric, SelectionWindow::new(1)),
        netlist,
        a,
        b,
        c,
    }
}

/// `n` distinct locations that no fabric backs. Only useful for graphs
/// assembled by hand.
pub(crate) fn line_locations(n: usize) -> Vec<Location> {
    (0..n)
        .map(|i| Location::new(TileId::new(i), PortId::new(i)))
        .collect()
}

/// `width` x `height` tiles named `X{x}Y{y}` with a single port `P` each
/// and no wires. Empty selection, margin 1.
pub(crate) fn grid_ctx(width: i32, height: i32) -> RouteContext {
    let mut fabric = FabricDB::new();
    for y in 0..height {
        for x in 0..width {
            let tile = fabric
                .add_tile(&format!("X{}Y{}", x, y), TileCoord::new(x, y))
                .unwrap();
            fabric.add_port(tile, "P").unwrap();
        }
    }
    RouteContext::new(fabric, SelectionWindow::new(1))
}
