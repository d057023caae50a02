use crate::algo::dijkstra::RoutedPath;
use fpga_common::db::fabric::FabricDB;
use fpga_common::db::indices::WireId;
use fpga_common::db::netlist::{NetData, Pip};
use std::collections::HashSet;

/// One pip per consecutive pair of path locations.
pub fn path_to_pips(path: &RoutedPath) -> Vec<Pip> {
    path.locations
        .windows(2)
        .zip(&path.wires)
        .map(|(pair, &wire)| Pip {
            wire,
            from: pair[0],
            to: pair[1],
        })
        .collect()
}

/// Appends the path to the net's routed tree in one step and returns the
/// number of pips added. Hops over wires the net already owns are shared
/// with the existing tree and not recorded twice.
pub fn extend_net(net: &mut NetData, path: &RoutedPath) -> usize {
    let owned: HashSet<WireId> = net.pips.iter().map(|p| p.wire).collect();
    let pips: Vec<Pip> = path_to_pips(path)
        .into_iter()
        .filter(|p| !owned.contains(&p.wire))
        .collect();
    let added = pips.len();
    net.pips.extend(pips);
    added
}

/// Marks the wires behind `pips` as consumed. Returns how many were not
/// blocked before.
pub fn block_used_resources(fabric: &mut FabricDB, pips: &[Pip]) -> usize {
    fabric.block_wires(pips.iter().map(|p| p.wire))
}
