use crate::db::fabric::{FabricDB, Location};
use crate::db::indices::{NetId, WireId};
use crate::db::netlist::Netlist;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet, VecDeque};

/// Verifies every routed net: no wire shared between nets, every sink
/// reachable from the source through the net's pips.
pub fn run(fabric: &FabricDB, netlist: &Netlist) -> Result<(), String> {
    log::info!("Starting Route Verification...");

    let (shorts_result, opens_result) = rayon::join(
        || check_shorts(fabric, netlist),
        || check_opens(fabric, netlist),
    );

    let mut msgs = Vec::new();

    match shorts_result {
        Err(e) => {
            log::error!("\x1b[31mFAIL\x1b[0m: Shared wires detected");
            log::error!("{}", e);
            msgs.push(e);
        }
        Ok(_) => log::info!("\x1b[32mPASS\x1b[0m: No wire is used by two nets."),
    }

    match opens_result {
        Err(e) => {
            log::error!("\x1b[31mFAIL\x1b[0m: Open net detected");
            log::error!("{}", e);
            msgs.push(e);
        }
        Ok(_) => log::info!("\x1b[32mPASS\x1b[0m: All routed nets reach their sinks."),
    }

    if msgs.is_empty() {
        Ok(())
    } else {
        Err(msgs.join("; "))
    }
}

fn check_shorts(fabric: &FabricDB, netlist: &Netlist) -> Result<(), String> {
    let mut owner: HashMap<WireId, NetId> = HashMap::new();
    for (net_idx, net) in netlist.nets.iter().enumerate() {
        let net_id = NetId::new(net_idx);
        for pip in &net.pips {
            match owner.get(&pip.wire) {
                Some(&other) if other != net_id => {
                    let wire = fabric.wire(pip.wire);
                    return Err(format!(
                        "SHORT: '{}' vs '{}' on wire {} -> {}",
                        netlist.net(other).name,
                        net.name,
                        fabric.location_name(wire.source()),
                        fabric.location_name(wire.destination())
                    ));
                }
                Some(_) => {}
                None => {
                    owner.insert(pip.wire, net_id);
                }
            }
        }
    }
    Ok(())
}

fn check_opens(fabric: &FabricDB, netlist: &Netlist) -> Result<(), String> {
    let errors: Vec<String> = netlist
        .nets
        .par_iter()
        .filter_map(|net| {
            let mut sources = net.sources();
            let source = sources.next()?;
            if sources.next().is_some() || net.sinks().next().is_none() {
                return None;
            }
            if net.pips.is_empty() {
                return Some(format!("Net '{}': Unrouted (no pips)", net.name));
            }

            let mut adj: HashMap<Location, Vec<Location>> = HashMap::new();
            for pip in &net.pips {
                adj.entry(pip.from).or_default().push(pip.to);
            }

            let start = netlist.pin_location(source);
            let mut visited = HashSet::new();
            let mut queue = VecDeque::new();
            visited.insert(start);
            queue.push_back(start);
            while let Some(u) = queue.pop_front() {
                if let Some(next) = adj.get(&u) {
                    for &v in next {
                        if visited.insert(v) {
                            queue.push_back(v);
                        }
                    }
                }
            }

            net.sinks()
                .map(|pin| netlist.pin_location(pin))
                .find(|loc| !visited.contains(loc))
                .map(|loc| {
                    format!(
                        "Net '{}': sink {} not reached from source {}",
                        net.name,
                        fabric.location_name(loc),
                        fabric.location_name(start)
                    )
                })
        })
        .collect();

    match errors.into_iter().next() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
