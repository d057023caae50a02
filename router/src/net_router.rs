//! Sequential multi-sink routing of a single net.
//!
//! Sinks are routed one at a time, ordered by instance name. Each sink gets
//! a freshly built graph over the (possibly grown) selection window and one
//! Dijkstra search from a single start candidate. Wires used by the pass are
//! blocked in the fabric once every sink has been tried.

use crate::algo::dijkstra::Dijkstra;
use crate::context::RouteContext;
use crate::error::RouteError;
use crate::extend::{block_used_resources, extend_net};
use crate::graph::RoutingGraph;
use crate::region::{GrowthConfirm, ensure_region};
use fpga_common::db::fabric::{FabricDB, Location};
use fpga_common::db::indices::NetId;
use fpga_common::db::netlist::{Netlist, Pip};
use fpga_common::util::config::{RoutingConfig, SearchMode, StartPolicy};
use fpga_common::util::profiler::ScopedTimer;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq)]
pub enum SinkOutcome {
    Routed { cost: f64, pips: usize },
    Failed(RouteError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SinkReport {
    /// `instance.port` of the sink pin.
    pub name: String,
    pub sink: Location,
    pub start: Location,
    pub outcome: SinkOutcome,
}

impl SinkReport {
    pub fn is_routed(&self) -> bool {
        matches!(self.outcome, SinkOutcome::Routed { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteReport {
    pub net: String,
    pub search_mode: SearchMode,
    pub sinks: Vec<SinkReport>,
    pub pips_added: usize,
    pub wires_blocked: usize,
    pub total_cost: f64,
}

impl RouteReport {
    pub fn failed(&self) -> impl Iterator<Item = &SinkReport> {
        self.sinks.iter().filter(|s| !s.is_routed())
    }

    pub fn is_complete(&self) -> bool {
        self.sinks.iter().all(SinkReport::is_routed)
    }
}

/// Result of routing several nets in one run.
#[derive(Debug, Default)]
pub struct PassSummary {
    pub reports: Vec<RouteReport>,
    /// Nets that could not be routed at all.
    pub errors: Vec<(String, RouteError)>,
}

impl PassSummary {
    pub fn failed_sinks(&self) -> usize {
        self.reports.iter().map(|r| r.failed().count()).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.failed_sinks() == 0
    }
}

/// The source followed by both endpoints of every routed pip, without
/// repeats, in that order.
pub fn start_candidates(source: Location, pips: &[Pip]) -> Vec<Location> {
    let mut seen = HashSet::new();
    std::iter::once(source)
        .chain(pips.iter().flat_map(|p| [p.from, p.to]))
        .filter(|loc| seen.insert(*loc))
        .collect()
}

/// Picks the location the search for `target` starts from. An empty
/// candidate list is [`RouteError::NoStartLocation`].
pub fn choose_start(
    fabric: &FabricDB,
    candidates: &[Location],
    target: Location,
    policy: StartPolicy,
) -> Result<Location, RouteError> {
    let start = match policy {
        StartPolicy::Source => candidates.first().copied(),
        StartPolicy::Nearest => {
            let target_coord = fabric.tile(target.tile).coord;
            candidates
                .iter()
                .copied()
                .min_by_key(|loc| fabric.tile(loc.tile).coord.manhattan(target_coord))
        }
    };
    start.ok_or(RouteError::NoStartLocation)
}

/// Routes every sink of `net_name` from its single source.
///
/// A sink without a path is recorded in the report and routing goes on.
/// Declining a region growth undoes the pips added so far and returns
/// [`RouteError::UserAborted`]; nothing is blocked in that case.
pub fn route_net(
    ctx: &mut RouteContext,
    netlist: &mut Netlist,
    net_name: &str,
    config: &RoutingConfig,
    confirm: &mut dyn GrowthConfirm,
) -> Result<RouteReport, RouteError> {
    let _timer = ScopedTimer::new(format!("Routing net {}", net_name));

    let net_id = netlist
        .net_by_name(net_name)
        .ok_or_else(|| RouteError::UnknownNet(net_name.to_string()))?;
    let source = resolve_source(netlist, net_id)?;
    let sinks = sorted_sinks(&ctx.fabric, netlist, net_id);

    log::info!(
        "Routing net {} ({:?}): {} sinks from {}",
        net_name,
        config.search_mode,
        sinks.len(),
        ctx.fabric.location_name(source)
    );

    let pass_start = netlist.net(net_id).pips.len();
    let mut solver = Dijkstra::new();
    let mut reports = Vec::with_capacity(sinks.len());
    let mut total_cost = 0.0;

    for (name, target) in sinks {
        let net = netlist.net(net_id);
        let candidates = start_candidates(source, &net.pips);
        let start = choose_start(&ctx.fabric, &candidates, target, config.start_policy)?;

        if let Err(e) = ensure_region(ctx, start, target, config.confirm_area_threshold, confirm)
        {
            let removed = netlist.net(net_id).pips.len() - pass_start;
            netlist.net_mut(net_id).pips.truncate(pass_start);
            log::error!(
                "Net {}: {}. Discarded {} pips of this pass.",
                net_name,
                e,
                removed
            );
            return Err(e);
        }

        let graph = RoutingGraph::build(ctx, start, target);
        let outcome = match solver.find_path(&graph, start, target, config.max_depth) {
            Some(path) => {
                let pips = extend_net(netlist.net_mut(net_id), &path);
                total_cost += path.cost;
                log::debug!(
                    "  {} routed from {} ({} pips, cost {:.3})",
                    name,
                    ctx.fabric.location_name(start),
                    pips,
                    path.cost
                );
                SinkOutcome::Routed {
                    cost: path.cost,
                    pips,
                }
            }
            None => {
                log::warn!(
                    "  {}: no path from {} within depth {}",
                    name,
                    ctx.fabric.location_name(start),
                    config.max_depth
                );
                SinkOutcome::Failed(RouteError::PathNotFound { sink: name.clone() })
            }
        };
        reports.push(SinkReport {
            name,
            sink: target,
            start,
            outcome,
        });
    }

    let added = &netlist.net(net_id).pips[pass_start..];
    let wires_blocked = block_used_resources(&mut ctx.fabric, added);

    let report = RouteReport {
        net: net_name.to_string(),
        search_mode: config.search_mode,
        sinks: reports,
        pips_added: added.len(),
        wires_blocked,
        total_cost,
    };
    let failed = report.failed().count();
    if failed > 0 {
        log::warn!(
            "Net {}: {}/{} sinks unrouted",
            net_name,
            failed,
            report.sinks.len()
        );
    } else {
        log::info!(
            "Net {}: {} pips, cost {:.3}, {} wires blocked",
            net_name,
            report.pips_added,
            report.total_cost,
            report.wires_blocked
        );
    }
    Ok(report)
}

/// Routes every net that has no pips yet, in name order. A net that cannot
/// be routed at all is recorded and skipped, except for a user abort which
/// ends the run.
pub fn route_all(
    ctx: &mut RouteContext,
    netlist: &mut Netlist,
    config: &RoutingConfig,
    confirm: &mut dyn GrowthConfirm,
) -> PassSummary {
    let _timer = ScopedTimer::new("Routing all nets");

    let mut names: Vec<String> = netlist
        .nets
        .iter()
        .filter(|n| !n.is_routed())
        .map(|n| n.name.clone())
        .collect();
    names.sort();
    log::info!(
        "Routing {} of {} nets...",
        names.len(),
        netlist.num_nets()
    );

    let mut summary = PassSummary::default();
    for name in names {
        match route_net(ctx, netlist, &name, config, confirm) {
            Ok(report) => summary.reports.push(report),
            Err(RouteError::UserAborted) => {
                summary.errors.push((name, RouteError::UserAborted));
                log::error!("Routing stopped by the user.");
                break;
            }
            Err(e) => {
                log::error!("Net {}: {}", name, e);
                summary.errors.push((name, e));
            }
        }
    }

    log::info!(
        "Routed {} nets, {} failed sinks, {} nets in error",
        summary.reports.len(),
        summary.failed_sinks(),
        summary.errors.len()
    );
    summary
}

fn resolve_source(netlist: &Netlist, net_id: NetId) -> Result<Location, RouteError> {
    let net = netlist.net(net_id);
    let sources: Vec<_> = net.sources().collect();
    match sources.as_slice() {
        [pin] => Ok(netlist.pin_location(pin)),
        _ => Err(RouteError::InvalidNetShape {
            net: net.name.clone(),
            sources: sources.len(),
        }),
    }
}

/// Sink pins as (`instance.port`, location), ordered by instance name and
/// then port name.
fn sorted_sinks(fabric: &FabricDB, netlist: &Netlist, net_id: NetId) -> Vec<(String, Location)> {
    let mut keyed: Vec<_> = netlist
        .net(net_id)
        .sinks()
        .map(|pin| {
            let inst = netlist.instance(pin.instance).name.as_str();
            let port = fabric.port(pin.port).name.as_str();
            (inst, port, netlist.pin_location(pin))
        })
        .collect();
    keyed.sort_by(|a, b| a.0.cmp(b.0).then(a.1.cmp(b.1)));
    keyed
        .into_iter()
        .map(|(inst, port, loc)| (format!("{}.{}", inst, port), loc))
        .collect()
}
