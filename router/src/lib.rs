pub mod algo;
pub mod context;
pub mod error;
pub mod extend;
pub mod graph;
pub mod net_router;
pub mod region;

#[cfg(test)]
mod test_util;

use context::RouteContext;
use error::RouteError;
use fpga_common::db::netlist::Netlist;
use fpga_common::util::config::RoutingConfig;
use net_router::PassSummary;
use region::GrowthConfirm;

/// Routes one named net, or every unrouted net when `net` is `None`.
pub fn route(
    ctx: &mut RouteContext,
    netlist: &mut Netlist,
    config: &RoutingConfig,
    net: Option<&str>,
    confirm: &mut dyn GrowthConfirm,
) -> Result<PassSummary, RouteError> {
    match net {
        Some(name) => {
            let report = net_router::route_net(ctx, netlist, name, config, confirm)?;
            Ok(PassSummary {
                reports: vec![report],
                errors: Vec::new(),
            })
        }
        None => Ok(net_router::route_all(ctx, netlist, config, confirm)),
    }
}
