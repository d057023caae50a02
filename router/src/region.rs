//! Growing the selection window until it spans both routing endpoints.

use crate::context::RouteContext;
use crate::error::RouteError;
use fpga_common::db::fabric::{FabricDB, Location};
use fpga_common::geom::rect::TileRect;

/// Asked before a large region is added to the selection window.
pub trait GrowthConfirm {
    /// `estimated_area` is the product of the growth margins, in tiles.
    fn confirm(&mut self, estimated_area: u64) -> bool;
}

/// Accepts every growth request.
pub struct AutoConfirm;

impl GrowthConfirm for AutoConfirm {
    fn confirm(&mut self, _estimated_area: u64) -> bool {
        true
    }
}

/// Declines every request that reaches the threshold.
pub struct DenyLarge;

impl GrowthConfirm for DenyLarge {
    fn confirm(&mut self, _estimated_area: u64) -> bool {
        false
    }
}

impl<F: FnMut(u64) -> bool> GrowthConfirm for F {
    fn confirm(&mut self, estimated_area: u64) -> bool {
        self(estimated_area)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionGrowth {
    Unchanged,
    Grown { rect: TileRect, added: usize },
}

/// Region that would be requested for `start`/`target`: their bounding box
/// grown by its own width and height on every side, plus the area proxy
/// (width times height of that margin).
pub fn plan_region(fabric: &FabricDB, start: Location, target: Location) -> (TileRect, u64) {
    let bbox = TileRect::bounding(fabric.tile(start.tile).coord, fabric.tile(target.tile).coord);
    let (dx, dy) = (bbox.width(), bbox.height());
    let rect = bbox.expanded(dx as i32, dy as i32);
    (rect, dx as u64 * dy as u64)
}

pub fn covers(ctx: &RouteContext, start: Location, target: Location) -> bool {
    !ctx.selection.is_empty() && ctx.selection.contains(&start) && ctx.selection.contains(&target)
}

/// Makes sure the selection window contains both endpoints, asking
/// `confirm` first when the margin area is at least `threshold`.
pub fn ensure_region(
    ctx: &mut RouteContext,
    start: Location,
    target: Location,
    threshold: u64,
    confirm: &mut dyn GrowthConfirm,
) -> Result<RegionGrowth, RouteError> {
    if covers(ctx, start, target) {
        return Ok(RegionGrowth::Unchanged);
    }

    let (rect, area) = plan_region(&ctx.fabric, start, target);
    if area >= threshold {
        log::warn!(
            "Search region margin area {} reaches threshold {}. Routing may be slow.",
            area,
            threshold
        );
        if !confirm.confirm(area) {
            log::error!("Region growth declined.");
            return Err(RouteError::UserAborted);
        }
    }

    let mut added = ctx.selection.add_region(&ctx.fabric, rect);
    added += ctx.selection.expand(&ctx.fabric);
    log::debug!(
        "Selection grown to {} tiles (+{}) for {} -> {}",
        ctx.selection.len(),
        added,
        ctx.fabric.location_name(start),
        ctx.fabric.location_name(target)
    );
    Ok(RegionGrowth::Grown { rect, added })
}
