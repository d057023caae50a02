use fpga_common::db::fabric::FabricDB;
use fpga_common::db::selection::SelectionWindow;
use fpga_common::geom::coord::TileCoord;
use fpga_common::geom::rect::TileRect;
use fpga_common::util::config::SelectionConfig;

/// Mutable state shared by consecutive routing passes: the fabric with
/// its blocked-wire flags and the selection window. One pass at a time.
pub struct RouteContext {
    pub fabric: FabricDB,
    pub selection: SelectionWindow,
}

impl RouteContext {
    pub fn new(fabric: FabricDB, selection: SelectionWindow) -> Self {
        Self { fabric, selection }
    }

    pub fn from_config(fabric: FabricDB, config: &SelectionConfig) -> Self {
        let mut selection = SelectionWindow::new(config.expand_margin);
        if let Some([x1, y1, x2, y2]) = config.initial_region {
            let rect = TileRect::bounding(TileCoord::new(x1, y1), TileCoord::new(x2, y2));
            let added = selection.add_region(&fabric, rect);
            log::info!("Initial selection: {} tiles", added);
        }
        Self { fabric, selection }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_region_is_applied() {
        let mut fabric = FabricDB::new();
        for y in 0..3 {
            for x in 0..3 {
                fabric
                    .add_tile(&format!("T{}{}", x, y), TileCoord::new(x, y))
                    .unwrap();
            }
        }
        let config = SelectionConfig {
            expand_margin: 2,
            initial_region: Some([1, 1, 0, 0]),
        };
        let ctx = RouteContext::from_config(fabric, &config);
        assert_eq!(ctx.selection.len(), 4);
        assert_eq!(ctx.selection.expand_margin(), 2);
    }
}
