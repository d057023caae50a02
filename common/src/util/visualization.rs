use crate::db::fabric::{FabricDB, Location};
use crate::db::indices::{TileId, WireId};
use crate::db::netlist::Netlist;
use crate::db::selection::SelectionWindow;
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect as ImageRect;
use std::path::Path;

const NET_COLORS: [Rgba<u8>; 6] = [
    Rgba([0, 110, 255, 230]),
    Rgba([255, 20, 80, 230]),
    Rgba([0, 255, 100, 230]),
    Rgba([255, 215, 0, 230]),
    Rgba([180, 50, 255, 230]),
    Rgba([0, 240, 255, 230]),
];

/// Renders tiles (selected ones highlighted), blocked wires and every
/// net's routed pips. Ports are spread around the tile square so pips
/// inside one tile stay visible.
pub fn draw_routed_fabric(
    fabric: &FabricDB,
    netlist: &Netlist,
    selection: &SelectionWindow,
    filename: &str,
    width: u32,
    height: u32,
) {
    let Some(bounds) = fabric.bounds() else {
        return;
    };
    let mut img = RgbaImage::from_pixel(width, height, Rgba([15, 15, 20, 255]));

    let cols = bounds.width() as f64 + 1.0;
    let rows = bounds.height() as f64 + 1.0;
    let pitch_x = width as f64 / cols;
    let pitch_y = height as f64 / rows;
    let tile_w = (pitch_x * 0.8).max(1.0);
    let tile_h = (pitch_y * 0.8).max(1.0);

    // Top-left corner of a tile square, y grows upwards in fabric space.
    let tile_origin = |tile: TileId| {
        let c = fabric.tile(tile).coord;
        let col = (c.x - bounds.min.x) as f64;
        let row = (bounds.max.y - c.y) as f64;
        (col * pitch_x + pitch_x * 0.1, row * pitch_y + pitch_y * 0.1)
    };

    let port_point = |loc: Location| {
        let (x0, y0) = tile_origin(loc.tile);
        let ports = &fabric.tile(loc.tile).ports;
        let n = ports.len().max(1) as f64;
        let k = ports.iter().position(|&p| p == loc.port).unwrap_or(0) as f64;
        let angle = std::f64::consts::TAU * k / n;
        (
            (x0 + tile_w * (0.5 + 0.35 * angle.cos())) as f32,
            (y0 + tile_h * (0.5 + 0.35 * angle.sin())) as f32,
        )
    };

    let tile_color = Rgba([45, 45, 55, 255]);
    let selected_color = Rgba([70, 70, 95, 255]);
    for i in 0..fabric.num_tiles() {
        let id = TileId::new(i);
        let (x, y) = tile_origin(id);
        let rect = ImageRect::at(x as i32, y as i32).of_size(tile_w as u32, tile_h as u32);
        if selection.contains_tile(id) {
            draw_filled_rect_mut(&mut img, rect, selected_color);
            draw_hollow_rect_mut(&mut img, rect, Rgba([120, 120, 160, 255]));
        } else {
            draw_filled_rect_mut(&mut img, rect, tile_color);
        }
    }

    let blocked_color = Rgba([90, 30, 30, 255]);
    for (i, wire) in fabric.wires.iter().enumerate() {
        if fabric.is_blocked(WireId::new(i)) {
            draw_line_segment_mut(
                &mut img,
                port_point(wire.source()),
                port_point(wire.destination()),
                blocked_color,
            );
        }
    }

    for (n, net) in netlist.nets.iter().enumerate() {
        let color = NET_COLORS[n % NET_COLORS.len()];
        for pip in &net.pips {
            draw_line_segment_mut(&mut img, port_point(pip.from), port_point(pip.to), color);
        }
        let pin_color = Rgba([255, 255, 255, 255]);
        for pin in &net.pins {
            let (px, py) = port_point(netlist.pin_location(pin));
            let rect = ImageRect::at(px as i32 - 1, py as i32 - 1).of_size(3, 3);
            draw_filled_rect_mut(&mut img, rect, pin_color);
        }
    }

    if let Err(e) = img.save(Path::new(filename)) {
        log::warn!("Could not write visualization {}: {}", filename, e);
    }
}
