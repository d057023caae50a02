use crate::db::fabric::FabricDB;
use crate::geom::coord::TileCoord;
use anyhow::{Context, Result, bail};
use std::fs::File;
use std::io::{BufRead, BufReader};

pub fn parse(db: &mut FabricDB, filename: &str) -> Result<()> {
    let file = File::open(filename)?;
    parse_reader(db, BufReader::new(file))
}

/// Reads `TILE`, `PORT` and `WIRE` records. Anything after `#` is ignored.
pub fn parse_reader<R: BufRead>(db: &mut FabricDB, reader: R) -> Result<()> {
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let content = line.split('#').next().unwrap_or("");
        let parts: Vec<&str> = content.split_whitespace().collect();
        if parts.is_empty() {
            continue;
        }
        parse_record(db, &parts).with_context(|| format!("line {}", line_no + 1))?;
    }

    log::info!(
        "Fabric loaded: {} tiles, {} ports, {} wires",
        db.num_tiles(),
        db.num_ports(),
        db.num_wires()
    );
    Ok(())
}

fn parse_record(db: &mut FabricDB, parts: &[&str]) -> Result<()> {
    match parts[0] {
        "TILE" => {
            if parts.len() != 4 {
                bail!("expected 'TILE <name> <x> <y>'");
            }
            let x: i32 = parts[2].parse()?;
            let y: i32 = parts[3].parse()?;
            db.add_tile(parts[1], TileCoord::new(x, y))?;
        }
        "PORT" => {
            if parts.len() != 3 {
                bail!("expected 'PORT <tile> <port>'");
            }
            let Some(tile) = db.tile_by_name(parts[1]) else {
                bail!("unknown tile '{}'", parts[1]);
            };
            db.add_port(tile, parts[2])?;
        }
        "WIRE" => {
            if parts.len() != 6 {
                bail!("expected 'WIRE <tile> <from_port> <to_tile> <to_port> <cost>'");
            }
            let from = db.resolve_location(parts[1], parts[2])?;
            let to = db.resolve_location(parts[3], parts[4])?;
            let cost: f64 = parts[5].parse()?;
            db.add_wire(from, to, cost)?;
        }
        other => bail!("unknown record '{}'", other),
    }
    Ok(())
}
