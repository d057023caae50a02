use crate::db::fabric::FabricDB;
use crate::db::indices::NetId;
use crate::db::netlist::{Netlist, PinDirection, Pip};
use anyhow::{Context, Result, bail};
use std::fs::File;
use std::io::{BufRead, BufReader, Write};

pub fn parse(db: &mut Netlist, fabric: &FabricDB, filename: &str) -> Result<()> {
    let file = File::open(filename)?;
    parse_reader(db, fabric, BufReader::new(file))
}

/// Reads `INST` records and `NET ... END NET` blocks holding `OUTPIN`,
/// `INPIN` and `PIP` lines. Ports and wires are resolved against `fabric`.
pub fn parse_reader<R: BufRead>(db: &mut Netlist, fabric: &FabricDB, reader: R) -> Result<()> {
    let mut current_net: Option<NetId> = None;

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let content = line.split('#').next().unwrap_or("");
        let parts: Vec<&str> = content.split_whitespace().collect();
        if parts.is_empty() {
            continue;
        }
        parse_record(db, fabric, &parts, &mut current_net)
            .with_context(|| format!("line {}", line_no + 1))?;
    }

    if let Some(net) = current_net {
        bail!("net '{}' is missing 'END NET'", db.net(net).name);
    }

    log::info!(
        "Netlist loaded: {} instances, {} nets",
        db.instances.len(),
        db.num_nets()
    );
    Ok(())
}

fn parse_record(
    db: &mut Netlist,
    fabric: &FabricDB,
    parts: &[&str],
    current_net: &mut Option<NetId>,
) -> Result<()> {
    match parts[0] {
        "INST" => {
            if current_net.is_some() {
                bail!("'INST' inside a net block");
            }
            if parts.len() != 3 {
                bail!("expected 'INST <name> <tile>'");
            }
            let Some(tile) = fabric.tile_by_name(parts[2]) else {
                bail!("unknown tile '{}'", parts[2]);
            };
            db.add_instance(parts[1], tile)?;
        }
        "NET" => {
            if let Some(open) = *current_net {
                bail!("net '{}' is missing 'END NET'", db.net(open).name);
            }
            if parts.len() != 2 {
                bail!("expected 'NET <name>'");
            }
            *current_net = Some(db.add_net(parts[1])?);
        }
        "OUTPIN" | "INPIN" => {
            let Some(net) = *current_net else {
                bail!("'{}' outside a net block", parts[0]);
            };
            if parts.len() != 3 {
                bail!("expected '{} <inst> <port>'", parts[0]);
            }
            let direction = if parts[0] == "OUTPIN" {
                PinDirection::Source
            } else {
                PinDirection::Sink
            };
            db.add_pin(fabric, net, direction, parts[1], parts[2])?;
        }
        "PIP" => {
            let Some(net) = *current_net else {
                bail!("'PIP' outside a net block");
            };
            if parts.len() != 5 {
                bail!("expected 'PIP <tile> <from_port> <to_tile> <to_port>'");
            }
            let from = fabric.resolve_location(parts[1], parts[2])?;
            let to = fabric.resolve_location(parts[3], parts[4])?;
            let Some(wire) = fabric.find_wire(from, to) else {
                bail!(
                    "no wire from {} to {}",
                    fabric.location_name(from),
                    fabric.location_name(to)
                );
            };
            db.net_mut(net).pips.push(Pip { wire, from, to });
        }
        "END" => {
            if parts.get(1) != Some(&"NET") {
                bail!("expected 'END NET'");
            }
            if current_net.take().is_none() {
                bail!("'END NET' without an open net");
            }
        }
        other => bail!("unknown record '{}'", other),
    }
    Ok(())
}

/// Writes the netlist in the format `parse_reader` accepts, routed pips
/// included.
pub fn write<W: Write>(db: &Netlist, fabric: &FabricDB, out: &mut W) -> std::io::Result<()> {
    for inst in &db.instances {
        writeln!(out, "INST {} {}", inst.name, fabric.tile(inst.tile).name)?;
    }
    for net in &db.nets {
        writeln!(out, "NET {}", net.name)?;
        for pin in &net.pins {
            let keyword = match pin.direction {
                PinDirection::Source => "OUTPIN",
                PinDirection::Sink => "INPIN",
            };
            writeln!(
                out,
                "  {} {} {}",
                keyword,
                db.instance(pin.instance).name,
                fabric.port(pin.port).name
            )?;
        }
        for pip in &net.pips {
            writeln!(
                out,
                "  PIP {} {} {} {}",
                fabric.tile(pip.from.tile).name,
                fabric.port(pip.from.port).name,
                fabric.tile(pip.to.tile).name,
                fabric.port(pip.to.port).name
            )?;
        }
        writeln!(out, "END NET")?;
    }
    Ok(())
}
