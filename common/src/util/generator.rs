use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::fs::File;
use std::io::{BufWriter, Write};

#[derive(Debug, Clone)]
pub struct BenchmarkParams {
    pub width: i32,
    pub height: i32,
    pub instances: usize,
    pub nets: usize,
    pub fanout: usize,
    pub seed: Option<u64>,
}

const ROUTING_PORTS: [&str; 4] = ["N", "E", "S", "W"];
const INPUT_PORTS: [&str; 2] = ["I0", "I1"];

/// Writes a random island-style fabric and a netlist placed on it.
///
/// Every tile carries one logic output `O`, two logic inputs and four
/// routing ports. Inside a tile the output drives every routing port,
/// routing ports form a full switchbox and drive both inputs. Between
/// neighbours `E` feeds the east tile's `W` (and likewise for the other
/// directions) with a random cost.
pub fn generate_random_benchmark(
    fabric_file: &str,
    netlist_file: &str,
    params: &BenchmarkParams,
) -> std::io::Result<()> {
    let mut rng = match params.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let width = params.width.max(1);
    let height = params.height.max(1);

    log::info!(
        "Generating Benchmark: {}x{} tiles, {} instances, {} nets (fanout {})",
        width,
        height,
        params.instances,
        params.nets,
        params.fanout
    );

    let mut file = BufWriter::new(File::create(fabric_file)?);
    writeln!(file, "# random fabric {}x{}", width, height)?;
    for y in 0..height {
        for x in 0..width {
            let tile = tile_name(x, y);
            writeln!(file, "TILE {} {} {}", tile, x, y)?;
            writeln!(file, "PORT {} O", tile)?;
            for port in INPUT_PORTS.iter().chain(ROUTING_PORTS.iter()) {
                writeln!(file, "PORT {} {}", tile, port)?;
            }
        }
    }

    for y in 0..height {
        for x in 0..width {
            let tile = tile_name(x, y);
            for port in ROUTING_PORTS {
                writeln!(file, "WIRE {} O {} {} 0.5", tile, tile, port)?;
            }
            for from in ROUTING_PORTS {
                for to in ROUTING_PORTS {
                    if from != to {
                        writeln!(file, "WIRE {} {} {} {} 0.25", tile, from, tile, to)?;
                    }
                }
                for input in INPUT_PORTS {
                    writeln!(file, "WIRE {} {} {} {} 0.5", tile, from, tile, input)?;
                }
            }

            let neighbours = [
                ("N", x, y + 1, "S"),
                ("E", x + 1, y, "W"),
                ("S", x, y - 1, "N"),
                ("W", x - 1, y, "E"),
            ];
            for (port, nx, ny, other) in neighbours {
                if nx < 0 || ny < 0 || nx >= width || ny >= height {
                    continue;
                }
                let cost: f64 = rng.gen_range(1.0..3.0);
                writeln!(
                    file,
                    "WIRE {} {} {} {} {:.2}",
                    tile,
                    port,
                    tile_name(nx, ny),
                    other,
                    cost
                )?;
            }
        }
    }
    file.flush()?;

    // One instance per tile at most, so instance pins never share ports.
    let mut sites: Vec<(i32, i32)> = (0..height)
        .flat_map(|y| (0..width).map(move |x| (x, y)))
        .collect();
    sites.shuffle(&mut rng);
    let num_instances = params.instances.min(sites.len());
    if num_instances < params.instances {
        log::warn!(
            "Requested {} instances but fabric only has {} tiles. Clamped.",
            params.instances,
            sites.len()
        );
    }

    let mut file = BufWriter::new(File::create(netlist_file)?);
    for (i, &(x, y)) in sites.iter().take(num_instances).enumerate() {
        writeln!(file, "INST inst_{} {}", i, tile_name(x, y))?;
    }

    if num_instances >= 2 {
        // Each instance input can be driven by one net only.
        let mut free_inputs: Vec<(usize, &str)> = (0..num_instances)
            .flat_map(|i| INPUT_PORTS.iter().map(move |&p| (i, p)))
            .collect();
        free_inputs.shuffle(&mut rng);

        let mut drivers: Vec<usize> = (0..num_instances).collect();
        drivers.shuffle(&mut rng);
        if params.nets > drivers.len() {
            log::warn!(
                "Requested {} nets but only {} instances can drive one. Clamped.",
                params.nets,
                drivers.len()
            );
        }

        for (n, &driver) in drivers.iter().take(params.nets).enumerate() {
            let mut sinks = Vec::new();
            let mut k = 0;
            while sinks.len() < params.fanout.max(1) && k < free_inputs.len() {
                if free_inputs[k].0 != driver {
                    sinks.push(free_inputs.remove(k));
                } else {
                    k += 1;
                }
            }
            if sinks.is_empty() {
                log::warn!("Ran out of free inputs after {} nets.", n);
                break;
            }
            writeln!(file, "NET net_{}", n)?;
            writeln!(file, "  OUTPIN inst_{} O", driver)?;
            for (inst, port) in sinks {
                writeln!(file, "  INPIN inst_{} {}", inst, port)?;
            }
            writeln!(file, "END NET")?;
        }
    }
    file.flush()?;

    Ok(())
}

fn tile_name(x: i32, y: i32) -> String {
    format!("T_X{}Y{}", x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::fabric::FabricDB;
    use crate::db::netlist::Netlist;
    use crate::db::parser;

    #[test]
    fn generated_files_parse() {
        let dir = std::env::temp_dir().join(format!("fpga-gen-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let fabric_path = dir.join("fabric.txt");
        let netlist_path = dir.join("netlist.txt");
        let params = BenchmarkParams {
            width: 4,
            height: 3,
            instances: 6,
            nets: 3,
            fanout: 2,
            seed: Some(7),
        };
        generate_random_benchmark(
            fabric_path.to_str().unwrap(),
            netlist_path.to_str().unwrap(),
            &params,
        )
        .unwrap();

        let mut fabric = FabricDB::new();
        parser::fabric::parse(&mut fabric, fabric_path.to_str().unwrap()).unwrap();
        assert_eq!(fabric.num_tiles(), 12);
        assert_eq!(fabric.num_ports(), 12 * 7);
        // 4 output + 12 switchbox + 8 input wires per tile, plus one per
        // directed neighbour pair: 2 * (3 * 3 + 4 * 2) = 34.
        assert_eq!(fabric.num_wires(), 12 * 24 + 34);

        let mut netlist = Netlist::new();
        parser::netlist::parse(&mut netlist, &fabric, netlist_path.to_str().unwrap()).unwrap();
        assert_eq!(netlist.instances.len(), 6);
        assert_eq!(netlist.num_nets(), 3);
        for net in &netlist.nets {
            assert_eq!(net.sources().count(), 1);
            assert_eq!(net.sinks().count(), 2);
        }

        let _ = std::fs::remove_dir_all(&dir);
    }
}
