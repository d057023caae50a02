use clap::{Parser, Subcommand};
use fpga_common::db::fabric::FabricDB;
use fpga_common::db::netlist::Netlist;
use fpga_common::db::parser;
use fpga_common::util::config::Config;
use fpga_common::util::generator::{self, BenchmarkParams};
use fpga_common::util::{check, logger, visualization};
use fpga_router::context::RouteContext;
use fpga_router::region::{AutoConfirm, GrowthConfirm};
use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Route one net, or every net without pips.
    Route {
        #[arg(long)]
        net: Option<String>,
        /// Grow the search region without asking.
        #[arg(long)]
        yes: bool,
    },
    /// Verify the routes stored in the netlist.
    Check,
    Generate {
        #[arg(long, default_value_t = 8)]
        width: i32,
        #[arg(long, default_value_t = 8)]
        height: i32,
        #[arg(long, default_value_t = 24)]
        instances: usize,
        #[arg(long, default_value_t = 8)]
        nets: usize,
        #[arg(long, default_value_t = 2)]
        fanout: usize,
        #[arg(long)]
        seed: Option<u64>,
    },
}

/// Asks on the terminal before a large region is added.
struct ConsoleConfirm;

impl GrowthConfirm for ConsoleConfirm {
    fn confirm(&mut self, estimated_area: u64) -> bool {
        eprint!(
            "\x1b[33mSearch region margin area is {} tiles. Continue? [y/N] \x1b[0m",
            estimated_area
        );
        let _ = std::io::stderr().flush();
        let mut answer = String::new();
        if std::io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim(), "y" | "Y")
    }
}

fn main() -> anyhow::Result<()> {
    logger::init();
    let args = Args::parse();

    let config = if args.config.exists() {
        log::info!("Loading configuration from {:?}", args.config);
        let config_str = std::fs::read_to_string(&args.config)
            .map_err(|e| anyhow::anyhow!("Failed to read config file: {}", e))?;
        toml::from_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?
    } else {
        log::warn!(
            "Configuration file {:?} not found. Using internal defaults.",
            args.config
        );
        Config::default()
    };

    let command = args.command.unwrap_or(Commands::Route {
        net: None,
        yes: false,
    });

    match command {
        Commands::Generate {
            width,
            height,
            instances,
            nets,
            fanout,
            seed,
        } => {
            prepare_output_dir(&config.input.fabric_file)?;
            prepare_output_dir(&config.input.netlist_file)?;
            let params = BenchmarkParams {
                width,
                height,
                instances,
                nets,
                fanout,
                seed,
            };
            generator::generate_random_benchmark(
                &config.input.fabric_file,
                &config.input.netlist_file,
                &params,
            )?;
            log::info!(
                "Generated: {} and {}",
                config.input.fabric_file,
                config.input.netlist_file
            );
        }
        Commands::Route { net, yes } => {
            validate_input_paths(&config)?;
            prepare_output_dir(&config.input.output_netlist)?;

            let mut confirm: Box<dyn GrowthConfirm> = if yes {
                Box::new(AutoConfirm)
            } else {
                Box::new(ConsoleConfirm)
            };
            if let Err(e) = run_routing(&config, net.as_deref(), confirm.as_mut()) {
                log::error!("{:#}", e);
                std::process::exit(1);
            }
        }
        Commands::Check => {
            validate_input_paths(&config)?;
            let (fabric, netlist) = load_design(&config)?;
            check::run(&fabric, &netlist)
                .map_err(|e| anyhow::anyhow!("Verification Failed: {}", e))?;
        }
    }

    Ok(())
}

fn validate_input_paths(config: &Config) -> anyhow::Result<()> {
    for path in [&config.input.fabric_file, &config.input.netlist_file] {
        if !Path::new(path).exists() {
            return Err(anyhow::anyhow!("Input file missing: {}", path));
        }
    }
    Ok(())
}

fn prepare_output_dir(path_str: &str) -> anyhow::Result<()> {
    if let Some(parent) = Path::new(path_str).parent()
        && !parent.exists()
        && !parent.as_os_str().is_empty()
    {
        log::info!("Creating output directory: {:?}", parent);
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Parses fabric and netlist. Wires behind pips already present in the
/// netlist are blocked.
fn load_design(config: &Config) -> anyhow::Result<(FabricDB, Netlist)> {
    let mut fabric = FabricDB::new();
    log::info!("Parsing fabric: {}", config.input.fabric_file);
    parser::fabric::parse(&mut fabric, &config.input.fabric_file).map_err(|e| {
        anyhow::anyhow!(
            "Invalid fabric syntax in '{}': {:#}",
            config.input.fabric_file,
            e
        )
    })?;

    let mut netlist = Netlist::new();
    log::info!("Parsing netlist: {}", config.input.netlist_file);
    parser::netlist::parse(&mut netlist, &fabric, &config.input.netlist_file).map_err(|e| {
        anyhow::anyhow!(
            "Invalid netlist syntax in '{}': {:#}",
            config.input.netlist_file,
            e
        )
    })?;

    let blocked = fabric.block_wires(netlist.committed_wires());
    if blocked > 0 {
        log::info!("{} wires already used by routed nets", blocked);
    }
    Ok((fabric, netlist))
}

fn run_routing(
    config: &Config,
    net: Option<&str>,
    confirm: &mut dyn GrowthConfirm,
) -> anyhow::Result<()> {
    let (fabric, mut netlist) = load_design(config)?;
    let mut ctx = RouteContext::from_config(fabric, &config.selection);

    log::info!("Starting Routing...");
    let summary = fpga_router::route(&mut ctx, &mut netlist, &config.routing, net, confirm)
        .map_err(|e| anyhow::anyhow!(e))?;

    for report in &summary.reports {
        for sink in report.failed() {
            log::warn!("Net {}: sink {} unrouted", report.net, sink.name);
        }
    }
    for (name, e) in &summary.errors {
        log::error!("Net {}: {}", name, e);
    }

    log::info!("Writing routed netlist to {}", config.input.output_netlist);
    let mut out = BufWriter::new(File::create(&config.input.output_netlist)?);
    parser::netlist::write(&netlist, &ctx.fabric, &mut out)?;
    out.flush()?;

    if let Some(png) = &config.input.visualization {
        log::info!("Generating routed visualization...");
        prepare_output_dir(png)?;
        visualization::draw_routed_fabric(
            &ctx.fabric,
            &netlist,
            &ctx.selection,
            png,
            1000,
            1000,
        );
    }

    check::run(&ctx.fabric, &netlist)
        .map_err(|e| anyhow::anyhow!("Verification Failed: {}", e))?;

    if !summary.is_clean() {
        return Err(anyhow::anyhow!(
            "{} sinks unrouted, {} nets failed",
            summary.failed_sinks(),
            summary.errors.len()
        ));
    }
    Ok(())
}
