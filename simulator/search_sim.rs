//! Keyword Search Simulation
//!
//! Run with: cargo run --bin search_sim -- [--protocol flood|random_walk] [--seed N]
//!           [--runs N] [--nodes N] [--queries N] [--ttl N] [--out DIR] [--verbose]
//!
//! Without options this reproduces the classic single query: "league" from
//! node 0 with ttl 3 over a 50-node random overlay.

mod search;

use std::env;
use std::process;

use log::{error, info, LevelFilter};
use p2p_search::ForwardingKind;
use search::{run_experiment, SearchSimConfig};
use simple_logger::SimpleLogger;

fn main() {
    let args: Vec<String> = env::args().collect();

    let verbose = args.iter().any(|a| a == "--verbose" || a == "-v");
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    SimpleLogger::new().with_level(level).init().unwrap();

    println!("╔════════════════════════════════════════════════════════╗");
    println!("║        Keyword Search Simulator                        ║");
    println!("╚════════════════════════════════════════════════════════╝\n");

    let config = match parse_args(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            eprintln!("\nUsage: {} [--protocol flood|random_walk] [--seed N] [--runs N] [--nodes N] [--queries N] [--ttl N] [--out DIR] [--verbose]", args[0]);
            process::exit(1);
        }
    };

    info!("Configuration:");
    info!("  Protocol: {}", config.protocol);
    info!("  Nodes: {}", config.topology.num_nodes);
    info!("  Topology: {:?}", config.topology.mode);
    info!("  Queries: {} (ttl {})", config.queries.count, config.queries.ttl);
    info!("  Runs: {}", config.runs);
    info!("");

    let reports = match run_experiment(&config) {
        Ok(reports) => reports,
        Err(e) => {
            error!("Simulation failed: {}", e);
            process::exit(1);
        }
    };

    for report in &reports {
        report.print_summary();
    }

    info!("✓ Simulation complete!");
}

/// Apply command line overrides on top of the default experiment.
fn parse_args(args: &[String]) -> Result<SearchSimConfig, String> {
    let mut config = SearchSimConfig::default();

    let mut i = 1;
    while i < args.len() {
        let flag = args[i].as_str();
        if flag == "--verbose" || flag == "-v" {
            config.output.trace_events = true;
            i += 1;
            continue;
        }

        let value = args
            .get(i + 1)
            .ok_or_else(|| format!("missing value for {}", flag))?;

        match flag {
            "--protocol" => {
                config.protocol = value.parse::<ForwardingKind>().map_err(|e| e.to_string())?;
            }
            "--seed" => config.seed = Some(parse_number(flag, value)?),
            "--runs" => config.runs = parse_number(flag, value)?,
            "--nodes" => config.topology.num_nodes = parse_number(flag, value)?,
            "--queries" => {
                config.queries.count = parse_number(flag, value)?;
                // a batch asks for random keywords from random origins
                if config.queries.count > 1 {
                    config.queries.origin = None;
                    config.queries.keywords.clear();
                }
            }
            "--ttl" => config.queries.ttl = parse_number(flag, value)?,
            "--out" => config.output.dir = Some(value.clone()),
            _ => return Err(format!("unknown option {}", flag)),
        }
        i += 2;
    }

    Ok(config)
}

fn parse_number<T: std::str::FromStr>(flag: &str, value: &str) -> Result<T, String> {
    value
        .parse::<T>()
        .map_err(|_| format!("invalid value '{}' for {}", value, flag))
}
