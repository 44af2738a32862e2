// Protocol Comparison: Flood vs Random Walk
//
// Runs the same query batch over the same overlay (same seed) with both
// forwarding strategies and a range of TTLs, then prints success rate,
// latency and message cost side by side.
//
// Expected: flooding serves more queries at low TTL but pays for it with
// far more forwards; a random walk needs a larger TTL to reach the same
// success rate.

mod search;

use p2p_search::ForwardingKind;
use search::{run_experiment, QueryBatchConfig, SearchSimConfig, TopologyConfig, TopologyMode};
use simple_logger::SimpleLogger;

const SEED: u64 = 2024;
const TTLS: [i32; 4] = [1, 2, 4, 8];

struct Row {
    protocol: ForwardingKind,
    ttl: i32,
    success: f64,
    latency: f64,
    forwards_per_query: f64,
}

fn run_simulation(protocol: ForwardingKind, ttl: i32) -> Option<Row> {
    let config = SearchSimConfig {
        protocol,
        tag: format!("ttl{}", ttl),
        runs: 3,
        seed: Some(SEED),
        topology: TopologyConfig {
            num_nodes: 200,
            mode: TopologyMode::Random {
                degree: 4,
                undirected: true,
            },
        },
        queries: QueryBatchConfig {
            count: 100,
            ttl,
            interval: 5,
            origin: None,
            keywords: Vec::new(),
            ..QueryBatchConfig::default()
        },
        ..SearchSimConfig::default()
    };

    let reports = match run_experiment(&config) {
        Ok(reports) => reports,
        Err(e) => {
            log::error!("{} ttl {} failed: {}", protocol, ttl, e);
            return None;
        }
    };

    let runs = reports.len() as f64;
    let mut success = 0.0;
    let mut latency = 0.0;
    let mut forwards = 0.0;
    for report in &reports {
        let s = &report.summary;
        success += s.served as f64 / s.injected.max(1) as f64;
        latency += s.avg_latency;
        forwards += s.forwards as f64 / s.injected.max(1) as f64;
    }

    Some(Row {
        protocol,
        ttl,
        success: success / runs,
        latency: latency / runs,
        forwards_per_query: forwards / runs,
    })
}

fn main() {
    SimpleLogger::new().with_level(log::LevelFilter::Warn).init().unwrap();

    println!("\n╔════════════════════════════════════════════════════════╗");
    println!("║  PROTOCOL COMPARISON: Flood vs Random Walk            ║");
    println!("╚════════════════════════════════════════════════════════╝\n");

    let mut rows = Vec::new();
    for protocol in [ForwardingKind::Flood, ForwardingKind::RandomWalk] {
        for ttl in TTLS {
            if let Some(row) = run_simulation(protocol, ttl) {
                rows.push(row);
            }
        }
    }

    println!("{:<12} {:>4} {:>10} {:>10} {:>14}", "protocol", "ttl", "success", "latency", "fwd/query");
    println!("{}", "─".repeat(54));
    for row in &rows {
        println!(
            "{:<12} {:>4} {:>9.1}% {:>10.2} {:>14.1}",
            row.protocol.label(),
            row.ttl,
            row.success * 100.0,
            row.latency,
            row.forwards_per_query
        );
    }
    println!();
}
