// Scenario Runner - Load and execute search scenario YAML files
//
// Usage:
//   cargo run --bin scenario_runner scenarios/flood_ring.yaml
//   cargo run --bin scenario_runner scenarios/  (runs all .yaml files in directory)
//   cargo run --bin scenario_runner scenarios/flood_ring.yaml --seed 1234 --verbose

mod search;

use log::LevelFilter;
use search::{run_experiment, ScenarioFile, SearchSimConfig};
use simple_logger::SimpleLogger;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <scenario.yaml | directory/> [--seed SEED] [--verbose]", args[0]);
        eprintln!("\nExamples:");
        eprintln!("  {} scenarios/flood_ring.yaml", args[0]);
        eprintln!("  {} scenarios/", args[0]);
        eprintln!("  {} scenarios/flood_ring.yaml --seed 1234", args[0]);
        std::process::exit(1);
    }

    let verbose = args.iter().any(|a| a == "--verbose");
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    SimpleLogger::new().with_level(level).init().unwrap();

    let path = Path::new(&args[1]);

    // Parse optional seed
    let seed: Option<u64> = match args.iter().position(|a| a == "--seed") {
        Some(i) => match args.get(i + 1).and_then(|s| parse_seed(s)) {
            Some(seed) => Some(seed),
            None => {
                eprintln!("Invalid or missing value for --seed");
                std::process::exit(1);
            }
        },
        None => None,
    };

    let failed = if path.is_file() {
        usize::from(!run_scenario_file(path, seed, verbose))
    } else if path.is_dir() {
        run_scenario_directory(path, seed, verbose)
    } else {
        eprintln!("Error: Path does not exist: {}", path.display());
        std::process::exit(1);
    };

    if failed > 0 {
        std::process::exit(1);
    }
}

/// Returns the number of scenarios that failed.
fn run_scenario_directory(dir: &Path, seed: Option<u64>, verbose: bool) -> usize {
    let scenarios = find_scenarios(dir);

    if scenarios.is_empty() {
        eprintln!("No .yaml files found in {}", dir.display());
        std::process::exit(1);
    }

    println!("\n╔════════════════════════════════════════════════════════╗");
    println!("║  SCENARIO RUNNER - Multiple Scenarios                 ║");
    println!("╚════════════════════════════════════════════════════════╝\n");
    println!("Found {} scenario(s) to run\n", scenarios.len());

    let mut failed = 0;
    for (i, scenario_path) in scenarios.iter().enumerate() {
        println!("\n{}/{} Running: {}\n", i + 1, scenarios.len(), scenario_path.display());
        if !run_scenario_file(scenario_path, seed, verbose) {
            failed += 1;
        }
    }

    println!("\n╔════════════════════════════════════════════════════════╗");
    println!("║  All scenarios complete! ({} failed)                   ", failed);
    println!("╚════════════════════════════════════════════════════════╝\n");
    failed
}

fn find_scenarios(dir: &Path) -> Vec<PathBuf> {
    let mut scenarios = Vec::new();
    if let Ok(entries) = fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            let ext = path.extension().and_then(|s| s.to_str());
            if ext == Some("yaml") || ext == Some("yml") {
                scenarios.push(path);
            }
        }
    }
    scenarios.sort();
    scenarios
}

fn run_scenario_file(path: &Path, seed: Option<u64>, verbose: bool) -> bool {
    println!("Loading scenario from: {}", path.display());

    let scenario = match ScenarioFile::load(path) {
        Ok(scenario) => scenario,
        Err(e) => {
            log::error!("Failed to load {}: {}", path.display(), e);
            return false;
        }
    };

    // Print scenario header
    println!("\n╔════════════════════════════════════════════════════════╗");
    let name = scenario
        .meta
        .name
        .clone()
        .or_else(|| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .unwrap_or_default();
    println!("║  {}  {}", name, " ".repeat(54_usize.saturating_sub(name.len())));
    println!("╚════════════════════════════════════════════════════════╝\n");

    if let Some(ref desc) = scenario.meta.description {
        println!("{}\n", desc);
    }
    if let Some(ref hypothesis) = scenario.meta.hypothesis {
        println!("Hypothesis:");
        println!("  {}\n", hypothesis);
    }

    let mut config = scenario.config;
    apply_overrides(&mut config, seed, verbose);

    println!("Configuration:");
    println!("  Protocol: {}", config.protocol);
    println!("  Nodes: {}", config.topology.num_nodes);
    println!("  Topology: {:?}", config.topology.mode);
    println!("  Queries: {} (ttl {})", config.queries.count, config.queries.ttl);
    println!("  Runs: {}", config.runs);
    println!("\nStarting simulation...\n");

    match run_experiment(&config) {
        Ok(reports) => {
            for report in &reports {
                report.print_summary();
            }
            println!("\n✓ Scenario complete!\n");
            true
        }
        Err(e) => {
            log::error!("Scenario {} failed: {}", path.display(), e);
            false
        }
    }
}

/// Command line settings win over the scenario file.
fn apply_overrides(config: &mut SearchSimConfig, seed: Option<u64>, verbose: bool) {
    if seed.is_some() {
        config.seed = seed;
    }
    if verbose {
        config.output.trace_events = true;
    }
}

fn parse_seed(s: &str) -> Option<u64> {
    match s.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_seed() {
        assert_eq!(parse_seed("42"), Some(42));
        assert_eq!(parse_seed("0x10"), Some(16));
        assert_eq!(parse_seed("zz"), None);
    }

    #[test]
    fn test_overrides() {
        let mut config = SearchSimConfig::default();
        config.seed = Some(5);
        apply_overrides(&mut config, None, false);
        assert_eq!(config.seed, Some(5));
        assert!(!config.output.trace_events);

        apply_overrides(&mut config, Some(9), true);
        assert_eq!(config.seed, Some(9));
        assert!(config.output.trace_events);
    }

    #[test]
    fn test_find_scenarios_filters_and_sorts() {
        let tmp = tempfile::tempdir().unwrap();
        for name in ["b.yaml", "a.yml", "notes.txt"] {
            fs::write(tmp.path().join(name), "config: {}\n").unwrap();
        }

        let found: Vec<_> = find_scenarios(tmp.path())
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(found, vec!["a.yml", "b.yaml"]);
    }

    #[test]
    fn test_scenario_file_runs_and_exports() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("results");
        let yaml = format!(
            "meta:\n  name: tiny\nconfig:\n  protocol: flood\n  seed: 3\n  runs: 2\n  topology:\n    num_nodes: 6\n    mode:\n      type: ring\n      neighbors: 1\n  output:\n    dir: {}\n",
            out.display()
        );
        let file = tmp.path().join("tiny.yaml");
        fs::write(&file, yaml).unwrap();

        assert!(run_scenario_file(&file, None, false));

        let summary = fs::read_to_string(out.join("summary.csv")).unwrap();
        assert_eq!(summary.lines().count(), 3);
    }

    #[test]
    fn test_bad_scenario_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("bad.yaml");
        fs::write(&file, "config:\n  protocol: gossip\n").unwrap();
        assert!(!run_scenario_file(&file, None, false));
    }
}
