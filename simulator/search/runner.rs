//! Search simulation runner

use super::config::SearchSimConfig;
use super::driver::QueryDriver;
use super::export::CsvExporter;
use super::scheduler::{EventQueue, ScheduledDelivery};
use super::topology::SimTopology;
use p2p_search::{
    EventSink, LogSink, Neighborhood, NoOpSink, NodeId, QueryRow, Result, SearchContext,
    SearchNode, SearchStats, SimTime, SummaryRow,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;

/// Files shown per peer in the start-of-run debug dump
const SAMPLE_FILES: usize = 3;

/// One run: a fresh overlay, fresh nodes and a fresh queue, all derived
/// from a single seed.
pub struct SearchRunner {
    config: SearchSimConfig,
    run: usize,
    seed: u64,
    rng: StdRng,

    topology: SimTopology,
    nodes: BTreeMap<NodeId, SearchNode>,
    queue: EventQueue,
    sink: Box<dyn EventSink>,

    injected: usize,
    delivered: u64,
    unknown_targets: u64,
}

impl SearchRunner {
    pub fn new(config: &SearchSimConfig, run: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let topology = SimTopology::build(&config.topology, &mut rng);

        let nodes = topology
            .node_ids()
            .into_iter()
            .map(|id| (id, SearchNode::new(id, config.protocol.strategy())))
            .collect();

        let sink: Box<dyn EventSink> = if config.output.trace_events {
            Box::new(LogSink)
        } else {
            Box::new(NoOpSink)
        };

        Self {
            config: config.clone(),
            run,
            seed,
            rng,
            topology,
            nodes,
            queue: EventQueue::new(),
            sink,
            injected: 0,
            delivered: 0,
            unknown_targets: 0,
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&SearchNode> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SearchNode> {
        self.nodes.get_mut(&id)
    }

    /// Run to completion (queue drained or `max_time` reached).
    /// `stats` is expected to be reset by the caller.
    pub fn run(&mut self, stats: &mut SearchStats) -> Result<RunReport> {
        log::info!(
            "run {} start: protocol={} tag={} nodes={} links={} seed={}",
            self.run,
            self.config.protocol,
            self.config.tag,
            self.topology.len(),
            self.topology.link_count(),
            self.seed
        );

        // 1. Generate local stores
        self.start_nodes();

        // 2. Plan and queue the query batch
        let driver = QueryDriver::new(&self.config.queries)?;
        let plan = driver.plan(self.config.topology.num_nodes, &mut self.rng);
        self.injected = QueryDriver::inject(plan, &mut self.queue, stats, self.config.max_time);

        // 3. Deliver until nothing is due
        while let Some(delivery) = self.queue.pop_due(self.config.max_time) {
            self.deliver(delivery, stats);
        }

        let report = self.finalize(stats);
        log::info!(
            "run {} end: t={} served {}/{} avg_latency={:.2} forwards={}",
            self.run,
            report.end_time,
            report.summary.served,
            report.summary.injected,
            report.summary.avg_latency,
            report.summary.forwards
        );
        Ok(report)
    }

    fn start_nodes(&mut self) {
        for (id, node) in self.nodes.iter_mut() {
            let peer = node.on_simulation_start(&mut self.rng, &self.config.files);

            if log::log_enabled!(log::Level::Debug) {
                log::debug!(
                    "node {} [{}] neighbors={:?}",
                    id,
                    peer.category,
                    self.topology.neighbors(*id)
                );
                log::debug!("node {} sample files={:?}", id, peer.sample(SAMPLE_FILES));
            }
        }
    }

    fn deliver(&mut self, delivery: ScheduledDelivery, stats: &mut SearchStats) {
        let envelope = delivery.envelope;
        let node = match self.nodes.get_mut(&envelope.receiver) {
            Some(node) => node,
            None => {
                log::warn!(
                    "t={} dropping qid {} for unknown node {}",
                    delivery.time,
                    envelope.message.qid(),
                    envelope.receiver
                );
                self.unknown_targets += 1;
                return;
            }
        };

        let mut outgoing = Vec::new();
        let mut ctx = SearchContext {
            time: delivery.time,
            links: &self.topology,
            rng: &mut self.rng,
            stats: &mut *stats,
            sink: &mut *self.sink,
            forward_delay: self.config.forward_delay,
        };
        node.handle_message(&envelope, &mut ctx, &mut outgoing);
        self.delivered += 1;

        for next in outgoing {
            self.queue.schedule(next);
        }
    }

    fn finalize(&self, stats: &SearchStats) -> RunReport {
        let protocol = self.config.protocol.label();
        RunReport {
            run: self.run,
            seed: self.seed,
            nodes: self.topology.len(),
            links: self.topology.link_count(),
            end_time: self.queue.now(),
            delivered: self.delivered,
            undelivered: self.queue.len(),
            unknown_targets: self.unknown_targets,
            summary: stats.summary(protocol, &self.config.tag, self.run),
            queries: stats.query_rows(protocol, &self.config.tag, self.run),
        }
    }
}

/// Run every configured run back to back and export each one.
///
/// Run `r` uses `seed + r`. Export failures are logged and do not stop the
/// batch; configuration errors do.
pub fn run_experiment(config: &SearchSimConfig) -> Result<Vec<RunReport>> {
    config.validate()?;

    let seed = config.resolve_seed();
    if config.seed.is_none() {
        log::info!("no seed configured, using {} (set `seed` to reproduce)", seed);
    }

    let exporter = CsvExporter::from_config(&config.output);
    let mut stats = SearchStats::new();
    let mut reports = Vec::with_capacity(config.runs);

    for run in 0..config.runs {
        stats.reset();
        let mut runner = SearchRunner::new(config, run, seed.wrapping_add(run as u64));
        let report = runner.run(&mut stats)?;

        if let Some(exporter) = &exporter {
            match exporter.export(&report) {
                Ok(()) => log::info!("run {} exported to {}", run, exporter.dir().display()),
                Err(e) => log::error!("export of run {} failed: {}", run, e),
            }
        }
        reports.push(report);
    }

    Ok(reports)
}

// ============================================================================
// Results
// ============================================================================

/// Outcome of one run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run: usize,
    pub seed: u64,
    pub nodes: usize,
    pub links: usize,

    /// Time of the last delivery
    pub end_time: SimTime,
    pub delivered: u64,
    /// Still queued when the end time was reached
    pub undelivered: usize,
    pub unknown_targets: u64,

    pub summary: SummaryRow,
    pub queries: Vec<QueryRow>,
}

impl RunReport {
    pub fn print_summary(&self) {
        let s = &self.summary;

        println!("\n╔════════════════════════════════════════════════════════╗");
        println!("║        Search Simulation Results                      ║");
        println!("╚════════════════════════════════════════════════════════╝\n");

        println!("Configuration:");
        println!("  Protocol: {}", s.protocol);
        println!("  Tag: {}", s.tag);
        println!("  Run: {} (seed {})", self.run, self.seed);
        println!("  Overlay: {} nodes, {} links\n", self.nodes, self.links);

        println!("Queries:");
        println!("  Injected: {}", s.injected);
        if s.injected > 0 {
            println!(
                "  Served: {} ({:.1}%)",
                s.served,
                s.served as f64 * 100.0 / s.injected as f64
            );
        } else {
            println!("  Served: {}", s.served);
        }
        println!("  Avg latency: {:.2} ticks", s.avg_latency);
        println!("  Throughput: {:.4} served/tick", s.throughput);
        println!();

        println!("Messages:");
        println!("  Query forwards: {}", s.forwards);
        println!("  Hits sent: {}", s.hits_sent);
        println!("  Hits received at origin: {}", s.hits_recv);
        println!("  Deliveries: {}", self.delivered);
        if self.undelivered > 0 {
            println!("  Undelivered at end time: {}", self.undelivered);
        }
        if self.unknown_targets > 0 {
            println!("  Dropped (unknown node): {}", self.unknown_targets);
        }
        println!();

        let unserved: Vec<_> = self.queries.iter().filter(|q| q.hit.is_none()).map(|q| q.qid).collect();
        if !unserved.is_empty() && unserved.len() <= 20 {
            println!("Unserved qids: {:?}\n", unserved);
        }

        println!("Simulation ended at t={}", self.end_time);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::config::{QueryBatchConfig, TopologyConfig, TopologyMode};
    use p2p_search::{Category, ForwardingKind, Message, MessageEnvelope, Peer, Query};

    fn ring_config(protocol: ForwardingKind, n: usize, keyword: &str, ttl: i32) -> SearchSimConfig {
        SearchSimConfig {
            protocol,
            seed: Some(1),
            topology: TopologyConfig {
                num_nodes: n,
                mode: TopologyMode::Ring { neighbors: 1 },
            },
            queries: QueryBatchConfig {
                ttl,
                keywords: vec![keyword.to_string()],
                ..QueryBatchConfig::default()
            },
            ..SearchSimConfig::default()
        }
    }

    #[test]
    fn test_origin_hit_on_four_ring() {
        let config = ring_config(ForwardingKind::RandomWalk, 4, "java", 2);
        let mut runner = SearchRunner::new(&config, 0, 1);
        runner
            .node_mut(0)
            .unwrap()
            .set_store(Peer::new(Category::Tech, vec!["tech_java_7.txt".to_string()]));

        let mut stats = SearchStats::new();
        let report = runner.run(&mut stats).unwrap();

        assert_eq!(stats.hits_sent, 1);
        assert_eq!(stats.query_forwards, 0);
        assert_eq!(stats.hit_time(1), Some(1));
        assert_eq!(report.summary.served, 1);
        assert_eq!(report.summary.avg_latency, 1.0);
        assert_eq!(report.end_time, 1);
        assert_eq!(report.delivered, 2);
        // stores of the other nodes were still generated
        assert_eq!(runner.node(3).unwrap().store().unwrap().files.len(), 10);
    }

    #[test]
    fn test_flood_reaches_whole_ring() {
        let config = ring_config(ForwardingKind::Flood, 6, "nothing", 10);
        let mut runner = SearchRunner::new(&config, 0, 7);
        let mut stats = SearchStats::new();

        let report = runner.run(&mut stats).unwrap();

        for id in 0..6 {
            assert!(runner.node(id).unwrap().has_seen(1));
        }
        assert_eq!(stats.query_forwards, 7);
        assert_eq!(report.summary.served, 0);
        assert_eq!(report.queries.len(), 1);
        assert_eq!(report.queries[0].hit, None);
    }

    #[test]
    fn test_same_seed_same_run() {
        let mut config = ring_config(ForwardingKind::RandomWalk, 30, "league", 6);
        config.topology.mode = TopologyMode::Random {
            degree: 3,
            undirected: false,
        };
        config.queries.count = 20;
        config.queries.origin = None;
        config.queries.keywords = Vec::new();

        let a = SearchRunner::new(&config, 0, 99).run(&mut SearchStats::new()).unwrap();
        let b = SearchRunner::new(&config, 0, 99).run(&mut SearchStats::new()).unwrap();

        assert_eq!(a.summary, b.summary);
        assert_eq!(a.queries, b.queries);
        assert_eq!(a.delivered, b.delivered);
    }

    #[test]
    fn test_end_time_leaves_queue() {
        let mut config = ring_config(ForwardingKind::Flood, 10, "nothing", 10);
        config.max_time = Some(2);
        let mut runner = SearchRunner::new(&config, 0, 1);

        let report = runner.run(&mut SearchStats::new()).unwrap();

        assert!(report.end_time <= 2);
        assert!(report.undelivered > 0);
        assert!(!runner.node(5).unwrap().has_seen(1));
    }

    #[test]
    fn test_unknown_receiver_is_dropped() {
        let config = ring_config(ForwardingKind::Flood, 4, "nothing", 0);
        let mut runner = SearchRunner::new(&config, 0, 1);
        runner.queue.schedule_at(
            0,
            MessageEnvelope {
                sender: 0,
                receiver: 99,
                delay: 0,
                message: Message::Query(Query::new(50, 0, "java", 1)),
            },
        );

        let report = runner.run(&mut SearchStats::new()).unwrap();
        assert_eq!(report.unknown_targets, 1);
        assert_eq!(report.delivered, 1);
    }

    #[test]
    fn test_experiment_resets_stats_per_run() {
        let mut config = ring_config(ForwardingKind::Flood, 8, "league", 3);
        config.runs = 3;
        config.seed = Some(40);
        config.queries.count = 4;

        let reports = run_experiment(&config).unwrap();

        assert_eq!(reports.len(), 3);
        for (r, report) in reports.iter().enumerate() {
            assert_eq!(report.run, r);
            assert_eq!(report.seed, 40 + r as u64);
            assert_eq!(report.summary.run, r);
            assert_eq!(report.summary.injected, 4);
        }
    }

    #[test]
    fn test_huge_forward_delay_completes() {
        let mut config = ring_config(ForwardingKind::Flood, 6, "nothing", 4);
        config.forward_delay = SimTime::MAX;

        let reports = run_experiment(&config).unwrap();

        let report = &reports[0];
        assert_eq!(report.end_time, SimTime::MAX);
        assert_eq!(report.undelivered, 0);
        assert!(report.summary.forwards > 0);
    }

    #[test]
    fn test_experiment_rejects_invalid_config() {
        let mut config = SearchSimConfig::default();
        config.topology.num_nodes = 0;
        assert!(run_experiment(&config).is_err());
    }
}
