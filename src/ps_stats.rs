use std::collections::BTreeMap;

use crate::ps_interface::{QueryId, SimTime};

/// Counters and timing tables of one run.
///
/// One instance is shared by every node of a run (lent `&mut` to each
/// handler call) and cleared with [`SearchStats::reset`] before the next
/// run. Derived metrics are computed on demand, never kept incrementally.
#[derive(Debug, Clone, Default)]
pub struct SearchStats {
    pub query_forwards: u64,
    pub hits_sent: u64,
    pub hits_received_at_origin: u64,

    start_time: BTreeMap<QueryId, SimTime>,
    hit_time: BTreeMap<QueryId, SimTime>,
}

impl SearchStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.query_forwards = 0;
        self.hits_sent = 0;
        self.hits_received_at_origin = 0;
        self.start_time.clear();
        self.hit_time.clear();
    }

    /// Start time of `qid`. Injecting the same qid twice is a caller error:
    /// the first time is kept.
    pub fn record_injection(&mut self, qid: QueryId, time: SimTime) {
        if let Some(first) = self.start_time.get(&qid) {
            log::warn!("qid {} injected again at {} (first at {}), keeping first", qid, time, first);
            return;
        }
        self.start_time.insert(qid, time);
    }

    pub fn record_forward(&mut self) {
        self.query_forwards += 1;
    }

    pub fn record_hit_sent(&mut self) {
        self.hits_sent += 1;
    }

    /// Counts the response and returns true if it was the first for `qid`.
    /// Later responses never move the recorded hit time.
    pub fn record_hit_received(&mut self, qid: QueryId, time: SimTime) -> bool {
        self.hits_received_at_origin += 1;
        if self.hit_time.contains_key(&qid) {
            return false;
        }
        self.hit_time.insert(qid, time);
        true
    }

    pub fn start_time(&self, qid: QueryId) -> Option<SimTime> {
        self.start_time.get(&qid).copied()
    }

    pub fn hit_time(&self, qid: QueryId) -> Option<SimTime> {
        self.hit_time.get(&qid).copied()
    }

    pub fn injected(&self) -> usize {
        self.start_time.len()
    }

    pub fn served(&self) -> usize {
        self.hit_time.len()
    }

    pub fn latency(&self, qid: QueryId) -> Option<SimTime> {
        match (self.start_time.get(&qid), self.hit_time.get(&qid)) {
            (Some(start), Some(hit)) => Some(hit.saturating_sub(*start)),
            _ => None,
        }
    }

    /// Mean of `hit - start` over queries present in both tables, 0 if none.
    pub fn avg_latency(&self) -> f64 {
        let latencies: Vec<SimTime> = self.hit_time.keys().filter_map(|qid| self.latency(*qid)).collect();
        if latencies.is_empty() {
            return 0.0;
        }
        latencies.iter().sum::<SimTime>() as f64 / latencies.len() as f64
    }

    /// Served queries per tick over the window from the first injection to
    /// the last first-hit.
    pub fn throughput(&self) -> f64 {
        let max_hit = match self.hit_time.values().max() {
            Some(t) => *t,
            None => return 0.0,
        };
        let min_start = self.start_time.values().min().copied().unwrap_or(max_hit);
        let window = (max_hit.saturating_sub(min_start) + 1).max(1);
        self.hit_time.len() as f64 / window as f64
    }

    pub fn summary(&self, protocol: &str, tag: &str, run: usize) -> SummaryRow {
        SummaryRow {
            protocol: protocol.to_string(),
            tag: tag.to_string(),
            run,
            injected: self.injected(),
            served: self.served(),
            avg_latency: self.avg_latency(),
            throughput: self.throughput(),
            forwards: self.query_forwards,
            hits_sent: self.hits_sent,
            hits_recv: self.hits_received_at_origin,
        }
    }

    /// One row per injected query, in qid order.
    pub fn query_rows(&self, protocol: &str, tag: &str, run: usize) -> Vec<QueryRow> {
        self.start_time
            .iter()
            .map(|(&qid, &start)| QueryRow {
                protocol: protocol.to_string(),
                tag: tag.to_string(),
                run,
                qid,
                start,
                hit: self.hit_time(qid),
                latency: self.latency(qid),
            })
            .collect()
    }
}

// ============================================================================
// Export rows
// ============================================================================

/// Summary table row, field order = CSV column order.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SummaryRow {
    pub protocol: String,
    pub tag: String,
    pub run: usize,
    pub injected: usize,
    pub served: usize,
    pub avg_latency: f64,
    pub throughput: f64,
    pub forwards: u64,
    #[serde(rename = "hitsSent")]
    pub hits_sent: u64,
    #[serde(rename = "hitsRecv")]
    pub hits_recv: u64,
}

/// Per-query table row. `hit` and `latency` are empty for unserved queries.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct QueryRow {
    pub protocol: String,
    pub tag: String,
    pub run: usize,
    pub qid: QueryId,
    pub start: SimTime,
    pub hit: Option<SimTime>,
    pub latency: Option<SimTime>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_hit_wins() {
        let mut stats = SearchStats::new();
        stats.record_injection(1, 0);

        assert!(stats.record_hit_received(1, 4));
        assert!(!stats.record_hit_received(1, 9));

        assert_eq!(stats.hit_time(1), Some(4));
        assert_eq!(stats.hits_received_at_origin, 2);
        assert_eq!(stats.latency(1), Some(4));
    }

    #[test]
    fn test_injection_set_once() {
        let mut stats = SearchStats::new();
        stats.record_injection(3, 10);
        stats.record_injection(3, 20);
        assert_eq!(stats.start_time(3), Some(10));
        assert_eq!(stats.injected(), 1);
    }

    #[test]
    fn test_empty_metrics() {
        let stats = SearchStats::new();
        assert_eq!(stats.avg_latency(), 0.0);
        assert_eq!(stats.throughput(), 0.0);
        assert!(stats.query_rows("flood", "t", 0).is_empty());
    }

    #[test]
    fn test_avg_latency_and_throughput() {
        let mut stats = SearchStats::new();
        stats.record_injection(1, 0);
        stats.record_injection(2, 5);
        stats.record_injection(3, 10); // never served

        stats.record_hit_received(1, 2);
        stats.record_hit_received(2, 11);

        // latencies 2 and 6
        assert_eq!(stats.avg_latency(), 4.0);
        // 2 served over ticks 0..=11
        assert_eq!(stats.throughput(), 2.0 / 12.0);
        assert_eq!(stats.served(), 2);
        assert_eq!(stats.injected(), 3);
    }

    #[test]
    fn test_throughput_same_tick() {
        let mut stats = SearchStats::new();
        stats.record_injection(1, 7);
        stats.record_hit_received(1, 7);
        assert_eq!(stats.throughput(), 1.0);
    }

    #[test]
    fn test_rows() {
        let mut stats = SearchStats::new();
        stats.record_injection(2, 3);
        stats.record_injection(1, 0);
        stats.record_hit_received(1, 2);
        stats.record_forward();
        stats.record_forward();
        stats.record_hit_sent();

        let summary = stats.summary("flood", "ring", 4);
        assert_eq!(summary.run, 4);
        assert_eq!(summary.injected, 2);
        assert_eq!(summary.served, 1);
        assert_eq!(summary.forwards, 2);
        assert_eq!(summary.hits_sent, 1);
        assert_eq!(summary.hits_recv, 1);

        let rows = stats.query_rows("flood", "ring", 4);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].qid, 1);
        assert_eq!(rows[0].hit, Some(2));
        assert_eq!(rows[0].latency, Some(2));
        assert_eq!(rows[1].qid, 2);
        assert_eq!(rows[1].hit, None);
        assert_eq!(rows[1].latency, None);
    }

    #[test]
    fn test_reset() {
        let mut stats = SearchStats::new();
        stats.record_injection(1, 0);
        stats.record_hit_received(1, 1);
        stats.record_forward();
        stats.record_hit_sent();

        stats.reset();

        assert_eq!(stats.query_forwards, 0);
        assert_eq!(stats.hits_sent, 0);
        assert_eq!(stats.hits_received_at_origin, 0);
        assert_eq!(stats.injected(), 0);
        assert_eq!(stats.served(), 0);
    }
}
