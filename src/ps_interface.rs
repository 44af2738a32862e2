// all the same numeric type to allow casting/interop with the topology
pub type NodeId = u64;
pub type QueryId = u64;

// virtual ticks of the event scheduler
pub type SimTime = u64;

/// Delay used for every query hop and every response, in ticks.
pub const DEFAULT_FORWARD_DELAY: SimTime = 1;

use crate::ps_message::{Query, Response};

#[derive(Clone, Debug, PartialEq)]
pub enum Message {
    Query(Query),
    Response(Response),
}

impl Message {
    pub fn qid(&self) -> QueryId {
        match self {
            Message::Query(q) => q.qid,
            Message::Response(r) => r.qid,
        }
    }
}

/// A requested delivery: `message` reaches `receiver` after `delay` ticks
/// counted from the time the envelope was produced.
#[derive(Clone, Debug, PartialEq)]
pub struct MessageEnvelope {
    pub sender: NodeId,
    pub receiver: NodeId,
    pub delay: SimTime,
    pub message: Message,
}

// ============================================================================
// Topology access
// ============================================================================

/// Read access to the overlay. Implemented by whatever owns the topology;
/// the search protocol only ever reads it.
pub trait Neighborhood {
    /// Neighbors of `node` in stable order. Unknown nodes have none.
    fn neighbors(&self, node: NodeId) -> &[NodeId];

    fn degree(&self, node: NodeId) -> usize {
        self.neighbors(node).len()
    }

    /// All node ids, stable across a run.
    fn node_ids(&self) -> Vec<NodeId>;
}

// ============================================================================
// Event Logging System
// ============================================================================

/// Events emitted by the search protocol for debugging and analysis
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Query accepted for local processing (first delivery of this qid)
    QueryReceived {
        qid: QueryId,
        keyword: String,
        ttl: i32,
        hops: u32,
        from: NodeId,
        hits: usize,
    },
    /// Query already processed here, delivery ignored
    DuplicateIgnored { qid: QueryId, from: NodeId },
    /// Local match found, response sent to origin
    HitSent {
        qid: QueryId,
        origin: NodeId,
        hits: usize,
    },
    /// Response arrived at this node, with the run counters after counting it
    HitReceived {
        qid: QueryId,
        responder: NodeId,
        hops: u32,
        hits: Vec<String>,
        first: bool,
        forwards: u64,
        hits_sent: u64,
        hits_recv: u64,
    },
    /// Query copy sent to a neighbor
    QueryForwarded {
        qid: QueryId,
        to: NodeId,
        ttl: i32,
    },
    /// No local match and no hop budget left
    QueryDropped { qid: QueryId, hops: u32 },
}

/// Trait for consuming events from the search protocol
pub trait EventSink {
    fn log(&mut self, time: SimTime, node: NodeId, event: Event);
}

/// No-op event sink (zero overhead)
pub struct NoOpSink;

impl EventSink for NoOpSink {
    #[inline(always)]
    fn log(&mut self, _time: SimTime, _node: NodeId, _event: Event) {}
}

/// Sends every event to the `log` facade at debug level.
pub struct LogSink;

impl EventSink for LogSink {
    fn log(&mut self, time: SimTime, node: NodeId, event: Event) {
        match event {
            Event::QueryReceived {
                qid,
                keyword,
                ttl,
                hops,
                from,
                hits,
            } => log::debug!(
                "{:>5} node {} got QUERY qid={} kw='{}' ttl={} hops={} from={} hits={}",
                time,
                node,
                qid,
                keyword,
                ttl,
                hops,
                from,
                hits
            ),
            Event::DuplicateIgnored { qid, from } => {
                log::trace!("{:>5} node {} ignored duplicate qid={} from={}", time, node, qid, from)
            }
            Event::HitSent { qid, origin, hits } => log::debug!(
                "{:>5} node {} sending HIT qid={} ({} files) to origin {}",
                time,
                node,
                qid,
                hits,
                origin
            ),
            Event::HitReceived {
                qid,
                responder,
                hops,
                hits,
                first,
                forwards,
                hits_sent,
                hits_recv,
            } => {
                log::debug!(
                    "{:>5} ORIGIN node {} received HIT qid={} from={} hops={} hits={:?}{}",
                    time,
                    node,
                    qid,
                    responder,
                    hops,
                    hits,
                    if first { " (first)" } else { "" }
                );
                log::debug!(
                    "{:>5} STATS: forwards={} hitsSent={} hitsRecvAtOrigin={}",
                    time,
                    forwards,
                    hits_sent,
                    hits_recv
                );
            }
            Event::QueryForwarded { qid, to, ttl } => {
                log::trace!("{:>5} node {} forward qid={} -> {} ttl={}", time, node, qid, to, ttl)
            }
            Event::QueryDropped { qid, hops } => {
                log::debug!("{:>5} node {} dropped qid={} at hops={} (ttl exhausted)", time, node, qid, hops)
            }
        }
    }
}

/// Collects events in memory for programmatic analysis
#[derive(Default)]
pub struct CollectorSink {
    pub events: Vec<(SimTime, NodeId, Event)>,
}

impl CollectorSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn count<F: Fn(&Event) -> bool>(&self, filter: F) -> usize {
        self.events.iter().filter(|(_, _, e)| filter(e)).count()
    }
}

impl EventSink for CollectorSink {
    fn log(&mut self, time: SimTime, node: NodeId, event: Event) {
        self.events.push((time, node, event));
    }
}
