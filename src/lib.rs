//! # p2p-search - Keyword Search over an Unstructured Overlay
//!
//! Protocol core for simulating keyword search in an unstructured
//! peer-to-peer network. Every peer stores a small set of labeled files;
//! queries travel hop by hop under a pluggable forwarding strategy and every
//! match is reported straight back to the node that asked.
//!
//! ## Core Components
//!
//! - **SearchNode**: per-node message handling (dedup, local search, TTL, forwarding)
//! - **ForwardingStrategy**: next-hop policy; `Flood` and `RandomWalk` are provided
//! - **Peer**: local file store and keyword index, generated per node from the run seed
//! - **SearchStats**: counters, per-query timing and the derived latency/throughput
//!
//! ## Usage with a Scheduler
//!
//! The library does not own time or topology. A driver:
//! 1. Implements [`Neighborhood`] over its overlay
//! 2. Creates one `SearchNode` per node id and calls `on_simulation_start`
//! 3. Delivers each due `MessageEnvelope` through `node.handle_message()`
//! 4. Schedules the envelopes pushed by the handler `delay` ticks later
//!
//! ```no_run
//! use p2p_search::{ForwardingKind, SearchNode, SearchStats};
//!
//! let mut stats = SearchStats::new();
//! let node = SearchNode::new(0, ForwardingKind::Flood.strategy());
//! stats.reset();
//! ```
//!
//! The `simulator/` binaries contain a complete discrete-event driver with
//! ring, random and custom topologies, YAML scenarios and CSV export.

pub mod ps_error;
pub mod ps_files;
pub mod ps_forward;
pub mod ps_interface;
pub mod ps_message;
pub mod ps_node;
pub mod ps_peer;
pub mod ps_stats;

// Re-export commonly used types
pub use ps_error::{Result, SearchError};
pub use ps_files::FileGenConfig;
pub use ps_forward::{Flood, ForwardingKind, ForwardingStrategy, RandomWalk};
pub use ps_interface::{
    CollectorSink, Event, EventSink, LogSink, Message, MessageEnvelope, Neighborhood, NoOpSink,
    NodeId, QueryId, SimTime, DEFAULT_FORWARD_DELAY,
};
pub use ps_message::{Query, Response};
pub use ps_node::{SearchContext, SearchNode};
pub use ps_peer::{Category, Peer};
pub use ps_stats::{QueryRow, SearchStats, SummaryRow};
