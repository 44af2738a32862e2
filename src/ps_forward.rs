use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::Rng;

use crate::ps_error::SearchError;
use crate::ps_interface::{Neighborhood, NodeId};
use crate::ps_message::Query;

/// Next-hop policy of a search node.
///
/// Called only after the local search missed and TTL allows another hop.
/// Returns the targets together with the already advanced query for each;
/// an empty result ends this branch of the search.
pub trait ForwardingStrategy {
    fn name(&self) -> &'static str;

    fn decide(
        &self,
        node: NodeId,
        query: &Query,
        links: &dyn Neighborhood,
        rng: &mut StdRng,
    ) -> Vec<(NodeId, Query)>;
}

/// Copy to every neighbor except self and the node the query came from.
///
/// Neighbors that already saw the qid still get a copy; duplicates are
/// suppressed by the receiver.
pub struct Flood;

impl ForwardingStrategy for Flood {
    fn name(&self) -> &'static str {
        "flood"
    }

    fn decide(
        &self,
        node: NodeId,
        query: &Query,
        links: &dyn Neighborhood,
        _rng: &mut StdRng,
    ) -> Vec<(NodeId, Query)> {
        links
            .neighbors(node)
            .iter()
            .filter(|&&nb| nb != node && nb != query.sender)
            .map(|&nb| (nb, query.advance_hop(node)))
            .collect()
    }
}

/// Exactly one neighbor: the first usable one when scanning the neighbor
/// list circularly from a uniform random offset.
pub struct RandomWalk;

impl RandomWalk {
    fn pick_neighbor(neighbors: &[NodeId], node: NodeId, sender: NodeId, rng: &mut StdRng) -> Option<NodeId> {
        let degree = neighbors.len();
        if degree == 0 {
            return None;
        }

        let start = rng.gen_range(0..degree);
        (0..degree)
            .map(|i| neighbors[(start + i) % degree])
            .find(|&nb| nb != node && nb != sender)
    }
}

impl ForwardingStrategy for RandomWalk {
    fn name(&self) -> &'static str {
        "random_walk"
    }

    fn decide(
        &self,
        node: NodeId,
        query: &Query,
        links: &dyn Neighborhood,
        rng: &mut StdRng,
    ) -> Vec<(NodeId, Query)> {
        Self::pick_neighbor(links.neighbors(node), node, query.sender, rng)
            .map(|next| vec![(next, query.advance_hop(node))])
            .unwrap_or_default()
    }
}

// ============================================================================
// Protocol selection
// ============================================================================

/// Forwarding policy selected by configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForwardingKind {
    Flood,
    #[default]
    RandomWalk,
}

impl ForwardingKind {
    pub fn strategy(&self) -> Box<dyn ForwardingStrategy> {
        match self {
            ForwardingKind::Flood => Box::new(Flood),
            ForwardingKind::RandomWalk => Box::new(RandomWalk),
        }
    }

    /// Value of the `protocol` column in exported tables.
    pub fn label(&self) -> &'static str {
        match self {
            ForwardingKind::Flood => "flood",
            ForwardingKind::RandomWalk => "random_walk",
        }
    }
}

impl fmt::Display for ForwardingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ForwardingKind {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flood" | "flooding" => Ok(ForwardingKind::Flood),
            "random_walk" | "randomwalk" | "random-walk" | "rw" => Ok(ForwardingKind::RandomWalk),
            _ => Err(SearchError::UnknownProtocol(s.to_string())),
        }
    }
}
