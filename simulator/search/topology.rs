//! Static overlay used by the search simulator.

use std::collections::BTreeMap;

use p2p_search::{Neighborhood, NodeId};
use rand::rngs::StdRng;
use rand::seq::index;

use super::config::{TopologyConfig, TopologyMode};

/// Directed adjacency lists keyed by node id. Neighbor order is the
/// insertion order, which keeps runs reproducible.
#[derive(Debug, Clone, Default)]
pub struct SimTopology {
    links: BTreeMap<NodeId, Vec<NodeId>>,
}

impl SimTopology {
    /// Nodes 0..num_nodes with no links.
    pub fn empty(num_nodes: usize) -> Self {
        let links = (0..num_nodes as NodeId).map(|id| (id, Vec::new())).collect();
        Self { links }
    }

    /// Build from configuration. Expects a validated config.
    pub fn build(config: &TopologyConfig, rng: &mut StdRng) -> Self {
        let n = config.num_nodes;
        match &config.mode {
            TopologyMode::Ring { neighbors } => Self::ring(n, *neighbors),
            TopologyMode::Random { degree, undirected } => Self::random(n, *degree, *undirected, rng),
            TopologyMode::FullyConnected => Self::fully_connected(n),
            TopologyMode::Custom { edges } => Self::custom(n, edges),
        }
    }

    /// Each node links to `k` successors and `k` predecessors.
    pub fn ring(num_nodes: usize, k: usize) -> Self {
        let mut topo = Self::empty(num_nodes);
        let n = num_nodes as NodeId;
        for id in 0..n {
            for d in 1..=k as NodeId {
                topo.add_link(id, (id + d) % n);
                topo.add_link(id, (id + n - d % n) % n);
            }
        }
        topo
    }

    /// Every node gets `degree` distinct random out-links. With `undirected`
    /// each link is mirrored, so degrees can end up above `degree`.
    pub fn random(num_nodes: usize, degree: usize, undirected: bool, rng: &mut StdRng) -> Self {
        let mut topo = Self::empty(num_nodes);
        if num_nodes < 2 {
            return topo;
        }
        let degree = degree.min(num_nodes - 1);

        for id in 0..num_nodes as NodeId {
            // sample among the other n-1 nodes, then shift past self
            for pick in index::sample(rng, num_nodes - 1, degree).into_iter() {
                let mut target = pick as NodeId;
                if target >= id {
                    target += 1;
                }
                if undirected {
                    topo.add_undirected(id, target);
                } else {
                    topo.add_link(id, target);
                }
            }
        }
        topo
    }

    pub fn fully_connected(num_nodes: usize) -> Self {
        let mut topo = Self::empty(num_nodes);
        let n = num_nodes as NodeId;
        for a in 0..n {
            for b in 0..n {
                if a != b {
                    topo.add_link(a, b);
                }
            }
        }
        topo
    }

    /// Undirected edge list over nodes 0..num_nodes. Endpoints outside
    /// that range are rejected by config validation.
    pub fn custom(num_nodes: usize, edges: &[(NodeId, NodeId)]) -> Self {
        let mut topo = Self::empty(num_nodes);
        for &(a, b) in edges {
            topo.add_undirected(a, b);
        }
        topo
    }

    /// Add a directed link, ignoring duplicates.
    pub fn add_link(&mut self, from: NodeId, to: NodeId) {
        self.links.entry(to).or_default();
        let list = self.links.entry(from).or_default();
        if !list.contains(&to) {
            list.push(to);
        }
    }

    pub fn add_undirected(&mut self, a: NodeId, b: NodeId) {
        self.add_link(a, b);
        self.add_link(b, a);
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.links.contains_key(&node)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.values().map(Vec::len).sum()
    }
}

impl Neighborhood for SimTopology {
    fn neighbors(&self, node: NodeId) -> &[NodeId] {
        self.links.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    fn node_ids(&self) -> Vec<NodeId> {
        self.links.keys().copied().collect()
    }
}
