//! Configuration for the search simulator

use std::fs;
use std::path::Path;

use p2p_search::{FileGenConfig, ForwardingKind, NodeId, Result, SearchError, SimTime, DEFAULT_FORWARD_DELAY};

/// Configuration for one search experiment (a batch of runs)
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(default)]
pub struct SearchSimConfig {
    /// Forwarding strategy used by every node
    pub protocol: ForwardingKind,

    /// Free-form label copied into every exported row
    pub tag: String,

    /// Number of back-to-back runs; run r uses seed + r
    pub runs: usize,

    /// Base random seed (None = generate random)
    pub seed: Option<u64>,

    /// Last tick to deliver (None = until the queue drains)
    pub max_time: Option<SimTime>,

    /// Delay of every query hop and response
    pub forward_delay: SimTime,

    pub topology: TopologyConfig,

    pub files: FileGenConfig,

    pub queries: QueryBatchConfig,

    pub output: OutputConfig,
}

impl Default for SearchSimConfig {
    fn default() -> Self {
        Self {
            protocol: ForwardingKind::RandomWalk,
            tag: "default".to_string(),
            runs: 1,
            seed: None,
            max_time: None,
            forward_delay: DEFAULT_FORWARD_DELAY,
            topology: TopologyConfig::default(),
            files: FileGenConfig::default(),
            queries: QueryBatchConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl SearchSimConfig {
    /// Get or generate the base seed
    pub fn resolve_seed(&self) -> u64 {
        self.seed.unwrap_or_else(rand::random)
    }

    /// Setup checks; any failure here is fatal for the experiment.
    pub fn validate(&self) -> Result<()> {
        let n = self.topology.num_nodes;
        if n == 0 {
            return invalid("topology.num_nodes must be at least 1".to_string());
        }
        if self.runs == 0 {
            return invalid("runs must be at least 1".to_string());
        }
        if self.forward_delay == 0 {
            return invalid("forward_delay must be at least 1 tick".to_string());
        }

        match &self.topology.mode {
            TopologyMode::Ring { neighbors } if *neighbors >= n.max(2) => {
                return invalid(format!("ring neighbors {} too large for {} nodes", neighbors, n));
            }
            TopologyMode::Random { degree, .. } if *degree >= n => {
                return invalid(format!("random degree {} must be below num_nodes {}", degree, n));
            }
            TopologyMode::Custom { edges } => {
                if let Some((a, b)) = edges.iter().find(|(a, b)| *a >= n as NodeId || *b >= n as NodeId) {
                    return invalid(format!("edge {}-{} references a node outside 0..{}", a, b, n));
                }
            }
            _ => {}
        }

        self.files.validate()?;
        self.queries.validate(n)
    }
}

fn invalid(reason: String) -> Result<()> {
    Err(SearchError::InvalidConfig(reason))
}

/// Overlay shape
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(default)]
pub struct TopologyConfig {
    /// Node ids are 0..num_nodes
    pub num_nodes: usize,

    pub mode: TopologyMode,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            num_nodes: 50,
            mode: TopologyMode::Random {
                degree: 4,
                undirected: false,
            },
        }
    }
}

/// Topology modes
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TopologyMode {
    /// Ring with `neighbors` links on each side
    Ring { neighbors: usize },

    /// Every node links to `degree` distinct random others
    Random {
        degree: usize,
        #[serde(default)]
        undirected: bool,
    },

    FullyConnected,

    /// Explicit undirected edge list
    Custom { edges: Vec<(NodeId, NodeId)> },
}

/// Query injection plan
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(default)]
pub struct QueryBatchConfig {
    /// Number of queries, qids 1..=count
    pub count: usize,

    /// Initial hop budget of each query
    pub ttl: i32,

    /// Injection time of the first query
    pub start_time: SimTime,

    /// Ticks between consecutive injections
    pub interval: SimTime,

    /// Fixed origin node (None = random node per query)
    pub origin: Option<NodeId>,

    /// Keywords to search for (empty = drawn from category pools)
    pub keywords: Vec<String>,

    /// Category pools used when `keywords` is empty (empty = all)
    pub categories: Vec<String>,
}

impl Default for QueryBatchConfig {
    fn default() -> Self {
        Self {
            count: 1,
            ttl: 3,
            start_time: 0,
            interval: 10,
            origin: Some(0),
            keywords: vec!["league".to_string()],
            categories: Vec::new(),
        }
    }
}

impl QueryBatchConfig {
    fn validate(&self, num_nodes: usize) -> Result<()> {
        if self.ttl < 0 {
            return invalid(format!("queries.ttl must not be negative, got {}", self.ttl));
        }
        if let Some(origin) = self.origin {
            if origin >= num_nodes as NodeId {
                return invalid(format!("queries.origin {} outside 0..{}", origin, num_nodes));
            }
        }
        let last_injection = (self.count.saturating_sub(1) as SimTime)
            .checked_mul(self.interval)
            .and_then(|offset| offset.checked_add(self.start_time));
        if last_injection.is_none() {
            return invalid(format!(
                "queries: {} injections every {} ticks from {} overflow the clock",
                self.count, self.interval, self.start_time
            ));
        }
        if self.keywords.iter().any(|k| k.is_empty()) {
            return invalid("queries.keywords contains an empty keyword".to_string());
        }
        for name in &self.categories {
            name.parse::<p2p_search::Category>()?;
        }
        Ok(())
    }
}

/// Output configuration
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for CSV tables (None = no export)
    pub dir: Option<String>,

    pub summary_file: String,

    pub queries_file: String,

    /// Log every protocol event at debug level
    pub trace_events: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: None,
            summary_file: "summary.csv".to_string(),
            queries_file: "queries.csv".to_string(),
            trace_events: false,
        }
    }
}

// ============================================================================
// Scenario files
// ============================================================================

/// Scenario file format
#[derive(Debug, serde::Deserialize)]
pub struct ScenarioFile {
    /// Scenario metadata
    #[serde(default)]
    pub meta: ScenarioMeta,

    /// Experiment configuration
    #[serde(default)]
    pub config: SearchSimConfig,
}

#[derive(Debug, Default, serde::Deserialize)]
pub struct ScenarioMeta {
    pub name: Option<String>,
    pub description: Option<String>,
    pub hypothesis: Option<String>,
}

impl ScenarioFile {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let scenario: ScenarioFile = serde_yaml::from_str(yaml)?;
        scenario.config.validate()?;
        Ok(scenario)
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::from_yaml(&fs::read_to_string(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(SearchSimConfig::default().validate().is_ok());
    }

    #[test]
    fn test_parse_full_scenario() {
        let yaml = r#"
meta:
  name: ring flood
config:
  protocol: flood
  tag: ring8
  runs: 3
  seed: 42
  topology:
    num_nodes: 8
    mode:
      type: ring
      neighbors: 1
  files:
    files_per_peer: 5
  queries:
    count: 4
    ttl: 2
    origin: null
    keywords: []
    categories: [tech, games]
  output:
    dir: out
"#;
        let scenario = ScenarioFile::from_yaml(yaml).unwrap();
        let config = scenario.config;

        assert_eq!(scenario.meta.name.as_deref(), Some("ring flood"));
        assert_eq!(config.protocol, ForwardingKind::Flood);
        assert_eq!(config.runs, 3);
        assert_eq!(config.seed, Some(42));
        assert!(matches!(config.topology.mode, TopologyMode::Ring { neighbors: 1 }));
        assert_eq!(config.files.files_per_peer, 5);
        assert_eq!(config.files.in_category_fraction, 0.8);
        assert_eq!(config.queries.count, 4);
        assert_eq!(config.queries.origin, None);
        assert_eq!(config.queries.interval, 10);
        assert_eq!(config.output.dir.as_deref(), Some("out"));
        assert_eq!(config.output.summary_file, "summary.csv");
    }

    #[test]
    fn test_unknown_protocol_is_fatal() {
        let yaml = "config:\n  protocol: gossip\n";
        assert!(matches!(ScenarioFile::from_yaml(yaml), Err(SearchError::Yaml(_))));
    }

    #[test]
    fn test_unknown_category_is_fatal() {
        let yaml = "config:\n  queries:\n    keywords: []\n    categories: [cooking]\n";
        assert!(matches!(
            ScenarioFile::from_yaml(yaml),
            Err(SearchError::UnknownCategory(_))
        ));
    }

    #[test]
    fn test_invalid_topology() {
        let mut config = SearchSimConfig::default();
        config.topology = TopologyConfig {
            num_nodes: 4,
            mode: TopologyMode::Random {
                degree: 4,
                undirected: false,
            },
        };
        assert!(matches!(config.validate(), Err(SearchError::InvalidConfig(_))));

        config.topology.mode = TopologyMode::Custom {
            edges: vec![(0, 1), (2, 9)],
        };
        assert!(matches!(config.validate(), Err(SearchError::InvalidConfig(_))));

        config.topology.mode = TopologyMode::Ring { neighbors: 1 };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_queries() {
        let mut config = SearchSimConfig::default();
        config.queries.ttl = -1;
        assert!(config.validate().is_err());

        let mut config = SearchSimConfig::default();
        config.queries.origin = Some(500);
        assert!(config.validate().is_err());

        let mut config = SearchSimConfig::default();
        config.queries.count = 3;
        config.queries.interval = SimTime::MAX / 2 + 1;
        assert!(matches!(config.validate(), Err(SearchError::InvalidConfig(_))));

        // a single query never needs the interval
        config.queries.count = 1;
        assert!(config.validate().is_ok());
    }
}
