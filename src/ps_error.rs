use thiserror::Error;

/// Setup and reporting errors.
///
/// The message-handling path never fails; only configuration, startup and
/// export produce these.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("unknown category: {0}")]
    UnknownCategory(String),

    #[error("unknown protocol: {0} (expected flood or random_walk)")]
    UnknownProtocol(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, SearchError>;
