use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can stop a run. Field-level problems in the status
/// document never show up here, they are defaulted by the transformer.
#[derive(Debug, Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("fetch of {url} timed out after {elapsed:?}")]
    Timeout { url: String, elapsed: Duration },

    #[error("failed to parse nginx status document: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("failed to serialize discovery document: {0}")]
    Serialize(#[source] serde_json::Error),
}
