use std::fmt;

use async_trait::async_trait;

use crate::run::{Mode, RunIndex};

pub const RUN_INDEX_ARTIFACT: &str = "index.json";
pub const RUN_CONFIG_ARTIFACT: &str = "run_config.json";
pub const COMPARISON_ARTIFACT: &str = "comparison.md";

pub fn metrics_artifact(mode: Mode) -> String {
    format!("metrics_{}.json", mode.as_str())
}

pub fn equity_artifact(mode: Mode) -> String {
    format!("equity_curve_{}.csv", mode.as_str())
}

pub fn history_artifact(mode: Mode) -> String {
    format!("history_{}.csv", mode.as_str())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    NotFound,
    Transport(String),
    Decode(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "artifact not found"),
            Self::Transport(detail) => write!(f, "transport failure: {detail}"),
            Self::Decode(detail) => write!(f, "undecodable response: {detail}"),
        }
    }
}

impl std::error::Error for FetchError {}

/// Read-only view over one backtest storage root. Implementations live at
/// the transport edge; everything behind this trait treats a failed fetch
/// as absence, not as an error.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Tag naming the storage root a run was served from.
    fn root(&self) -> &str {
        "storage"
    }

    async fn fetch_index(&self) -> Result<RunIndex, FetchError>;

    async fn fetch_artifact(&self, run_id: &str, name: &str) -> Result<String, FetchError>;
}
