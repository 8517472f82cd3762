use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::expectation::RiskOverlay;
use crate::scenario::Scenario;

/// Assessment request: free text plus the maps the gate conditions on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateRequest {
    pub text: String,
    pub features: Map<String, Value>,
    pub portfolio_state: Map<String, Value>,
    pub constraints: Map<String, Value>,
    pub top_k: Option<u32>,
}

impl GateRequest {
    pub fn for_scenario(scenario: &Scenario) -> Self {
        Self {
            text: scenario.description.clone(),
            features: scenario.features.clone(),
            portfolio_state: scenario.portfolio_state.clone(),
            constraints: Map::new(),
            top_k: None,
        }
    }
}

/// Assessment response. Every field is defaulted so a partial payload still
/// decodes; validation consumes only `risk_overlay`, the rest passes through
/// to the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateResponse {
    pub regime: Option<String>,
    pub matched_tags: Vec<String>,
    pub router_ranking: Vec<Value>,
    pub rule_hits: Vec<Value>,
    pub risk_overlay: RiskOverlay,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    Transport(String),
    Decode(String),
}

impl fmt::Display for GateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(detail) => write!(f, "gate transport failure: {detail}"),
            Self::Decode(detail) => write!(f, "undecodable gate response: {detail}"),
        }
    }
}

impl std::error::Error for GateError {}

/// The risk-overlay computation service. One request per scenario; the
/// response is consumed, never recomputed locally.
#[async_trait]
pub trait PolicyGate: Send + Sync {
    async fn assess(&self, request: &GateRequest) -> Result<GateResponse, GateError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenarioStoreError {
    Transport(String),
    Decode(String),
}

impl fmt::Display for ScenarioStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(detail) => write!(f, "scenario transport failure: {detail}"),
            Self::Decode(detail) => write!(f, "undecodable scenario list: {detail}"),
        }
    }
}

impl std::error::Error for ScenarioStoreError {}

/// The scenario collaborator: holds the named regression inputs. `replace`
/// persists a full edited list.
#[async_trait]
pub trait ScenarioStore: Send + Sync {
    async fn list_scenarios(&self) -> Result<Vec<Scenario>, ScenarioStoreError>;

    async fn replace_scenarios(&self, scenarios: &[Scenario]) -> Result<(), ScenarioStoreError>;
}
