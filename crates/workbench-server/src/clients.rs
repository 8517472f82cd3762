use async_trait::async_trait;
use reqwest::StatusCode;

use engine::run::RunIndex;
use engine::store::{ArtifactStore, FetchError, RUN_INDEX_ARTIFACT};
use overlay::gate::{
    GateError, GateRequest, GateResponse, PolicyGate, ScenarioStore, ScenarioStoreError,
};
use overlay::scenario::Scenario;

/// Read-only client for the backtest storage root. Every artifact lives at
/// `{base}/{run_id}/{name}`; the index at `{base}/index.json`.
#[derive(Debug, Clone)]
pub struct HttpArtifactStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpArtifactStore {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl ArtifactStore for HttpArtifactStore {
    fn root(&self) -> &str {
        "remote"
    }

    async fn fetch_index(&self) -> Result<RunIndex, FetchError> {
        let url = join_url(&self.base_url, &[RUN_INDEX_ARTIFACT]);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| FetchError::Transport(err.to_string()))?;
        if !response.status().is_success() {
            return Err(fetch_status_error(response.status()));
        }
        response
            .json()
            .await
            .map_err(|err| FetchError::Decode(err.to_string()))
    }

    async fn fetch_artifact(&self, run_id: &str, name: &str) -> Result<String, FetchError> {
        let url = join_url(&self.base_url, &[run_id, name]);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| FetchError::Transport(err.to_string()))?;
        if !response.status().is_success() {
            return Err(fetch_status_error(response.status()));
        }
        response
            .text()
            .await
            .map_err(|err| FetchError::Decode(err.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct HttpPolicyGate {
    client: reqwest::Client,
    url: String,
}

impl HttpPolicyGate {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl PolicyGate for HttpPolicyGate {
    async fn assess(&self, request: &GateRequest) -> Result<GateResponse, GateError> {
        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|err| GateError::Transport(err.to_string()))?;
        if !response.status().is_success() {
            return Err(GateError::Transport(format!(
                "unexpected status {}",
                response.status()
            )));
        }
        response
            .json()
            .await
            .map_err(|err| GateError::Decode(err.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct HttpScenarioStore {
    client: reqwest::Client,
    url: String,
}

impl HttpScenarioStore {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl ScenarioStore for HttpScenarioStore {
    async fn list_scenarios(&self) -> Result<Vec<Scenario>, ScenarioStoreError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|err| ScenarioStoreError::Transport(err.to_string()))?;
        if !response.status().is_success() {
            return Err(ScenarioStoreError::Transport(format!(
                "unexpected status {}",
                response.status()
            )));
        }
        response
            .json()
            .await
            .map_err(|err| ScenarioStoreError::Decode(err.to_string()))
    }

    async fn replace_scenarios(&self, scenarios: &[Scenario]) -> Result<(), ScenarioStoreError> {
        let response = self
            .client
            .post(&self.url)
            .json(&scenarios)
            .send()
            .await
            .map_err(|err| ScenarioStoreError::Transport(err.to_string()))?;
        if !response.status().is_success() {
            return Err(ScenarioStoreError::Transport(format!(
                "unexpected status {}",
                response.status()
            )));
        }
        Ok(())
    }
}

fn join_url(base: &str, segments: &[&str]) -> String {
    let mut url = base.trim_end_matches('/').to_string();
    for segment in segments {
        url.push('/');
        url.push_str(segment);
    }
    url
}

fn fetch_status_error(status: StatusCode) -> FetchError {
    if status == StatusCode::NOT_FOUND {
        FetchError::NotFound
    } else {
        FetchError::Transport(format!("unexpected status {status}"))
    }
}
