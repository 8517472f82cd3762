mod clients;
mod config;
mod wiring;

use std::error::Error;
use std::sync::Arc;

use api::state::AppState;
use tokio::net::TcpListener;

use crate::clients::{HttpArtifactStore, HttpPolicyGate, HttpScenarioStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = config::Config::from_env()?;
    let client = reqwest::Client::new();

    let state = AppState::new(
        Arc::new(HttpArtifactStore::new(
            client.clone(),
            config.storage_base_url.clone(),
        )),
        Arc::new(HttpPolicyGate::new(client.clone(), config.gate_url.clone())),
        Arc::new(HttpScenarioStore::new(client, config.scenarios_url.clone())),
    )
    .with_equity_max_points(config.equity_max_points);

    let listener = TcpListener::bind(config.listen_addr).await?;
    axum::serve(listener, wiring::build_app(state)).await?;
    Ok(())
}
