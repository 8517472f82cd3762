use std::fmt;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use engine::assemble::assemble_run_detail;
use engine::run::{sort_most_recent_first, RunDetail, RunIndex};
use overlay::batch::{run_all_scenarios, BatchItem, BatchReport};
use overlay::expectation::evaluate_expectations;
use overlay::gate::GateRequest;
use overlay::scenario::Scenario;

use crate::state::{AppState, ErrorBody};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/backtest/runs", get(list_runs))
        .route("/api/backtest/runs/:run_id", get(run_detail))
        .route("/api/scenarios", get(list_scenarios).post(replace_scenarios))
        .route("/api/scenarios/validate_all", post(validate_all))
        .route("/api/scenarios/:scenario_id/validate", post(validate_one))
        .with_state(state)
}

type GatewayError = (StatusCode, Json<ErrorBody>);

fn bad_gateway(error: impl fmt::Display) -> GatewayError {
    (
        StatusCode::BAD_GATEWAY,
        Json(ErrorBody {
            error: error.to_string(),
        }),
    )
}

async fn list_runs(State(state): State<AppState>) -> Result<Json<RunIndex>, GatewayError> {
    let mut index = state.store.fetch_index().await.map_err(bad_gateway)?;
    sort_most_recent_first(&mut index.runs);
    Ok(Json(index))
}

async fn run_detail(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> Result<Json<RunDetail>, StatusCode> {
    let detail =
        assemble_run_detail(state.store.as_ref(), &run_id, state.equity_max_points).await;

    // a run with zero present artifacts is indistinguishable from no run
    if detail.files.values().any(|present| *present) {
        Ok(Json(detail))
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

async fn list_scenarios(State(state): State<AppState>) -> Result<Json<Vec<Scenario>>, GatewayError> {
    state
        .scenarios
        .list_scenarios()
        .await
        .map(Json)
        .map_err(bad_gateway)
}

async fn replace_scenarios(
    State(state): State<AppState>,
    Json(scenarios): Json<Vec<Scenario>>,
) -> Result<StatusCode, GatewayError> {
    state
        .scenarios
        .replace_scenarios(&scenarios)
        .await
        .map_err(bad_gateway)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn validate_one(
    State(state): State<AppState>,
    Path(scenario_id): Path<String>,
) -> Result<Json<BatchItem>, GatewayError> {
    let scenarios = state.scenarios.list_scenarios().await.map_err(bad_gateway)?;
    let Some(scenario) = scenarios.iter().find(|scenario| scenario.id == scenario_id) else {
        return Err((
            StatusCode::NOT_FOUND,
            Json(ErrorBody {
                error: format!("unknown scenario: {scenario_id}"),
            }),
        ));
    };

    let request = GateRequest::for_scenario(scenario);
    let response = state.gate.assess(&request).await.map_err(bad_gateway)?;
    let report = evaluate_expectations(&response.risk_overlay, &scenario.expectations);

    Ok(Json(BatchItem {
        scenario: scenario.display_label().to_string(),
        passed: report.passed,
        details: report.details,
    }))
}

async fn validate_all(State(state): State<AppState>) -> Result<Json<BatchReport>, GatewayError> {
    let scenarios = state.scenarios.list_scenarios().await.map_err(bad_gateway)?;
    let report = run_all_scenarios(state.gate.as_ref(), &scenarios).await;
    Ok(Json(report))
}
