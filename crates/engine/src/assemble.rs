use std::collections::BTreeMap;

use serde_json::Value;

use crate::allocation::decode_allocation_text;
use crate::downsample::downsample;
use crate::run::{HistoryRow, Metrics, Mode, RunDetail};
use crate::store::{
    equity_artifact, history_artifact, metrics_artifact, ArtifactStore, COMPARISON_ARTIFACT,
    RUN_CONFIG_ARTIFACT,
};
use crate::tabular::{read_points, read_records};

/// Parse budget for equity documents. The downsampler, not the parser,
/// owns display sizing.
pub const EQUITY_ROW_BUDGET: usize = 10_000;

/// Builds a fresh [`RunDetail`] for one run. All eight artifact fetches run
/// concurrently and every one of them may fail or be absent without failing
/// the others: a missing artifact leaves its slot empty and its presence
/// flag false. Nothing is cached between calls.
pub async fn assemble_run_detail(
    store: &dyn ArtifactStore,
    run_id: &str,
    max_points: usize,
) -> RunDetail {
    let metrics_a_name = metrics_artifact(Mode::A);
    let metrics_b_name = metrics_artifact(Mode::B);
    let equity_a_name = equity_artifact(Mode::A);
    let equity_b_name = equity_artifact(Mode::B);
    let history_a_name = history_artifact(Mode::A);
    let history_b_name = history_artifact(Mode::B);

    let (
        config_text,
        metrics_a_text,
        metrics_b_text,
        equity_a_text,
        equity_b_text,
        history_a_text,
        history_b_text,
        comparison_text,
    ) = tokio::join!(
        fetch_optional(store, run_id, RUN_CONFIG_ARTIFACT),
        fetch_optional(store, run_id, &metrics_a_name),
        fetch_optional(store, run_id, &metrics_b_name),
        fetch_optional(store, run_id, &equity_a_name),
        fetch_optional(store, run_id, &equity_b_name),
        fetch_optional(store, run_id, &history_a_name),
        fetch_optional(store, run_id, &history_b_name),
        fetch_optional(store, run_id, COMPARISON_ARTIFACT),
    );

    let mut files = BTreeMap::new();
    files.insert(RUN_CONFIG_ARTIFACT.to_string(), config_text.is_some());
    files.insert(metrics_a_name, metrics_a_text.is_some());
    files.insert(metrics_b_name, metrics_b_text.is_some());
    files.insert(equity_a_name, equity_a_text.is_some());
    files.insert(equity_b_name, equity_b_text.is_some());
    files.insert(history_a_name, history_a_text.is_some());
    files.insert(history_b_name, history_b_text.is_some());
    files.insert(COMPARISON_ARTIFACT.to_string(), comparison_text.is_some());

    let mut metrics = BTreeMap::new();
    for (mode, text) in [(Mode::A, metrics_a_text), (Mode::B, metrics_b_text)] {
        if let Some(parsed) = text.as_deref().and_then(parse_object) {
            metrics.insert(mode, parsed);
        }
    }

    let mut equity = BTreeMap::new();
    for (mode, text) in [(Mode::A, equity_a_text), (Mode::B, equity_b_text)] {
        if let Some(text) = text {
            equity.insert(
                mode,
                downsample(read_points(&text, EQUITY_ROW_BUDGET), max_points),
            );
        }
    }

    let mut history = BTreeMap::new();
    for (mode, text) in [(Mode::A, history_a_text), (Mode::B, history_b_text)] {
        if let Some(text) = text {
            history.insert(mode, history_rows(&text));
        }
    }

    let default_mode = Mode::preferred(metrics.keys().copied());

    RunDetail {
        run_id: run_id.to_string(),
        root: store.root().to_string(),
        files,
        config: config_text.as_deref().and_then(parse_object),
        metrics,
        equity,
        history,
        comparison_md: comparison_text,
        default_mode,
    }
}

async fn fetch_optional(store: &dyn ArtifactStore, run_id: &str, name: &str) -> Option<String> {
    store.fetch_artifact(run_id, name).await.ok()
}

fn parse_object(text: &str) -> Option<Metrics> {
    match serde_json::from_str(text) {
        Ok(Value::Object(object)) => Some(object),
        _ => None,
    }
}

fn history_rows(text: &str) -> Vec<HistoryRow> {
    read_records(text, None).into_iter().map(history_row).collect()
}

fn history_row(fields: BTreeMap<String, String>) -> HistoryRow {
    let date = fields.get("date").cloned().unwrap_or_default();
    let equity = fields
        .get("equity")
        .and_then(|raw| raw.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite());
    let allocation = fields
        .get("allocation")
        .and_then(|raw| decode_allocation_text(raw));

    HistoryRow {
        date,
        equity,
        allocation,
        fields,
    }
}
