use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::{format_description, PrimitiveDateTime};

use crate::allocation::Allocation;

/// Strategy variant of a run. Mode A is committee-driven, mode B is
/// signal-driven; each produces its own metrics, equity curve and history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Mode {
    A,
    B,
}

impl Mode {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "A" => Some(Self::A),
            "B" => Some(Self::B),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
        }
    }

    /// Default display mode: A when available, else B, else none.
    pub fn preferred(available: impl IntoIterator<Item = Mode>) -> Option<Mode> {
        let mut saw_b = false;
        for mode in available {
            match mode {
                Mode::A => return Some(Mode::A),
                Mode::B => saw_b = true,
            }
        }
        saw_b.then_some(Mode::B)
    }
}

/// Free-form indicator map produced by a run (sortino_ratio, sharpe_ratio,
/// cagr, max_drawdown, total_return, ...). No fixed schema; read known keys
/// through [`metric_number`].
pub type Metrics = serde_json::Map<String, Value>;

pub fn metric_number(metrics: &Metrics, key: &str) -> Option<f64> {
    let number = match metrics.get(key)? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: String,
    pub equity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: String,
    #[serde(default)]
    pub root: String,
    #[serde(default)]
    pub last_modified_iso: String,
    #[serde(default)]
    pub last_modified_ts: Option<f64>,
    #[serde(default)]
    pub modes: Vec<Mode>,
    #[serde(default)]
    pub metrics: BTreeMap<Mode, Metrics>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunIndex {
    #[serde(default)]
    pub root: String,
    #[serde(default)]
    pub runs: Vec<RunSummary>,
}

/// Orders runs newest-first. The storage index usually arrives sorted, but
/// the ordering is re-derived here so a stale or hand-edited index still
/// renders newest-first. Runs without a usable timestamp sort last, keeping
/// their incoming relative order.
pub fn sort_most_recent_first(runs: &mut [RunSummary]) {
    runs.sort_by(|a, b| modification_key(b).total_cmp(&modification_key(a)));
}

fn modification_key(run: &RunSummary) -> f64 {
    run.last_modified_ts
        .filter(|ts| ts.is_finite())
        .or_else(|| parse_local_iso(&run.last_modified_iso))
        .unwrap_or(0.0)
}

/// Parses the index's local-time stamp (`YYYY-MM-DDTHH:MM:SS`, no timezone
/// suffix) into a sortable epoch value.
fn parse_local_iso(value: &str) -> Option<f64> {
    let format = format_description::parse("[year]-[month]-[day]T[hour]:[minute]:[second]").ok()?;
    let parsed = PrimitiveDateTime::parse(value.trim(), &format).ok()?;
    Some(parsed.assume_utc().unix_timestamp() as f64)
}

/// One rebalance entry. `fields` carries every column of the source row as
/// text; `date`, `equity` and `allocation` are the typed views over the
/// semantic columns. An `equity` cell that fails numeric coercion stays
/// reachable through `fields`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRow {
    pub date: String,
    pub equity: Option<f64>,
    pub allocation: Option<Allocation>,
    pub fields: BTreeMap<String, String>,
}

/// Snapshot of one run's artifacts, rebuilt from storage on every request.
/// `files` records per-artifact presence, which keeps "absent" and
/// "present but empty" distinguishable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunDetail {
    pub run_id: String,
    pub root: String,
    pub files: BTreeMap<String, bool>,
    pub config: Option<serde_json::Map<String, Value>>,
    pub metrics: BTreeMap<Mode, Metrics>,
    pub equity: BTreeMap<Mode, Vec<EquityPoint>>,
    pub history: BTreeMap<Mode, Vec<HistoryRow>>,
    pub comparison_md: Option<String>,
    pub default_mode: Option<Mode>,
}
