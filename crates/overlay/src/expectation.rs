use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::scenario::{Expectation, Expectations};

/// Tolerance applied to approximate-equality assertions that omit their own.
pub const DEFAULT_APPROX_TOLERANCE: f64 = 0.05;

/// Computed guardrails: multiplicative scalers plus absolute caps. Values
/// stay loosely typed — assertions resolve them to finite numbers at lookup
/// time and treat anything else as missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskOverlay {
    pub multipliers: BTreeMap<String, Value>,
    pub absolute: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Le,
    Ge,
    Lt,
    Gt,
    Eq,
    Ne,
    Approx,
}

impl CompareOp {
    pub fn parse(token: &str) -> Option<Self> {
        match token.trim() {
            "<=" | "≤" => Some(Self::Le),
            ">=" | "≥" => Some(Self::Ge),
            "<" => Some(Self::Lt),
            ">" => Some(Self::Gt),
            "=" | "==" => Some(Self::Eq),
            "!=" | "≠" => Some(Self::Ne),
            "~" | "≈" | "approx" => Some(Self::Approx),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Le => "<=",
            Self::Ge => ">=",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Approx => "~",
        }
    }

    fn holds(self, actual: f64, expected: f64, tolerance: f64) -> bool {
        match self {
            Self::Le => actual <= expected,
            Self::Ge => actual >= expected,
            Self::Lt => actual < expected,
            Self::Gt => actual > expected,
            Self::Eq => actual == expected,
            Self::Ne => actual != expected,
            Self::Approx => (actual - expected).abs() <= tolerance,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Multipliers,
    Absolute,
}

impl Scope {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "multipliers" => Some(Self::Multipliers),
            "absolute" => Some(Self::Absolute),
            _ => None,
        }
    }
}

/// Which map an actual value was resolved from. `MultiplierFallback` marks
/// an unscoped key that missed the guardrail map — worth flagging in the
/// report, since such assertions are scope-ambiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedFrom {
    Multipliers,
    Absolute,
    MultiplierFallback,
}

/// Resolution table for an assertion's actual value:
///
/// - scope `multipliers`: the multiplier map.
/// - scope `absolute`: the guardrail map.
/// - no scope, key `risk_multiplier`: the multiplier map.
/// - no scope, any other key: the guardrail map, then the multiplier map.
pub fn resolve_actual(
    key: &str,
    scope: Option<Scope>,
    overlay: &RiskOverlay,
) -> Option<(f64, ResolvedFrom)> {
    match scope {
        Some(Scope::Multipliers) => {
            finite_number(&overlay.multipliers, key).map(|v| (v, ResolvedFrom::Multipliers))
        }
        Some(Scope::Absolute) => {
            finite_number(&overlay.absolute, key).map(|v| (v, ResolvedFrom::Absolute))
        }
        None if key == "risk_multiplier" => {
            finite_number(&overlay.multipliers, key).map(|v| (v, ResolvedFrom::Multipliers))
        }
        None => finite_number(&overlay.absolute, key)
            .map(|v| (v, ResolvedFrom::Absolute))
            .or_else(|| {
                finite_number(&overlay.multipliers, key)
                    .map(|v| (v, ResolvedFrom::MultiplierFallback))
            }),
    }
}

fn finite_number(map: &BTreeMap<String, Value>, key: &str) -> Option<f64> {
    let number = match map.get(key)? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

/// Per-scenario verdict: one explanation line per assertion, in declaration
/// order, and an overall flag that holds iff every assertion held.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub passed: bool,
    pub details: Vec<String>,
}

/// Checks every expectation against the overlay. Total: a malformed entry
/// (unknown operator, missing metric) becomes a failing line, never a panic
/// or an error.
pub fn evaluate_expectations(overlay: &RiskOverlay, expectations: &Expectations) -> ValidationReport {
    let mut passed = true;
    let mut details = Vec::with_capacity(expectations.len());

    for (key, expectation) in expectations.iter() {
        let (ok, line) = evaluate_one(overlay, key, expectation);
        passed &= ok;
        details.push(line);
    }

    ValidationReport { passed, details }
}

fn evaluate_one(overlay: &RiskOverlay, key: &str, expectation: &Expectation) -> (bool, String) {
    let Some(op) = CompareOp::parse(&expectation.op) else {
        return (
            false,
            format!("FAIL {key}: unknown operator {:?}", expectation.op),
        );
    };

    let scope = expectation.scope.as_deref().and_then(Scope::parse);
    let Some((actual, source)) = resolve_actual(key, scope, overlay) else {
        return (false, format!("FAIL {key}: metric not found in overlay result"));
    };

    let tolerance = expectation.tol.unwrap_or(DEFAULT_APPROX_TOLERANCE);
    let ok = op.holds(actual, expectation.value, tolerance);

    let mut line = format!(
        "{} {key} {} {}",
        if ok { "PASS" } else { "FAIL" },
        op.as_str(),
        expectation.value,
    );
    if op == CompareOp::Approx {
        line.push_str(&format!(" ±{tolerance}"));
    }
    line.push_str(&format!(" (actual {actual}"));
    if source == ResolvedFrom::MultiplierFallback {
        line.push_str(", via multipliers");
    }
    line.push(')');

    (ok, line)
}
