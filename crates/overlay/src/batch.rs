use serde::{Deserialize, Serialize};

use crate::expectation::evaluate_expectations;
use crate::gate::{GateRequest, PolicyGate};
use crate::scenario::Scenario;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItem {
    pub scenario: String,
    pub passed: bool,
    pub details: Vec<String>,
}

/// Scorecard across one full regression sweep. Construct through
/// [`BatchReport::from_items`] so the counts are derived from the items and
/// `total == passed + failed` holds by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub items: Vec<BatchItem>,
}

impl BatchReport {
    pub fn from_items(items: Vec<BatchItem>) -> Self {
        let total = items.len();
        let passed = items.iter().filter(|item| item.passed).count();
        Self {
            total,
            passed,
            failed: total - passed,
            items,
        }
    }
}

/// Validates every scenario, one gate request each, in declaration order.
/// A gate failure for one scenario becomes a failing item whose sole detail
/// is the transport error; the remaining scenarios still run.
pub async fn run_all_scenarios(gate: &dyn PolicyGate, scenarios: &[Scenario]) -> BatchReport {
    let mut items = Vec::with_capacity(scenarios.len());
    for scenario in scenarios {
        items.push(validate_one(gate, scenario).await);
    }
    BatchReport::from_items(items)
}

async fn validate_one(gate: &dyn PolicyGate, scenario: &Scenario) -> BatchItem {
    let label = scenario.display_label().to_string();
    match gate.assess(&GateRequest::for_scenario(scenario)).await {
        Ok(response) => {
            let report = evaluate_expectations(&response.risk_overlay, &scenario.expectations);
            BatchItem {
                scenario: label,
                passed: report.passed,
                details: report.details,
            }
        }
        Err(error) => BatchItem {
            scenario: label,
            passed: false,
            details: vec![format!("FAIL gate request: {error}")],
        },
    }
}
