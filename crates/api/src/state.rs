use std::sync::Arc;

use engine::downsample::DEFAULT_MAX_POINTS;
use engine::store::ArtifactStore;
use overlay::gate::{PolicyGate, ScenarioStore};

/// Request-handling context: the three external collaborators plus the
/// equity display budget. Handlers own no other state — every response is
/// rebuilt from collaborator data.
#[derive(Clone)]
pub struct AppState {
    pub(crate) store: Arc<dyn ArtifactStore>,
    pub(crate) gate: Arc<dyn PolicyGate>,
    pub(crate) scenarios: Arc<dyn ScenarioStore>,
    pub(crate) equity_max_points: usize,
}

impl AppState {
    pub fn new(
        store: Arc<dyn ArtifactStore>,
        gate: Arc<dyn PolicyGate>,
        scenarios: Arc<dyn ScenarioStore>,
    ) -> Self {
        Self {
            store,
            gate,
            scenarios,
            equity_max_points: DEFAULT_MAX_POINTS,
        }
    }

    pub fn with_equity_max_points(mut self, equity_max_points: usize) -> Self {
        self.equity_max_points = equity_max_points;
        self
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
