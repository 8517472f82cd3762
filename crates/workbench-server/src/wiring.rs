use axum::{routing::get, Router};

use api::state::AppState;

pub fn build_app(state: AppState) -> Router {
    debug_assert!(engine::module_ready());
    debug_assert!(overlay::module_ready());
    debug_assert!(api::module_ready());

    api::app(state).route("/health", get(healthcheck))
}

async fn healthcheck() -> &'static str {
    "ok"
}
