pub mod routes;
pub mod state;

use axum::Router;

pub fn module_ready() -> bool {
    true
}

pub fn app(state: state::AppState) -> Router {
    routes::router(state)
}
