mod common;
mod guests;

pub use common::common_routes;
pub use guests::guest_routes;

use crate::state::AppState;
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;

/// Full application: common routes at the root, guest routes under `/api/v1`,
/// request bodies capped at `body_limit` bytes.
pub fn app(state: AppState, body_limit: usize) -> Router {
    Router::new()
        .merge(common_routes(state.clone()))
        .nest("/api/v1", guest_routes(state))
        .layer(RequestBodyLimitLayer::new(body_limit))
}
