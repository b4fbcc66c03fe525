//! Guest and master-list routes.

use crate::handlers::{guests, master};
use crate::state::AppState;
use axum::{
    routing::{get, patch},
    Router,
};

pub fn guest_routes(state: AppState) -> Router {
    Router::new()
        .route("/guests", get(guests::list).post(guests::create))
        .route("/guests/confirmed", get(guests::confirmed))
        .route("/guests/confirmed/count", get(guests::confirmed_count))
        .route("/guests/summary", get(guests::summary))
        .route("/guests/search", get(guests::search))
        .route(
            "/guests/:id",
            get(guests::read).put(guests::update).delete(guests::delete),
        )
        .route("/guests/:id/companions", patch(guests::update_companions))
        .route("/master/search", get(master::search))
        .route("/confirmation-message", get(master::message))
        .with_state(state)
}
