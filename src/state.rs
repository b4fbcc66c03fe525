//! Shared application state for all routes.

use crate::service::GuestRepository;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<GuestRepository>,
}

impl AppState {
    pub fn new(repo: GuestRepository) -> Self {
        AppState { repo: Arc::new(repo) }
    }
}
