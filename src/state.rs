//! Shared application state injected into handlers.

use std::sync::Arc;

use crate::application::services::TourService;

#[derive(Clone)]
pub struct AppState {
    pub tour_service: Arc<TourService>,
}

impl AppState {
    pub fn new(tour_service: Arc<TourService>) -> Self {
        Self { tour_service }
    }
}
