use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, Config};
use crate::handlers::{
    create_event, delete_event, get_event, health_check, list_events, method_not_allowed,
    update_event,
};
use crate::services::EventService;
use crate::store::EventStore;

#[derive(Clone)]
pub struct AppState {
    pub events: EventService,
}

impl AppState {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self {
            events: EventService::new(store),
        }
    }
}

pub fn create_routes(state: AppState, config: &Config) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route(
            "/api/events",
            get(list_events)
                .post(create_event)
                .head(method_not_allowed),
        )
        .route(
            "/api/events/:id",
            get(get_event)
                .patch(update_event)
                .delete(delete_event)
                .head(method_not_allowed),
        )
        .with_state(state)
        .layer(create_cors_layer(config.allowed_origin.clone()))
        .layer(TraceLayer::new_for_http())
}
