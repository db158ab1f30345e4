use axum::http::StatusCode;

pub mod events;

pub use events::{create_event, delete_event, get_event, list_events, update_event};

pub async fn health_check() -> &'static str {
    "ok"
}

/// axum answers HEAD through a `get` route unless one is registered.
pub async fn method_not_allowed() -> StatusCode {
    StatusCode::METHOD_NOT_ALLOWED
}
