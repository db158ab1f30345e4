use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::models::{Event, EventPatch, NewEvent};
use crate::routes::AppState;
use crate::services::ListEventsParams;
use crate::utils::AppError;

/// Any body the JSON extractor refuses (syntax, shape, content type) is a
/// plain 400.
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            tracing::debug!(reason = %rejection.body_text(), "Rejected request body");
            Err(AppError::ValidationError("Invalid JSON".to_string()))
        }
    }
}

fn event_id(raw: &str) -> Result<i32, AppError> {
    raw.parse()
        .map_err(|_| AppError::ValidationError("Invalid event id".to_string()))
}

/// GET /api/events
pub async fn list_events(
    State(state): State<AppState>,
    Query(params): Query<ListEventsParams>,
) -> Result<Json<Vec<Event>>, AppError> {
    let filter = params.into_filter()?;
    let events = state.events.list(&filter).await?;
    Ok(Json(events))
}

/// POST /api/events
pub async fn create_event(
    State(state): State<AppState>,
    payload: Result<Json<NewEvent>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let event = json_body(payload)?;
    state.events.create(event).await?;
    Ok(StatusCode::CREATED)
}

/// GET /api/events/:id
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Event>, AppError> {
    let event = state.events.get(event_id(&id)?).await?;
    Ok(Json(event))
}

/// PATCH /api/events/:id
pub async fn update_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<EventPatch>, JsonRejection>,
) -> Result<Json<Event>, AppError> {
    let id = event_id(&id)?;
    let patch = json_body(payload)?;
    let event = state.events.update(id, patch).await?;
    Ok(Json(event))
}

/// DELETE /api/events/:id
pub async fn delete_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.events.delete(event_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}
