use chrono::{Datelike, NaiveTime};
use serde::Deserialize;
use std::ops::RangeInclusive;
use std::sync::Arc;

use crate::models::{Event, EventFilter, EventPatch, NewEvent, Period};
use crate::store::EventStore;
use crate::utils::AppError;

const TIME_FORMATS: [&str; 2] = ["%H:%M", "%H:%M:%S"];

/// Four-digit years only; keeps every date representable by both chrono
/// and the Postgres `date` column.
pub const YEAR_RANGE: RangeInclusive<i32> = 1..=9999;

/// Raw query string of `GET /api/events`. Kept as strings so malformed
/// numbers surface as our own 400 messages.
#[derive(Debug, Default, Deserialize)]
pub struct ListEventsParams {
    pub year: Option<String>,
    pub month: Option<String>,
    pub calendar_id: Option<String>,
    pub user_id: Option<String>,
}

impl ListEventsParams {
    /// `year` and `month` go together; `month` is 1-based.
    pub fn into_filter(self) -> Result<EventFilter, AppError> {
        let period = match (self.year.as_deref(), self.month.as_deref()) {
            (None, None) => None,
            (year, month) => {
                let year: i32 = parse_param(year, "Invalid year")?;
                if !YEAR_RANGE.contains(&year) {
                    return Err(AppError::ValidationError("Invalid year".to_string()));
                }
                let month: u32 = parse_param(month, "Invalid month")?;
                let period = Period::month(year, month)
                    .ok_or_else(|| AppError::ValidationError("Invalid month".to_string()))?;
                Some(period)
            }
        };

        let calendar_id = self
            .calendar_id
            .as_deref()
            .map(|raw| parse_param(Some(raw), "Invalid calendar_id"))
            .transpose()?;
        let user_id = self
            .user_id
            .as_deref()
            .map(|raw| parse_param(Some(raw), "Invalid user_id"))
            .transpose()?;

        Ok(EventFilter {
            period,
            calendar_id,
            user_id,
        })
    }
}

fn parse_param<T: std::str::FromStr>(raw: Option<&str>, message: &str) -> Result<T, AppError> {
    raw.and_then(|value| value.trim().parse().ok())
        .ok_or_else(|| AppError::ValidationError(message.to_string()))
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(raw.trim(), format).ok())
}

fn validate(event: &NewEvent) -> Result<(), AppError> {
    if !YEAR_RANGE.contains(&event.date.year()) {
        return Err(AppError::ValidationError("Invalid date".to_string()));
    }
    let from = parse_time(&event.time_from)
        .ok_or_else(|| AppError::ValidationError("Invalid time_from".to_string()))?;
    let until = parse_time(&event.time_until)
        .ok_or_else(|| AppError::ValidationError("Invalid time_until".to_string()))?;
    if from > until {
        return Err(AppError::ValidationError(
            "time_from must not be after time_until".to_string(),
        ));
    }
    Ok(())
}

#[derive(Clone)]
pub struct EventService {
    store: Arc<dyn EventStore>,
}

impl EventService {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, filter: &EventFilter) -> Result<Vec<Event>, AppError> {
        let events = self.store.list(filter).await?;
        tracing::debug!(count = events.len(), ?filter, "Listed events");
        Ok(events)
    }

    pub async fn get(&self, id: i32) -> Result<Event, AppError> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    pub async fn create(&self, event: NewEvent) -> Result<i32, AppError> {
        validate(&event)?;
        let id = self.store.create(&event).await?;
        tracing::info!(event_id = id, calendar_id = event.calendar_id, "Created event");
        Ok(id)
    }

    pub async fn update(&self, id: i32, patch: EventPatch) -> Result<Event, AppError> {
        let current = self.get(id).await?;
        let merged = patch.apply(current.into());
        validate(&merged)?;

        let updated = self
            .store
            .update(id, &merged)
            .await?
            .ok_or_else(|| not_found(id))?;
        tracing::info!(event_id = id, "Updated event");
        Ok(updated)
    }

    pub async fn delete(&self, id: i32) -> Result<(), AppError> {
        if !self.store.delete(id).await? {
            return Err(not_found(id));
        }
        tracing::info!(event_id = id, "Deleted event");
        Ok(())
    }
}

fn not_found(id: i32) -> AppError {
    AppError::NotFound(format!("Event {} not found", id))
}
