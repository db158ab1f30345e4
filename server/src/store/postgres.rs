use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};

use super::{EventStore, StoreError};
use crate::models::{Event, EventFilter, NewEvent};

pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a pool against `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn list(&self, filter: &EventFilter) -> Result<Vec<Event>, StoreError> {
        let (start, end) = match filter.period {
            Some(period) => (Some(period.start), Some(period.end)),
            None => (None, None),
        };

        sqlx::query_as::<_, Event>(
            r#"
            SELECT id, name, category, date, time_from, time_until, calendar_id, user_id
            FROM events
            WHERE ($1::date IS NULL OR date >= $1)
              AND ($2::date IS NULL OR date < $2)
              AND ($3::int IS NULL OR calendar_id = $3)
              AND ($4::int IS NULL OR user_id = $4)
            ORDER BY date, id
            "#,
        )
        .bind(start)
        .bind(end)
        .bind(filter.calendar_id)
        .bind(filter.user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::Query)
    }

    async fn get(&self, id: i32) -> Result<Option<Event>, StoreError> {
        sqlx::query_as::<_, Event>(
            r#"
            SELECT id, name, category, date, time_from, time_until, calendar_id, user_id
            FROM events
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::Query)
    }

    async fn create(&self, event: &NewEvent) -> Result<i32, StoreError> {
        let id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO events (name, category, date, time_from, time_until, calendar_id, user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(&event.name)
        .bind(&event.category)
        .bind(event.date)
        .bind(&event.time_from)
        .bind(&event.time_until)
        .bind(event.calendar_id)
        .bind(event.user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::Persistence)?;

        Ok(id)
    }

    async fn update(&self, id: i32, event: &NewEvent) -> Result<Option<Event>, StoreError> {
        sqlx::query_as::<_, Event>(
            r#"
            UPDATE events
            SET name = $2, category = $3, date = $4, time_from = $5,
                time_until = $6, calendar_id = $7, user_id = $8
            WHERE id = $1
            RETURNING id, name, category, date, time_from, time_until, calendar_id, user_id
            "#,
        )
        .bind(id)
        .bind(&event.name)
        .bind(&event.category)
        .bind(event.date)
        .bind(&event.time_from)
        .bind(&event.time_until)
        .bind(event.calendar_id)
        .bind(event.user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::Persistence)
    }

    async fn delete(&self, id: i32) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(StoreError::Persistence)?;

        Ok(result.rows_affected() > 0)
    }
}
