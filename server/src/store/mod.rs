//! Storage seam for events.
//!
//! Handlers never touch a pool directly; they go through [`EventStore`] so
//! the Postgres backend can be swapped for [`InMemoryEventStore`] in tests.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Event, EventFilter, NewEvent};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryEventStore;
pub use postgres::PgEventStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A read failed.
    #[error("query failed: {0}")]
    Query(#[source] sqlx::Error),

    /// A write (insert, update, delete) failed.
    #[error("write failed: {0}")]
    Persistence(#[source] sqlx::Error),
}

#[async_trait]
pub trait EventStore: Send + Sync {
    /// Events matching `filter`, ordered by date then id.
    async fn list(&self, filter: &EventFilter) -> Result<Vec<Event>, StoreError>;

    async fn get(&self, id: i32) -> Result<Option<Event>, StoreError>;

    /// Inserts a row and returns the id storage assigned to it.
    async fn create(&self, event: &NewEvent) -> Result<i32, StoreError>;

    /// Overwrites every column of an existing row. `None` if `id` is unknown.
    async fn update(&self, id: i32, event: &NewEvent) -> Result<Option<Event>, StoreError>;

    /// Returns whether a row was removed.
    async fn delete(&self, id: i32) -> Result<bool, StoreError>;
}
