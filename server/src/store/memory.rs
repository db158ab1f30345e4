//! In-memory implementation of [`EventStore`], used by tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{EventStore, StoreError};
use crate::models::{Event, EventFilter, NewEvent};

#[derive(Default)]
struct Rows {
    last_id: i32,
    events: BTreeMap<i32, Event>,
}

/// Ids are handed out monotonically from 1 and never reused, like a
/// `SERIAL` column.
#[derive(Default)]
pub struct InMemoryEventStore {
    rows: RwLock<Rows>,
    calls: AtomicUsize,
    failing: AtomicBool,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of trait calls made so far, failed ones included.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// While set, every operation fails as if the connection were lost.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.events.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn enter(&self) -> Result<(), sqlx::Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            Err(sqlx::Error::PoolClosed)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn list(&self, filter: &EventFilter) -> Result<Vec<Event>, StoreError> {
        self.enter().map_err(StoreError::Query)?;

        let rows = self.rows.read().await;
        let mut events: Vec<Event> = rows
            .events
            .values()
            .filter(|event| filter.matches(event))
            .cloned()
            .collect();
        // BTreeMap yields id order, so a stable sort on date leaves ties by id.
        events.sort_by_key(|event| event.date);
        Ok(events)
    }

    async fn get(&self, id: i32) -> Result<Option<Event>, StoreError> {
        self.enter().map_err(StoreError::Query)?;
        Ok(self.rows.read().await.events.get(&id).cloned())
    }

    async fn create(&self, event: &NewEvent) -> Result<i32, StoreError> {
        self.enter().map_err(StoreError::Persistence)?;

        let mut rows = self.rows.write().await;
        rows.last_id += 1;
        let id = rows.last_id;
        rows.events.insert(id, event.clone().with_id(id));
        Ok(id)
    }

    async fn update(&self, id: i32, event: &NewEvent) -> Result<Option<Event>, StoreError> {
        self.enter().map_err(StoreError::Persistence)?;

        let mut rows = self.rows.write().await;
        Ok(rows.events.get_mut(&id).map(|stored| {
            *stored = event.clone().with_id(id);
            stored.clone()
        }))
    }

    async fn delete(&self, id: i32) -> Result<bool, StoreError> {
        self.enter().map_err(StoreError::Persistence)?;
        Ok(self.rows.write().await.events.remove(&id).is_some())
    }
}
