//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// In-process store. Events are kept as opaque JSON documents keyed by id, with the owner id and
// the last save time alongside for indexing. History rows are append-only under an
// auto-increment key.
//
// A single async mutex guards all tables. A transaction owns the guard for its whole lifetime,
// which gives exactly one writer session at a time; staged writes are applied on commit.
//--------------------------------------------------------------------------------------------------

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use super::{AggregateStore, StoreError, StoreResult, StoreTx};
use crate::domain::models::{Event, HistoryItem};

#[derive(Debug, Clone)]
struct EventRow {
    doc: Vec<u8>,
    #[allow(dead_code)]
    owner_id: i64,
    published: bool,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct HistoryRow {
    #[allow(dead_code)]
    id: u64,
    #[allow(dead_code)]
    initiator_id: Option<i64>,
    event_id: Option<String>,
    doc: Vec<u8>,
}

#[derive(Debug, Default)]
struct Tables {
    events: HashMap<String, EventRow>,
    history: Vec<HistoryRow>,
    next_history_id: u64,
}

impl Tables {
    fn decode(row: &EventRow) -> StoreResult<Event> {
        Ok(serde_json::from_slice(&row.doc)?)
    }
}

/// In-memory [`AggregateStore`].
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    closed: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuses new sessions from now on. Open transactions may still commit.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    fn ensure_open(&self) -> StoreResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StoreError::Closed);
        }
        Ok(())
    }

    fn encode(event: &Event) -> StoreResult<EventRow> {
        Ok(EventRow {
            doc: serde_json::to_vec(event)?,
            owner_id: event.owner.id,
            published: event.is_published(),
            updated_at: Utc::now(),
        })
    }
}

#[async_trait]
impl AggregateStore for MemoryStore {
    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>> {
        self.ensure_open()?;
        let guard = self.tables.clone().lock_owned().await;
        Ok(Box::new(MemoryTx {
            guard,
            staged: HashMap::new(),
        }))
    }

    async fn load(&self, event_id: &str) -> StoreResult<Event> {
        self.ensure_open()?;
        let tables = self.tables.lock().await;
        let row = tables
            .events
            .get(event_id)
            .ok_or_else(|| StoreError::NotFound(event_id.to_string()))?;
        Tables::decode(row)
    }

    async fn append_history(&self, item: HistoryItem) -> StoreResult<()> {
        self.ensure_open()?;
        let doc = serde_json::to_vec(&item)?;
        let mut tables = self.tables.lock().await;
        tables.next_history_id += 1;
        let id = tables.next_history_id;
        tables.history.push(HistoryRow {
            id,
            initiator_id: item.initiator.as_ref().map(|p| p.id),
            event_id: item.event_id.clone(),
            doc,
        });
        debug!(history_id = id, action = ?item.action, "history item appended");
        Ok(())
    }

    async fn history(&self, event_id: &str) -> StoreResult<Vec<HistoryItem>> {
        self.ensure_open()?;
        let tables = self.tables.lock().await;
        tables
            .history
            .iter()
            .filter(|row| row.event_id.as_deref() == Some(event_id))
            .map(|row| serde_json::from_slice(&row.doc).map_err(StoreError::from))
            .collect()
    }

    async fn list_updated_since(&self, since: DateTime<Utc>) -> StoreResult<Vec<Event>> {
        self.ensure_open()?;
        let tables = self.tables.lock().await;
        let mut rows: Vec<&EventRow> = tables
            .events
            .values()
            .filter(|row| row.published && row.updated_at >= since)
            .collect();
        rows.sort_by_key(|row| row.updated_at);
        rows.into_iter().map(Tables::decode).collect()
    }
}

/// Transaction over [`MemoryStore`]. Holds the store lock until committed or dropped.
struct MemoryTx {
    guard: OwnedMutexGuard<Tables>,
    staged: HashMap<String, EventRow>,
}

impl MemoryTx {
    fn exists(&self, event_id: &str) -> bool {
        self.staged.contains_key(event_id) || self.guard.events.contains_key(event_id)
    }
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn load(&mut self, event_id: &str) -> StoreResult<Event> {
        let row = self
            .staged
            .get(event_id)
            .or_else(|| self.guard.events.get(event_id))
            .ok_or_else(|| StoreError::NotFound(event_id.to_string()))?;
        Tables::decode(row)
    }

    async fn insert(&mut self, event: &Event) -> StoreResult<()> {
        if self.exists(&event.id) {
            return Err(StoreError::Conflict(event.id.clone()));
        }
        self.staged.insert(event.id.clone(), MemoryStore::encode(event)?);
        Ok(())
    }

    async fn save(&mut self, event: &Event) -> StoreResult<()> {
        if !self.exists(&event.id) {
            return Err(StoreError::NotFound(event.id.clone()));
        }
        self.staged.insert(event.id.clone(), MemoryStore::encode(event)?);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let MemoryTx { mut guard, staged } = *self;
        let count = staged.len();
        guard.events.extend(staged);
        debug!(events = count, "transaction committed");
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        debug!(events = self.staged.len(), "transaction rolled back");
        Ok(())
    }
}
