//! Persistence for event aggregates and the history log.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::models::{Event, HistoryItem};

pub mod memory;

pub use self::memory::MemoryStore;

/// +----------------------------------------------------------+
/// | STRUCTS | TRAITS | ENUMS | FUNCTIONS                     |
/// +----------+-------+-------+------------------------------+
/// | Traits:                                                  |
/// |   - AggregateStore                                       |
/// |   - StoreTx                                              |
/// | Enums:                                                   |
/// |   - StoreError                                           |
/// +----------------------------------------------------------+

/// Errors raised by a store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No event with this id
    #[error("Event {0} not found")]
    NotFound(String),

    /// Document could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An event with this id already exists
    #[error("Event {0} already exists")]
    Conflict(String),

    /// The store no longer accepts sessions
    #[error("Store is closed")]
    Closed,

    /// Backend failure
    #[error("Store backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Aggregate storage with a single writer session.
///
/// `begin` waits until no other session is open. Reads outside a transaction wait the same way.
#[async_trait]
pub trait AggregateStore: Send + Sync {
    /// Opens a transaction. Dropping it without `commit` rolls it back.
    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>>;

    /// Loads the last committed state of an event.
    async fn load(&self, event_id: &str) -> StoreResult<Event>;

    async fn append_history(&self, item: HistoryItem) -> StoreResult<()>;

    /// History of one event in insertion order.
    async fn history(&self, event_id: &str) -> StoreResult<Vec<HistoryItem>>;

    /// Published events saved at or after `since`.
    async fn list_updated_since(&self, since: DateTime<Utc>) -> StoreResult<Vec<Event>>;
}

/// A store transaction.
#[async_trait]
pub trait StoreTx: Send {
    async fn load(&mut self, event_id: &str) -> StoreResult<Event>;

    /// Stores a new event; fails with `Conflict` if the id is taken.
    async fn insert(&mut self, event: &Event) -> StoreResult<()>;

    /// Replaces an existing event.
    async fn save(&mut self, event: &Event) -> StoreResult<()>;

    async fn commit(self: Box<Self>) -> StoreResult<()>;

    async fn rollback(self: Box<Self>) -> StoreResult<()>;
}
