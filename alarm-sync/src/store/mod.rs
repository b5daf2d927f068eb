//! Access to the remote alarm store.
//!
//! The store is a plain CRUD collection of alarm records. Implementations
//! perform exactly one request per call and never retry; the repository
//! decides what a failure means.

mod http;
mod memory;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::types::{AlarmCollection, AlarmFields, AlarmId, AlarmPatch};

pub use http::HttpStore;
pub use memory::{MemoryStore, Operation};

/// CRUD access to the shared collection of alarms.
#[async_trait]
pub trait AlarmStore: Send + Sync {
    /// Fetch the whole collection. An empty store yields an empty
    /// collection, not an error.
    async fn list(&self) -> Result<AlarmCollection, StoreError>;

    /// Store a new record and return the id the store assigned to it.
    async fn create(&self, fields: &AlarmFields) -> Result<AlarmId, StoreError>;

    /// Apply a partial update to one record.
    async fn update(&self, id: &AlarmId, patch: AlarmPatch) -> Result<(), StoreError>;

    /// Remove one record.
    async fn delete(&self, id: &AlarmId) -> Result<(), StoreError>;
}
