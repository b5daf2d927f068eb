//! In-process store for tests and offline runs.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::AlarmStore;
use crate::error::StoreError;
use crate::types::{AlarmCollection, AlarmFields, AlarmId, AlarmPatch, AlarmRecord};

/// Store operations, for failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    List,
    Create,
    Update,
    Delete,
}

#[derive(Debug, Default)]
struct State {
    records: BTreeMap<AlarmId, AlarmFields>,
    next_id: u64,
    offline: bool,
    fail_next: HashSet<Operation>,
    list_calls: usize,
}

/// [`AlarmStore`] holding records in memory.
///
/// Ids are assigned sequentially. Failures surface as `503` network errors,
/// either for every call while [offline](Self::set_offline) or once per
/// [`fail_next`](Self::fail_next).
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a record in place directly, as another client would.
    pub fn insert(&self, id: impl Into<AlarmId>, fields: AlarmFields) {
        self.state.lock().records.insert(id.into(), fields);
    }

    /// Remove a record directly, as another client would.
    pub fn remove(&self, id: &AlarmId) -> Option<AlarmFields> {
        self.state.lock().records.remove(id)
    }

    pub fn get(&self, id: &AlarmId) -> Option<AlarmFields> {
        self.state.lock().records.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.state.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn set_offline(&self, offline: bool) {
        self.state.lock().offline = offline;
    }

    /// Make the next call of `op` fail.
    pub fn fail_next(&self, op: Operation) {
        self.state.lock().fail_next.insert(op);
    }

    /// Number of `list` calls received, failed ones included.
    pub fn list_calls(&self) -> usize {
        self.state.lock().list_calls
    }

    fn check(state: &mut State, op: Operation) -> Result<(), StoreError> {
        if state.fail_next.remove(&op) || state.offline {
            return Err(StoreError::status(503, "store unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl AlarmStore for MemoryStore {
    async fn list(&self) -> Result<AlarmCollection, StoreError> {
        let mut state = self.state.lock();
        state.list_calls += 1;
        Self::check(&mut state, Operation::List)?;

        Ok(state
            .records
            .iter()
            .map(|(id, fields)| AlarmRecord::new(id.clone(), fields.clone()))
            .collect())
    }

    async fn create(&self, fields: &AlarmFields) -> Result<AlarmId, StoreError> {
        let mut state = self.state.lock();
        Self::check(&mut state, Operation::Create)?;

        state.next_id += 1;
        let id = AlarmId::new(format!("alarm-{:04}", state.next_id));
        state.records.insert(id.clone(), fields.clone());
        Ok(id)
    }

    async fn update(&self, id: &AlarmId, patch: AlarmPatch) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        Self::check(&mut state, Operation::Update)?;

        // A PATCH on a missing key creates a partial record in a real store;
        // here it is reported as not found instead.
        match state.records.get_mut(id) {
            Some(fields) => {
                fields.enabled = patch.enabled;
                Ok(())
            }
            None => Err(StoreError::status(404, format!("no alarm {id}"))),
        }
    }

    async fn delete(&self, id: &AlarmId) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        Self::check(&mut state, Operation::Delete)?;

        state.records.remove(id);
        Ok(())
    }
}
