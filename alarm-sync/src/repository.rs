//! Local cache of the remote alarm collection.
//!
//! The repository is the only component that talks to the store on behalf
//! of the rest of the system. It keeps the last successfully listed
//! collection and a connectivity status, and publishes both as one
//! [`RepositorySnapshot`] through a watch channel.
//!
//! [`refresh`](AlarmRepository::refresh) is the only writer of the cached
//! collection. Mutations (add, toggle, remove) go to the store and then
//! refresh; they never edit the cache themselves, so the cache can only
//! ever show something the store actually returned.
//!
//! # Connectivity
//!
//! ```text
//!              list ok                    list failed
//! Connecting ─────────► Connected ◄─────────────────► Error
//!      │                                  list ok       ▲
//!      └────────────────────────────────────────────────┘
//!                         list failed
//! ```
//!
//! A failed refresh only moves the status; the previous collection stays
//! readable.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::error::RepositoryError;
use crate::store::AlarmStore;
use crate::tracing::prelude::*;
use crate::types::{AlarmCollection, AlarmFields, AlarmId, AlarmPatch, AlarmTime, Period};

/// Reachability of the store as seen by the last refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ConnectionStatus {
    /// No refresh has completed yet.
    Connecting,
    Connected,
    /// The last refresh failed. Cached alarms are stale.
    Error,
}

/// Cached collection and status, published together.
///
/// The collection is shared by reference and replaced whole, so a reader
/// holding a snapshot never sees a half-applied refresh.
#[derive(Debug, Clone)]
pub struct RepositorySnapshot {
    pub alarms: Arc<AlarmCollection>,
    pub status: ConnectionStatus,
}

impl Default for RepositorySnapshot {
    fn default() -> Self {
        Self {
            alarms: Arc::new(AlarmCollection::new()),
            status: ConnectionStatus::Connecting,
        }
    }
}

struct Inner {
    store: Arc<dyn AlarmStore>,
    snapshot_tx: watch::Sender<RepositorySnapshot>,
    /// Cancelled by `stop()`. Replaced on each `start()`.
    running: Mutex<CancellationToken>,
}

/// Cached view of the remote alarm collection. Cheap to clone.
#[derive(Clone)]
pub struct AlarmRepository {
    inner: Arc<Inner>,
}

impl AlarmRepository {
    pub fn new(store: Arc<dyn AlarmStore>) -> Self {
        let (snapshot_tx, _) = watch::channel(RepositorySnapshot::default());
        Self {
            inner: Arc::new(Inner {
                store,
                snapshot_tx,
                running: Mutex::new(CancellationToken::new()),
            }),
        }
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> RepositorySnapshot {
        self.inner.snapshot_tx.borrow().clone()
    }

    /// Receive every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<RepositorySnapshot> {
        self.inner.snapshot_tx.subscribe()
    }

    pub fn alarms(&self) -> Arc<AlarmCollection> {
        self.inner.snapshot_tx.borrow().alarms.clone()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.inner.snapshot_tx.borrow().status
    }

    /// Polling token of the run this refresh belongs to, if polling is
    /// active.
    fn active_run(&self) -> Option<CancellationToken> {
        let running = self.inner.running.lock();
        (!running.is_cancelled()).then(|| running.clone())
    }

    /// Replace the cache with the store's current collection.
    ///
    /// Overlapping calls are allowed; whichever listing completes last is
    /// what stays cached. A refresh that starts while polling is active and
    /// finishes after [`stop`](Self::stop) is discarded; one started while
    /// stopped applies normally.
    pub async fn refresh(&self) -> Result<(), RepositoryError> {
        let run = self.active_run();
        let result = self.inner.store.list().await;

        if run.is_some_and(|run| run.is_cancelled()) {
            debug!("Polling stopped during refresh, discarding result");
            return Ok(());
        }

        match result {
            Ok(alarms) => {
                trace!(count = alarms.len(), "Alarms refreshed");
                let previous = self.inner.snapshot_tx.send_replace(RepositorySnapshot {
                    alarms: Arc::new(alarms),
                    status: ConnectionStatus::Connected,
                });
                self.log_status_change(previous.status, ConnectionStatus::Connected);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Failed to refresh alarms");
                let mut previous = ConnectionStatus::Error;
                self.inner.snapshot_tx.send_modify(|snapshot| {
                    previous = snapshot.status;
                    snapshot.status = ConnectionStatus::Error;
                });
                self.log_status_change(previous, ConnectionStatus::Error);
                Err(RepositoryError::RefreshFailed(e))
            }
        }
    }

    fn log_status_change(&self, previous: ConnectionStatus, status: ConnectionStatus) {
        if previous != status {
            info!(previous = %previous, status = %status, "Store connectivity changed");
        }
    }

    /// Refresh following a successful mutation. A failure here is already
    /// reflected in the status and does not undo the mutation.
    async fn refresh_after_mutation(&self) {
        if let Err(e) = self.refresh().await {
            debug!(error = %e, "Refresh after mutation failed");
        }
    }

    /// Create an enabled alarm stamped with the current time.
    ///
    /// Returns the id the store assigned. The new alarm appears in the
    /// cache once the following refresh succeeds.
    pub async fn add(&self, time: AlarmTime, period: Period) -> Result<AlarmId, RepositoryError> {
        let fields = AlarmFields::new_enabled(time, period);

        let id = self.inner.store.create(&fields).await.map_err(|e| {
            warn!(error = %e, %time, %period, "Failed to add alarm");
            RepositoryError::AddFailed(e)
        })?;

        info!(alarm_id = %id, %time, %period, "Alarm added");
        self.refresh_after_mutation().await;
        Ok(id)
    }

    /// Flip the enabled flag of an alarm, based on its cached value.
    ///
    /// Returns the value written to the store.
    pub async fn toggle_enabled(&self, id: &AlarmId) -> Result<bool, RepositoryError> {
        let enabled = !self
            .alarms()
            .get(id)
            .ok_or_else(|| RepositoryError::UnknownAlarm(id.clone()))?
            .enabled;

        self.inner
            .store
            .update(id, AlarmPatch { enabled })
            .await
            .map_err(|e| {
                warn!(alarm_id = %id, error = %e, "Failed to toggle alarm");
                RepositoryError::ToggleFailed {
                    id: id.clone(),
                    source: e,
                }
            })?;

        info!(alarm_id = %id, enabled, "Alarm toggled");
        self.refresh_after_mutation().await;
        Ok(enabled)
    }

    pub async fn remove(&self, id: &AlarmId) -> Result<(), RepositoryError> {
        self.inner.store.delete(id).await.map_err(|e| {
            warn!(alarm_id = %id, error = %e, "Failed to delete alarm");
            RepositoryError::DeleteFailed {
                id: id.clone(),
                source: e,
            }
        })?;

        info!(alarm_id = %id, "Alarm deleted");
        self.refresh_after_mutation().await;
        Ok(())
    }

    /// Start polling the store every `interval`, beginning immediately.
    ///
    /// Polling ends on [`stop`](Self::stop) or when `parent` is cancelled.
    /// Calling `start` again replaces any previous polling task.
    pub fn start(&self, interval: Duration, parent: &CancellationToken) -> JoinHandle<()> {
        let running = parent.child_token();
        let previous = std::mem::replace(&mut *self.inner.running.lock(), running.clone());
        previous.cancel();

        let repository = self.clone();
        tokio::spawn(async move { repository.poll(interval, running).await })
    }

    /// Stop polling. Refreshes still in flight complete but are discarded.
    /// Later calls to [`refresh`](Self::refresh) apply as usual.
    pub fn stop(&self) {
        self.inner.running.lock().cancel();
    }

    async fn poll(self, interval: Duration, cancellation: CancellationToken) {
        trace!(?interval, "Repository polling started");

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancellation.cancelled() => break,
                _ = ticker.tick() => {
                    // Failures are logged and reflected in the status; the
                    // next tick retries.
                    let repository = self.clone();
                    let refresh = tokio::spawn(async move {
                        let _ = repository.refresh().await;
                    });
                    tokio::select! {
                        // The request keeps running detached and its result
                        // is discarded, so stopping never waits on the
                        // request timeout.
                        _ = cancellation.cancelled() => break,
                        _ = refresh => {}
                    }
                }
            }
        }

        trace!("Repository polling stopped");
    }
}
