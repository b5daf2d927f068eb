//! Runs the repository poll, the clock and the trigger loop together.
//!
//! Three tasks share one cancellation token:
//!
//! - **refresh:** [`AlarmRepository`] polls the store every
//!   `refresh_interval`.
//! - **clock:** [`ClockSource`] publishes a [`Tick`] every `tick_interval`.
//! - **trigger:** on each tick, evaluates the latest repository snapshot and
//!   hands a match to [`RingController`].
//!
//! The trigger loop reads whatever snapshot the last completed refresh
//! published. A toggle that has not been refreshed yet may or may not
//! suppress a ring in the same second.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::clock::{Clock, ClockSource, Tick};
use crate::config::EngineConfig;
use crate::repository::AlarmRepository;
use crate::ring::{MatchOutcome, RingController};
use crate::tracing::prelude::*;
use crate::trigger::{self, FiredSet};
use crate::types::AlarmId;

/// Evaluates ticks against the cached alarms.
struct TriggerLoop {
    repository: AlarmRepository,
    ring: Arc<RingController>,
    fired: FiredSet,
}

impl TriggerLoop {
    fn new(repository: AlarmRepository, ring: Arc<RingController>) -> Self {
        Self {
            repository,
            ring,
            fired: FiredSet::new(),
        }
    }

    /// Handle one tick. Returns the id of an alarm that started ringing.
    fn on_tick(&mut self, tick: Tick) -> Option<AlarmId> {
        self.fired.observe(tick);
        if self.ring.is_ringing() {
            return None;
        }

        let alarms = self.repository.alarms();
        let alarm = trigger::evaluate(tick, alarms.iter(), &self.fired)?.clone();
        let id = alarm.id.clone();
        self.fired.record(tick, id.clone());

        debug!(%tick, alarm_id = %id, "Alarm matched");
        match self.ring.on_match(alarm) {
            MatchOutcome::Accepted => Some(id),
            MatchOutcome::Discarded => None,
        }
    }

    async fn run(
        mut self,
        mut ticks: watch::Receiver<Option<Tick>>,
        cancellation: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = cancellation.cancelled() => break,
                changed = ticks.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let tick = *ticks.borrow_and_update();
                    if let Some(tick) = tick {
                        self.on_tick(tick);
                    }
                }
            }
        }
    }
}

struct Running {
    shutdown: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

/// Owner of the periodic tasks. Start and stop may be repeated.
pub struct AlarmEngine {
    repository: AlarmRepository,
    ring: Arc<RingController>,
    clock: ClockSource,
    config: EngineConfig,
    running: Option<Running>,
}

impl AlarmEngine {
    pub fn new(
        repository: AlarmRepository,
        ring: Arc<RingController>,
        clock: Arc<dyn Clock>,
        config: EngineConfig,
    ) -> Self {
        let clock = ClockSource::new(clock, config.tick_interval);
        Self {
            repository,
            ring,
            clock,
            config,
            running: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Latest tick published by the clock.
    pub fn latest_tick(&self) -> Option<Tick> {
        self.clock.latest()
    }

    /// Spawn the refresh, clock and trigger tasks.
    pub fn start(&mut self) {
        if self.is_running() {
            warn!("Alarm engine already running");
            return;
        }

        let shutdown = CancellationToken::new();
        let trigger = TriggerLoop::new(self.repository.clone(), self.ring.clone());
        let ticks = self.clock.subscribe();

        let tasks = vec![
            self.repository.start(self.config.refresh_interval, &shutdown),
            self.clock.start(shutdown.clone()),
            tokio::spawn(trigger.run(ticks, shutdown.clone())),
        ];

        info!(
            refresh_interval = ?self.config.refresh_interval,
            tick_interval = ?self.config.tick_interval,
            "Alarm engine started"
        );
        self.running = Some(Running { shutdown, tasks });
    }

    /// Cancel all tasks together and wait for them to finish.
    pub async fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };

        running.shutdown.cancel();
        for task in running.tasks {
            if let Err(e) = task.await {
                error!(error = %e, "Alarm engine task failed");
            }
        }
        info!("Alarm engine stopped");
    }
}
