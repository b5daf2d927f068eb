//! Wall-clock ticks at one-second resolution.
//!
//! [`ClockSource`] samples a [`Clock`] and publishes the reading through a
//! watch channel. Only the newest tick is kept: a slow consumer skips ticks
//! instead of queueing them.
//!
//! Clocks that know where the next wall-clock second starts are sampled
//! just past each boundary, recomputed before every sample so a stepped or
//! slewed wall clock cannot walk the sampling point onto the boundary.
//! Other clocks are sampled on a fixed period.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, Timelike};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::tracing::prelude::*;

/// Sampling lands this far past a second boundary, clear of scheduling
/// jitter around the boundary itself.
const BOUNDARY_MARGIN: Duration = Duration::from_millis(20);

/// Local time of day, truncated to the second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tick {
    /// 0--23
    pub hour: u8,
    /// 0--59
    pub minute: u8,
    /// 0--59
    pub second: u8,
}

impl Tick {
    pub fn new(hour: u8, minute: u8, second: u8) -> Self {
        debug_assert!(hour < 24 && minute < 60 && second < 60);
        Self {
            hour,
            minute,
            second,
        }
    }

    pub fn from_time(time: &impl Timelike) -> Self {
        // A leap second reports second 59 with nanos past 1s; treat it as 59.
        Self::new(
            time.hour() as u8,
            time.minute() as u8,
            time.second().min(59) as u8,
        )
    }

    pub fn hour_minute(&self) -> (u8, u8) {
        (self.hour, self.minute)
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hour, self.minute, self.second)
    }
}

/// Source of the current local time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Tick;

    /// Time until the next whole wall-clock second, if the clock knows.
    fn until_next_second(&self) -> Option<Duration> {
        None
    }
}

/// The host's local clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Tick {
        Tick::from_time(&Local::now())
    }

    fn until_next_second(&self) -> Option<Duration> {
        let nanos = Local::now().nanosecond().min(999_999_999);
        Some(Duration::from_nanos(u64::from(1_000_000_000 - nanos)))
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Tick>>,
}

impl ManualClock {
    pub fn new(now: Tick) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    pub fn set(&self, now: Tick) {
        *self.now.lock() = now;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Tick {
        *self.now.lock()
    }
}

/// Publishes a [`Tick`] every period until stopped. Cheap to clone; clones
/// share the channel.
#[derive(Clone)]
pub struct ClockSource {
    clock: Arc<dyn Clock>,
    period: Duration,
    tick_tx: Arc<watch::Sender<Option<Tick>>>,
}

impl ClockSource {
    pub fn new(clock: Arc<dyn Clock>, period: Duration) -> Self {
        let (tick_tx, _) = watch::channel(None);
        Self {
            clock,
            period,
            tick_tx: Arc::new(tick_tx),
        }
    }

    /// Receive ticks. Holds `None` until the first tick.
    pub fn subscribe(&self) -> watch::Receiver<Option<Tick>> {
        self.tick_tx.subscribe()
    }

    pub fn latest(&self) -> Option<Tick> {
        *self.tick_tx.borrow()
    }

    /// Spawn the ticking task. It runs until `cancellation` fires and can
    /// be started again afterwards.
    pub fn start(&self, cancellation: CancellationToken) -> JoinHandle<()> {
        let source = self.clone();
        tokio::spawn(async move { source.run(cancellation).await })
    }

    /// When to sample next, given the previous sampling deadline.
    fn next_deadline(&self, previous: Option<Instant>) -> Instant {
        let now = Instant::now();
        match (self.clock.until_next_second(), previous) {
            // Periods longer than a second still land past a boundary.
            (Some(wait), _) => {
                let extra = self.period.saturating_sub(Duration::from_secs(1));
                now + wait + extra + BOUNDARY_MARGIN
            }
            (None, None) => now + BOUNDARY_MARGIN,
            (None, Some(previous)) => {
                // Skip missed periods rather than bursting to catch up.
                let mut next = previous + self.period;
                while next <= now {
                    next += self.period;
                }
                next
            }
        }
    }

    pub async fn run(self, cancellation: CancellationToken) {
        trace!(period = ?self.period, "Clock started");

        let mut deadline = self.next_deadline(None);
        loop {
            tokio::select! {
                _ = cancellation.cancelled() => break,
                _ = tokio::time::sleep_until(deadline) => {
                    let tick = self.clock.now();
                    trace!(%tick, "Clock tick");
                    self.tick_tx.send_replace(Some(tick));
                    deadline = self.next_deadline(Some(deadline));
                }
            }
        }

        trace!("Clock stopped");
    }
}
