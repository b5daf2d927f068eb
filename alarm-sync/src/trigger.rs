//! Deciding which alarm, if any, rings on a given tick.
//!
//! [`evaluate`] is a pure function of its arguments. An alarm matches when
//! it is enabled, its 24-hour time equals the tick's hour and minute, and
//! the tick is at second 0. Restricting matches to second 0 is what keeps
//! a once-per-second evaluation from matching 60 times per minute; a tick
//! that misses second 0 entirely (suspended process, stalled runtime) misses
//! the alarm, and that is accepted rather than widening the window.
//!
//! Refusing a match while an alarm is already ringing is the caller's job
//! (see [`RingController`](crate::ring::RingController)).

use std::collections::BTreeSet;

use crate::clock::Tick;
use crate::types::{AlarmId, AlarmRecord};

/// Ids already delivered during the current minute.
///
/// A second-0 tick observed twice (duplicated sample, runtime hiccup)
/// cannot ring the same alarm twice. Any tick in another minute forgets
/// the set, so the same clock minute on a later day rings again.
#[derive(Debug, Clone, Default)]
pub struct FiredSet {
    minute: Option<(u8, u8)>,
    ids: BTreeSet<AlarmId>,
}

impl FiredSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the fired ids once `tick` has left their minute.
    pub fn observe(&mut self, tick: Tick) {
        let minute = tick.hour_minute();
        if self.minute != Some(minute) {
            self.minute = Some(minute);
            self.ids.clear();
        }
    }

    pub fn contains(&self, tick: Tick, id: &AlarmId) -> bool {
        self.minute == Some(tick.hour_minute()) && self.ids.contains(id)
    }

    pub fn record(&mut self, tick: Tick, id: AlarmId) {
        self.observe(tick);
        self.ids.insert(id);
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Pick the alarm that rings at `tick`.
///
/// When several enabled alarms share the time, the one with the smallest
/// id wins.
pub fn evaluate<'a>(
    tick: Tick,
    alarms: impl IntoIterator<Item = &'a AlarmRecord>,
    fired: &FiredSet,
) -> Option<&'a AlarmRecord> {
    if tick.second != 0 {
        return None;
    }

    alarms
        .into_iter()
        .filter(|alarm| alarm.enabled)
        .filter(|alarm| alarm.hour_minute() == tick.hour_minute())
        .filter(|alarm| !fired.contains(tick, &alarm.id))
        .min_by(|a, b| a.id.cmp(&b.id))
}
