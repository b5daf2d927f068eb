//! The ringing state and its dismiss transition.
//!
//! # State Machine
//!
//! ```text
//!          on_match(alarm)
//!  Idle ──────────────────► Ringing(alarm)
//!   ▲                          │      ▲
//!   │         dismiss()        │      │ on_match(other)
//!   └──────────────────────────┘      └── discarded
//! ```
//!
//! - **Idle:** nothing is ringing; the next match is accepted.
//! - **Ringing:** holds a copy of the matched record. Further matches are
//!   discarded, so at most one alarm rings and a match cannot queue up
//!   behind the current one. Stays here until [`dismiss`] is called; there
//!   is no timeout.
//!
//! The held record is a snapshot taken at match time. Later refreshes of
//! the repository (including deletion of that alarm by another client) do
//! not touch it.
//!
//! [`dismiss`]: RingController::dismiss

use tokio::sync::watch;

use crate::tracing::prelude::*;
use crate::types::AlarmRecord;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RingingState {
    #[default]
    Idle,
    Ringing(AlarmRecord),
}

impl RingingState {
    pub fn ringing_alarm(&self) -> Option<&AlarmRecord> {
        match self {
            Self::Idle => None,
            Self::Ringing(alarm) => Some(alarm),
        }
    }

    pub fn is_ringing(&self) -> bool {
        matches!(self, Self::Ringing(_))
    }
}

/// Result of [`RingController::on_match`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    /// Was idle; now ringing with the matched alarm.
    Accepted,

    /// Already ringing; the match was dropped.
    Discarded,
}

/// Owner of the [`RingingState`]. Observers subscribe to changes.
#[derive(Debug)]
pub struct RingController {
    state_tx: watch::Sender<RingingState>,
}

impl Default for RingController {
    fn default() -> Self {
        Self::new()
    }
}

impl RingController {
    pub fn new() -> Self {
        let (state_tx, _) = watch::channel(RingingState::Idle);
        Self { state_tx }
    }

    pub fn state(&self) -> RingingState {
        self.state_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RingingState> {
        self.state_tx.subscribe()
    }

    pub fn is_ringing(&self) -> bool {
        self.state_tx.borrow().is_ringing()
    }

    pub fn ringing_alarm(&self) -> Option<AlarmRecord> {
        self.state_tx.borrow().ringing_alarm().cloned()
    }

    /// Deliver a trigger match. Only accepted while idle.
    pub fn on_match(&self, alarm: AlarmRecord) -> MatchOutcome {
        let alarm_id = alarm.id.clone();
        let mut pending = Some(alarm);

        let accepted = self.state_tx.send_if_modified(|state| match state {
            RingingState::Idle => {
                if let Some(alarm) = pending.take() {
                    *state = RingingState::Ringing(alarm);
                }
                true
            }
            RingingState::Ringing(_) => false,
        });

        if accepted {
            info!(alarm_id = %alarm_id, "Alarm ringing");
            MatchOutcome::Accepted
        } else {
            debug!(alarm_id = %alarm_id, "Match discarded, already ringing");
            MatchOutcome::Discarded
        }
    }

    /// Stop ringing. Returns the alarm that was ringing, or `None` if idle.
    pub fn dismiss(&self) -> Option<AlarmRecord> {
        let mut dismissed = None;
        self.state_tx.send_if_modified(|state| {
            match std::mem::take(state) {
                RingingState::Ringing(alarm) => {
                    dismissed = Some(alarm);
                    true
                }
                RingingState::Idle => false,
            }
        });

        if let Some(alarm) = &dismissed {
            info!(alarm_id = %alarm.id, "Alarm dismissed");
        }
        dismissed
    }
}
