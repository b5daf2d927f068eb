//! Core types shared across the crate.

mod alarm;

pub use alarm::{
    AlarmCollection, AlarmFields, AlarmId, AlarmPatch, AlarmRecord, AlarmTime, ParseError, Period,
};
