//! Wall-clock alarms kept in sync with a shared remote store.
//!
//! The [`repository`] polls the store and caches the alarm collection, the
//! [`clock`] ticks once per second, [`trigger`] decides whether a tick
//! rings an alarm, and [`ring`] holds the ringing state until dismissed.
//! [`engine`] runs the periodic tasks; [`service`] and [`api`] expose the
//! whole thing to user interfaces.

pub mod api;
pub mod api_client;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod notice;
pub mod repository;
pub mod ring;
pub mod service;
pub mod store;
pub mod tracing;
pub mod trigger;
pub mod types;
