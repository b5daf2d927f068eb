//! Alarm daemon.
//!
//! Polls the remote store, rings alarms as they come due and serves the
//! HTTP API until interrupted. Configuration comes from `ALARM_*`
//! environment variables (see [`DaemonConfig`]).

use std::sync::Arc;

use anyhow::Result;
use tokio_util::sync::CancellationToken;

use alarm_sync::api;
use alarm_sync::clock::SystemClock;
use alarm_sync::config::DaemonConfig;
use alarm_sync::engine::AlarmEngine;
use alarm_sync::repository::AlarmRepository;
use alarm_sync::ring::{RingController, RingingState};
use alarm_sync::service::AlarmService;
use alarm_sync::store::HttpStore;
use alarm_sync::tracing::{self, prelude::*};

/// Log ring transitions. Sound playback hooks in here.
async fn announce(ring: Arc<RingController>, shutdown: CancellationToken) {
    let mut rx = ring.subscribe();
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                match &*rx.borrow_and_update() {
                    RingingState::Ringing(alarm) => {
                        info!(alarm_id = %alarm.id, "ALARM {} {}", alarm.time, alarm.period);
                    }
                    RingingState::Idle => debug!("Ringing cleared"),
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing::init_journald_or_stdout();

    let config = DaemonConfig::from_env()?;
    info!(store = %config.store.base_url, "Starting alarm-sync daemon");

    let store = Arc::new(HttpStore::new(&config.store)?);
    let repository = AlarmRepository::new(store);
    let ring = Arc::new(RingController::new());

    let mut engine = AlarmEngine::new(
        repository.clone(),
        ring.clone(),
        Arc::new(SystemClock),
        config.engine.clone(),
    );
    engine.start();

    let shutdown = CancellationToken::new();
    let service = AlarmService::new(repository, ring.clone());
    let mut api_task = tokio::spawn(api::serve(config.api_addr, service, shutdown.clone()));
    let announce_task = tokio::spawn(announce(ring, shutdown.clone()));

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result?;
            info!("Shutdown requested");
        }
        // The API task only returns early on failure (e.g. address in use).
        result = &mut api_task => {
            shutdown.cancel();
            engine.stop().await;
            return result?;
        }
    }

    shutdown.cancel();
    engine.stop().await;
    api_task.await??;
    announce_task.await?;

    Ok(())
}
