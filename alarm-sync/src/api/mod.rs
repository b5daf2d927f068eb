//! HTTP API for user interfaces.
//!
//! Serves the [`AlarmService`] under `/api/v0`, with the OpenAPI document
//! at `/api/openapi.json`.

mod v0;

use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::{Json, Router, routing::get};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;

use crate::api_client::types::{AlarmState, NoticeState, ServiceState};
use crate::notice::Notice;
use crate::service::{AlarmService, ServiceView};
use crate::tracing::prelude::*;
use crate::types::AlarmRecord;

#[derive(OpenApi)]
#[openapi(info(title = "alarm-sync", description = "Synchronized alarm clock daemon"))]
struct ApiDoc;

/// Build the complete application router.
pub fn router(service: AlarmService) -> Router {
    let (router, openapi) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .nest("/api/v0", v0::routes())
        .split_for_parts();

    router
        .route(
            "/api/openapi.json",
            get(move || {
                let openapi = openapi.clone();
                async move { Json(openapi) }
            }),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

/// Serve the API on `addr` until `shutdown` is cancelled.
pub async fn serve(
    addr: SocketAddr,
    service: AlarmService,
    shutdown: CancellationToken,
) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind API listener on {addr}"))?;
    info!(%addr, "API server listening");

    axum::serve(listener, router(service))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("API server failed")?;

    info!("API server stopped");
    Ok(())
}

impl From<&AlarmRecord> for AlarmState {
    fn from(alarm: &AlarmRecord) -> Self {
        Self {
            id: alarm.id.to_string(),
            time: alarm.time.to_string(),
            period: alarm.period.to_string(),
            enabled: alarm.enabled,
            created_at: alarm.created_at.to_rfc3339(),
        }
    }
}

impl From<Notice> for NoticeState {
    fn from(notice: Notice) -> Self {
        Self {
            kind: notice.kind.to_string(),
            message: notice.message,
        }
    }
}

impl From<ServiceView> for ServiceState {
    fn from(view: ServiceView) -> Self {
        Self {
            status: view.status.to_string(),
            alarms: view.alarms.iter().map(AlarmState::from).collect(),
            ringing_alarm: view.ringing_alarm.as_ref().map(AlarmState::from),
            notice: view.notice.map(NoticeState::from),
        }
    }
}
