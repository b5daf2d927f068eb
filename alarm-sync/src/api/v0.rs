//! API v0 endpoints.
//!
//! Version 0 signals an unstable API -- breaking changes are expected
//! until the daemon reaches 1.0.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::api_client::types::{
    AddAlarmRequest, AddAlarmResponse, AlarmState, DismissResponse, ErrorResponse, ServiceState,
    ToggleResponse,
};
use crate::error::RepositoryError;
use crate::service::AlarmService;
use crate::types::{AlarmId, AlarmTime, ParseError, Period};

/// Build the v0 API routes with OpenAPI metadata.
pub fn routes() -> OpenApiRouter<AlarmService> {
    OpenApiRouter::new()
        .routes(routes!(health))
        .routes(routes!(get_state))
        .routes(routes!(get_alarms, add_alarm))
        .routes(routes!(delete_alarm))
        .routes(routes!(toggle_alarm))
        .routes(routes!(dismiss_ringing))
        .routes(routes!(dismiss_notice))
}

/// Handler failure, rendered as [`ErrorResponse`].
enum ApiError {
    BadRequest(ParseError),
    Repository(RepositoryError),
}

impl From<ParseError> for ApiError {
    fn from(err: ParseError) -> Self {
        Self::BadRequest(err)
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        Self::Repository(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            Self::BadRequest(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            Self::Repository(err @ RepositoryError::UnknownAlarm(_)) => {
                (StatusCode::NOT_FOUND, err.to_string())
            }
            Self::Repository(err) => {
                let error = match err.store_error() {
                    Some(source) => format!("{err}: {source}"),
                    None => err.to_string(),
                };
                (StatusCode::BAD_GATEWAY, error)
            }
        };
        (status, Json(ErrorResponse { error })).into_response()
    }
}

/// Health check endpoint.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = OK, description = "Server is running", body = String),
    ),
)]
async fn health() -> &'static str {
    "OK"
}

/// Return the full state: alarms, connectivity, ringing alarm and notice.
#[utoipa::path(
    get,
    path = "/state",
    tag = "state",
    responses(
        (status = OK, description = "Current state", body = ServiceState),
    ),
)]
async fn get_state(State(service): State<AlarmService>) -> Json<ServiceState> {
    Json(service.view().into())
}

/// Return cached alarms sorted by time of day.
#[utoipa::path(
    get,
    path = "/alarms",
    tag = "alarms",
    responses(
        (status = OK, description = "Cached alarms", body = Vec<AlarmState>),
    ),
)]
async fn get_alarms(State(service): State<AlarmService>) -> Json<Vec<AlarmState>> {
    Json(service.view().alarms.iter().map(AlarmState::from).collect())
}

/// Create an enabled alarm in the store.
#[utoipa::path(
    post,
    path = "/alarms",
    tag = "alarms",
    request_body = AddAlarmRequest,
    responses(
        (status = CREATED, description = "Alarm stored", body = AddAlarmResponse),
        (status = BAD_REQUEST, description = "Unparsable time or period", body = ErrorResponse),
        (status = BAD_GATEWAY, description = "Store request failed", body = ErrorResponse),
    ),
)]
async fn add_alarm(
    State(service): State<AlarmService>,
    Json(req): Json<AddAlarmRequest>,
) -> Result<(StatusCode, Json<AddAlarmResponse>), ApiError> {
    let time: AlarmTime = req.time.parse()?;
    let period = Period::parse(&req.period)?;

    let id = service.add(time, period).await?;
    Ok((
        StatusCode::CREATED,
        Json(AddAlarmResponse { id: id.to_string() }),
    ))
}

/// Flip an alarm's enabled flag.
#[utoipa::path(
    patch,
    path = "/alarms/{id}/toggle",
    tag = "alarms",
    params(
        ("id" = String, Path, description = "Alarm id"),
    ),
    responses(
        (status = OK, description = "New enabled value", body = ToggleResponse),
        (status = NOT_FOUND, description = "Alarm not cached", body = ErrorResponse),
        (status = BAD_GATEWAY, description = "Store request failed", body = ErrorResponse),
    ),
)]
async fn toggle_alarm(
    State(service): State<AlarmService>,
    Path(id): Path<String>,
) -> Result<Json<ToggleResponse>, ApiError> {
    let id = AlarmId::new(id);
    let enabled = service.toggle(&id).await?;
    Ok(Json(ToggleResponse {
        id: id.to_string(),
        enabled,
    }))
}

/// Delete an alarm from the store.
#[utoipa::path(
    delete,
    path = "/alarms/{id}",
    tag = "alarms",
    params(
        ("id" = String, Path, description = "Alarm id"),
    ),
    responses(
        (status = NO_CONTENT, description = "Alarm deleted"),
        (status = BAD_GATEWAY, description = "Store request failed", body = ErrorResponse),
    ),
)]
async fn delete_alarm(
    State(service): State<AlarmService>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    service.remove(&AlarmId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Stop the ringing alarm.
#[utoipa::path(
    post,
    path = "/ringing/dismiss",
    tag = "ringing",
    responses(
        (status = OK, description = "Dismissed alarm, if one was ringing", body = DismissResponse),
    ),
)]
async fn dismiss_ringing(State(service): State<AlarmService>) -> Json<DismissResponse> {
    Json(DismissResponse {
        dismissed: service.dismiss().as_ref().map(AlarmState::from),
    })
}

/// Clear the current notice.
#[utoipa::path(
    delete,
    path = "/notice",
    tag = "notice",
    responses(
        (status = NO_CONTENT, description = "Notice cleared"),
    ),
)]
async fn dismiss_notice(State(service): State<AlarmService>) -> StatusCode {
    service.dismiss_notice();
    StatusCode::NO_CONTENT
}
