//! API data transfer objects.
//!
//! These types define the API contract shared between the daemon and
//! clients. Times are carried as display strings so clients need no
//! knowledge of the core types.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Full daemon state snapshot.
#[derive(Clone, Debug, Deserialize, Serialize, ToSchema)]
pub struct ServiceState {
    /// Store connectivity: `connecting`, `connected` or `error`.
    pub status: String,
    pub alarms: Vec<AlarmState>,
    pub ringing_alarm: Option<AlarmState>,
    pub notice: Option<NoticeState>,
}

/// A single alarm.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
pub struct AlarmState {
    pub id: String,
    /// 12-hour `HH:MM`.
    pub time: String,
    /// `AM` or `PM`.
    pub period: String,
    pub enabled: bool,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
}

/// Outcome message of the last user operation.
#[derive(Clone, Debug, Deserialize, Serialize, ToSchema)]
pub struct NoticeState {
    /// `success` or `error`.
    pub kind: String,
    pub message: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, ToSchema)]
pub struct AddAlarmRequest {
    /// 12-hour `HH:MM`, hour 01--12.
    pub time: String,
    /// `AM` or `PM`.
    pub period: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, ToSchema)]
pub struct AddAlarmResponse {
    pub id: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, ToSchema)]
pub struct ToggleResponse {
    pub id: String,
    /// Value written to the store.
    pub enabled: bool,
}

#[derive(Clone, Debug, Deserialize, Serialize, ToSchema)]
pub struct DismissResponse {
    /// The alarm that was ringing, if any.
    pub dismissed: Option<AlarmState>,
}

#[derive(Clone, Debug, Deserialize, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}
