//! Error types for store access and repository operations.

use thiserror::Error;

use crate::types::AlarmId;

/// Any failed exchange with the remote store.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("store responded {status}: {body}")]
    Status { status: u16, body: String },
}

/// Errors surfaced by an [`AlarmStore`](crate::store::AlarmStore).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Network(#[from] NetworkError),

    /// The store returned a record that does not fit the alarm schema.
    #[error("malformed record {id}: {reason}")]
    MalformedRecord { id: String, reason: String },
}

impl StoreError {
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Network(NetworkError::Status {
            status,
            body: body.into(),
        })
    }

    pub fn malformed(id: impl Into<String>, reason: impl ToString) -> Self {
        Self::MalformedRecord {
            id: id.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(NetworkError::Transport(err))
    }
}

/// Named failures of [`AlarmRepository`](crate::repository::AlarmRepository)
/// operations. Each wraps the store error that caused it.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("failed to refresh alarms")]
    RefreshFailed(#[source] StoreError),

    #[error("failed to add alarm")]
    AddFailed(#[source] StoreError),

    #[error("failed to update alarm {id}")]
    ToggleFailed {
        id: AlarmId,
        #[source]
        source: StoreError,
    },

    #[error("failed to delete alarm {id}")]
    DeleteFailed {
        id: AlarmId,
        #[source]
        source: StoreError,
    },

    /// The id is not in the cached collection, so there is no current
    /// value to toggle from.
    #[error("unknown alarm {0}")]
    UnknownAlarm(AlarmId),
}

impl RepositoryError {
    /// The underlying store error, if any.
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            Self::RefreshFailed(source)
            | Self::AddFailed(source)
            | Self::ToggleFailed { source, .. }
            | Self::DeleteFailed { source, .. } => Some(source),
            Self::UnknownAlarm(_) => None,
        }
    }
}
