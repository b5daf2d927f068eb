//! Transient messages about user-initiated operations.
//!
//! Success messages expire on their own after a few seconds. Error
//! messages stay until dismissed or replaced by a newer message.

use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

const SUCCESS_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    expires_at: Option<Instant>,
}

impl Notice {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// Holds at most one notice; posting replaces the previous one.
#[derive(Debug)]
pub struct NoticeBoard {
    current: Mutex<Option<Notice>>,
    success_ttl: Duration,
}

impl Default for NoticeBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl NoticeBoard {
    pub fn new() -> Self {
        Self {
            current: Mutex::new(None),
            success_ttl: SUCCESS_TTL,
        }
    }

    pub fn success(&self, message: impl Into<String>) {
        *self.current.lock() = Some(Notice {
            kind: NoticeKind::Success,
            message: message.into(),
            expires_at: Some(Instant::now() + self.success_ttl),
        });
    }

    pub fn error(&self, message: impl Into<String>) {
        *self.current.lock() = Some(Notice {
            kind: NoticeKind::Error,
            message: message.into(),
            expires_at: None,
        });
    }

    /// The live notice, if any. Expired notices are dropped here.
    pub fn current(&self) -> Option<Notice> {
        let mut current = self.current.lock();
        if current
            .as_ref()
            .is_some_and(|notice| notice.is_expired(Instant::now()))
        {
            *current = None;
        }
        current.clone()
    }

    pub fn dismiss(&self) {
        *self.current.lock() = None;
    }
}
