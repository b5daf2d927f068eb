//! The operations a user interface needs, in one place.
//!
//! [`AlarmService`] combines the repository, the ring controller and a
//! [`NoticeBoard`]. Every mutation posts a notice describing its outcome,
//! so a failed request is reported to the user instead of only being
//! logged.

use std::sync::Arc;

use crate::error::RepositoryError;
use crate::notice::{Notice, NoticeBoard};
use crate::repository::{AlarmRepository, ConnectionStatus};
use crate::ring::RingController;
use crate::types::{AlarmId, AlarmRecord, AlarmTime, Period};

/// Everything a UI renders.
#[derive(Debug, Clone)]
pub struct ServiceView {
    /// Sorted by time of day, then id.
    pub alarms: Vec<AlarmRecord>,
    pub status: ConnectionStatus,
    pub ringing_alarm: Option<AlarmRecord>,
    pub notice: Option<Notice>,
}

#[derive(Clone)]
pub struct AlarmService {
    repository: AlarmRepository,
    ring: Arc<RingController>,
    notices: Arc<NoticeBoard>,
}

impl AlarmService {
    pub fn new(repository: AlarmRepository, ring: Arc<RingController>) -> Self {
        Self {
            repository,
            ring,
            notices: Arc::new(NoticeBoard::new()),
        }
    }

    pub fn view(&self) -> ServiceView {
        let snapshot = self.repository.snapshot();

        let mut alarms: Vec<_> = snapshot.alarms.iter().cloned().collect();
        alarms.sort_by(|a, b| {
            a.hour_minute()
                .cmp(&b.hour_minute())
                .then_with(|| a.id.cmp(&b.id))
        });

        ServiceView {
            alarms,
            status: snapshot.status,
            ringing_alarm: self.ring.ringing_alarm(),
            notice: self.notices.current(),
        }
    }

    pub async fn add(&self, time: AlarmTime, period: Period) -> Result<AlarmId, RepositoryError> {
        let result = self.repository.add(time, period).await;
        match &result {
            Ok(_) => self.notices.success(format!("Alarm set for {time} {period}")),
            Err(_) => self.notices.error("Failed to add alarm. Please try again."),
        }
        result
    }

    pub async fn toggle(&self, id: &AlarmId) -> Result<bool, RepositoryError> {
        let result = self.repository.toggle_enabled(id).await;
        if result.is_err() {
            self.notices.error("Failed to update alarm. Please try again.");
        }
        result
    }

    pub async fn remove(&self, id: &AlarmId) -> Result<(), RepositoryError> {
        let result = self.repository.remove(id).await;
        match &result {
            Ok(()) => self.notices.success("Alarm deleted"),
            Err(_) => self.notices.error("Failed to delete alarm. Please try again."),
        }
        result
    }

    /// Stop the ringing alarm, if any.
    pub fn dismiss(&self) -> Option<AlarmRecord> {
        self.ring.dismiss()
    }

    pub fn dismiss_notice(&self) {
        self.notices.dismiss();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notice::NoticeKind;
    use crate::store::{MemoryStore, Operation};
    use crate::types::AlarmFields;

    fn service() -> (AlarmService, Arc<MemoryStore>, Arc<RingController>) {
        let store = Arc::new(MemoryStore::new());
        let ring = Arc::new(RingController::new());
        let service = AlarmService::new(AlarmRepository::new(store.clone()), ring.clone());
        (service, store, ring)
    }

    fn fields(hour: u8, minute: u8, period: Period) -> AlarmFields {
        AlarmFields::new_enabled(AlarmTime::new(hour, minute).unwrap(), period)
    }

    #[tokio::test]
    async fn view_sorts_by_time_of_day() {
        let (service, store, _ring) = service();
        store.insert("a", fields(1, 0, Period::Pm));
        store.insert("b", fields(12, 30, Period::Am));
        store.insert("c", fields(7, 0, Period::Am));
        service.repository.refresh().await.unwrap();

        let ids: Vec<_> = service
            .view()
            .alarms
            .iter()
            .map(|a| a.id.to_string())
            .collect();

        assert_eq!(ids, ["b", "c", "a"]);
    }

    #[tokio::test]
    async fn add_posts_success_notice() {
        let (service, _store, _ring) = service();

        service
            .add(AlarmTime::new(7, 0).unwrap(), Period::Am)
            .await
            .unwrap();

        let view = service.view();
        assert_eq!(view.alarms.len(), 1);
        assert_eq!(view.status, ConnectionStatus::Connected);
        let notice = view.notice.unwrap();
        assert_eq!(notice.kind, NoticeKind::Success);
        assert_eq!(notice.message, "Alarm set for 07:00 AM");
    }

    #[tokio::test]
    async fn failed_toggle_posts_error_and_keeps_state() {
        let (service, store, _ring) = service();
        store.insert("a", fields(7, 0, Period::Am));
        service.repository.refresh().await.unwrap();
        store.fail_next(Operation::Update);

        assert!(service.toggle(&"a".into()).await.is_err());

        let view = service.view();
        assert!(view.alarms[0].enabled);
        assert_eq!(view.notice.unwrap().kind, NoticeKind::Error);

        service.dismiss_notice();
        assert!(service.view().notice.is_none());
    }

    #[tokio::test]
    async fn view_shows_ringing_alarm_until_dismissed() {
        let (service, store, ring) = service();
        store.insert("a", fields(7, 0, Period::Am));
        service.repository.refresh().await.unwrap();
        ring.on_match(service.view().alarms[0].clone());

        assert_eq!(service.view().ringing_alarm.unwrap().id.as_str(), "a");
        assert!(service.dismiss().is_some());
        assert!(service.view().ringing_alarm.is_none());
    }
}
