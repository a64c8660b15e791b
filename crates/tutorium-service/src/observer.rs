//! Companion-channel seam.
//!
//! Schedule and session changes are announced to whatever keeps associated
//! communication channels in sync. Notifications are fire-and-forget: they
//! run after the transaction committed and their outcome never affects the
//! scheduling operation itself.

use uuid::Uuid;

/// Summary of session mutations applied by one reconciliation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct SessionChange {
    pub tutorial_group_id: Uuid,
    pub created: usize,
    pub deleted: usize,
    pub cancelled: usize,
    pub reactivated: usize,
}

impl SessionChange {
    #[must_use]
    pub const fn none(tutorial_group_id: Uuid) -> Self {
        Self {
            tutorial_group_id,
            created: 0,
            deleted: 0,
            cancelled: 0,
            reactivated: 0,
        }
    }
}

/// Observer notified of schedule lifecycle events.
pub trait ScheduleChangeObserver: Send + Sync {
    fn schedule_created(&self, tutorial_group_id: Uuid, schedule_id: Uuid);
    fn schedule_deleted(&self, tutorial_group_id: Uuid, schedule_id: Uuid);
    fn sessions_changed(&self, change: &SessionChange);
}

/// Default observer that only emits tracing events.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingObserver;

impl ScheduleChangeObserver for LoggingObserver {
    fn schedule_created(&self, tutorial_group_id: Uuid, schedule_id: Uuid) {
        tracing::info!(%tutorial_group_id, %schedule_id, "schedule created");
    }

    fn schedule_deleted(&self, tutorial_group_id: Uuid, schedule_id: Uuid) {
        tracing::info!(%tutorial_group_id, %schedule_id, "schedule deleted");
    }

    fn sessions_changed(&self, change: &SessionChange) {
        let payload = serde_json::json!({
            "tutorial_group_id": change.tutorial_group_id,
            "created": change.created,
            "deleted": change.deleted,
            "cancelled": change.cancelled,
            "reactivated": change.reactivated,
        });
        tracing::info!(%payload, "sessions changed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn test_logging_observer_accepts_all_events() {
        let observer = LoggingObserver;
        let group = Uuid::new_v4();
        observer.schedule_created(group, Uuid::new_v4());
        observer.sessions_changed(&SessionChange {
            created: 3,
            deleted: 1,
            ..SessionChange::none(group)
        });
        observer.schedule_deleted(group, Uuid::new_v4());
    }
}
