//! Writing a reconciled plan to the cloud calendar.

use std::fmt;

use tracing::{debug, info};

use crate::error::{SyncError, SyncResult};
use crate::reconcile::SyncPlan;
use crate::remote::CalendarService;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOp {
    Update,
    Insert,
}

impl fmt::Display for WriteOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteOp::Update => write!(f, "update"),
            WriteOp::Insert => write!(f, "insert"),
        }
    }
}

/// Writes that reached the cloud calendar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub updated: usize,
    pub inserted: usize,
}

impl ApplyReport {
    pub fn total(&self) -> usize {
        self.updated + self.inserted
    }
}

impl fmt::Display for ApplyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} updated, {} inserted", self.updated, self.inserted)
    }
}

/// Applies a `SyncPlan` through a `CalendarService`.
pub struct CloudWriter<'a, S> {
    service: &'a S,
}

impl<'a, S: CalendarService> CloudWriter<'a, S> {
    pub fn new(service: &'a S) -> Self {
        CloudWriter { service }
    }

    /// Apply all updates, then all inserts.
    ///
    /// Fail-fast: the first failing write aborts the remaining ones. The
    /// returned `SyncError::Write` names the failed event and carries the
    /// report of writes that had already succeeded.
    pub async fn apply(&self, plan: &SyncPlan) -> SyncResult<ApplyReport> {
        let mut report = ApplyReport::default();

        for event in &plan.updates {
            let event_id = event.source_id().to_string();
            let Some(remote_id) = event.remote_id.as_deref() else {
                return Err(SyncError::Write {
                    op: WriteOp::Update,
                    event_id,
                    applied: report,
                    source: "planned update has no cloud event id".into(),
                });
            };

            match self.service.update(remote_id, event).await {
                Ok(_) => {
                    debug!(%event_id, remote_id, summary = %event.summary, "updated");
                    report.updated += 1;
                }
                Err(e) => {
                    return Err(SyncError::Write {
                        op: WriteOp::Update,
                        event_id,
                        applied: report,
                        source: Box::new(e),
                    });
                }
            }
        }

        for event in &plan.inserts {
            let event_id = event.source_id().to_string();

            match self.service.insert(event).await {
                Ok(created) => {
                    debug!(%event_id, remote_id = %created.id, summary = %event.summary, "inserted");
                    report.inserted += 1;
                }
                Err(e) => {
                    return Err(SyncError::Write {
                        op: WriteOp::Insert,
                        event_id,
                        applied: report,
                        source: Box::new(e),
                    });
                }
            }
        }

        info!(updated = report.updated, inserted = report.inserted, "applied plan");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::event::{RemoteEvent, Reminders, TargetEvent, ZonedTime};
    use crate::window::SyncWindow;
    use chrono::TimeZone;
    use chrono_tz::Asia;

    /// Records calls; fails the write whose description is in `fail_on`.
    #[derive(Default)]
    struct RecordingCalendar {
        calls: RefCell<Vec<String>>,
        fail_on: Option<String>,
    }

    impl CalendarService for RecordingCalendar {
        async fn list(&self, _window: &SyncWindow) -> SyncResult<Vec<RemoteEvent>> {
            Ok(Vec::new())
        }

        async fn insert(&self, event: &TargetEvent) -> SyncResult<RemoteEvent> {
            self.calls.borrow_mut().push(format!("insert {}", event.description));
            if self.fail_on.as_deref() == Some(event.description.as_str()) {
                return Err(SyncError::remote("insert", "backend error"));
            }
            Ok(RemoteEvent {
                id: format!("new-{}", event.description),
                summary: event.summary.clone(),
                description: event.description.clone(),
            })
        }

        async fn update(&self, event_id: &str, event: &TargetEvent) -> SyncResult<RemoteEvent> {
            self.calls.borrow_mut().push(format!("update {} {}", event_id, event.description));
            if self.fail_on.as_deref() == Some(event.description.as_str()) {
                return Err(SyncError::remote("update", "backend error"));
            }
            Ok(RemoteEvent {
                id: event_id.to_string(),
                summary: event.summary.clone(),
                description: event.description.clone(),
            })
        }
    }

    fn target(description: &str, remote_id: Option<&str>) -> TargetEvent {
        let start = Asia::Tokyo.with_ymd_and_hms(2025, 3, 18, 10, 0, 0).unwrap();
        TargetEvent {
            summary: description.to_string(),
            description: description.to_string(),
            start: ZonedTime::new(start, Asia::Tokyo),
            end: ZonedTime::new(start, Asia::Tokyo),
            reminders: Reminders::single_popup(5),
            remote_id: remote_id.map(str::to_string),
        }
    }

    fn two_by_two() -> SyncPlan {
        SyncPlan {
            updates: vec![target("u1", Some("g-1")), target("u2", Some("g-2"))],
            inserts: vec![target("i1", None), target("i2", None)],
        }
    }

    #[tokio::test]
    async fn updates_are_applied_before_inserts() {
        let calendar = RecordingCalendar::default();

        let report = CloudWriter::new(&calendar).apply(&two_by_two()).await.unwrap();

        assert_eq!(report, ApplyReport { updated: 2, inserted: 2 });
        assert_eq!(
            *calendar.calls.borrow(),
            vec!["update g-1 u1", "update g-2 u2", "insert i1", "insert i2"]
        );
    }

    #[tokio::test]
    async fn first_failure_stops_remaining_writes() {
        let calendar = RecordingCalendar {
            fail_on: Some("i1".to_string()),
            ..Default::default()
        };

        let err = CloudWriter::new(&calendar)
            .apply(&two_by_two())
            .await
            .unwrap_err();

        match err {
            SyncError::Write {
                op,
                event_id,
                applied,
                ..
            } => {
                assert_eq!(op, WriteOp::Insert);
                assert_eq!(event_id, "i1");
                assert_eq!(applied, ApplyReport { updated: 2, inserted: 0 });
            }
            other => panic!("expected a write error, got {other:?}"),
        }
        assert_eq!(calendar.calls.borrow().len(), 3, "i2 must not be attempted");
    }

    #[tokio::test]
    async fn update_without_cloud_id_is_rejected() {
        let calendar = RecordingCalendar::default();
        let plan = SyncPlan {
            updates: vec![target("u1", None)],
            inserts: vec![],
        };

        let err = CloudWriter::new(&calendar).apply(&plan).await.unwrap_err();

        assert!(matches!(err, SyncError::Write { op: WriteOp::Update, .. }));
        assert!(calendar.calls.borrow().is_empty());
    }
}
