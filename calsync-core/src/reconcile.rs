//! Matching transformed events against what already exists in the cloud.
//!
//! The join key is the description field: a target event whose description
//! equals an existing cloud event's description updates that event, anything
//! else is inserted. Each existing cloud event is claimed at most once per run.

use std::fmt;

use tracing::{debug, info};

use crate::error::SyncResult;
use crate::event::{RemoteEvent, TargetEvent};
use crate::remote::CalendarService;
use crate::window::SyncWindow;

/// Classified writes for one run. Every update carries `remote_id`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncPlan {
    pub updates: Vec<TargetEvent>,
    pub inserts: Vec<TargetEvent>,
}

impl SyncPlan {
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.inserts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.updates.len() + self.inserts.len()
    }
}

impl fmt::Display for SyncPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to update, {} to insert",
            self.updates.len(),
            self.inserts.len()
        )
    }
}

/// Classify `targets` against a fixed snapshot of `existing` cloud events.
///
/// Scans in order and takes the first unclaimed event with an equal
/// description. Claimed events are flagged by index; the snapshot itself is
/// never modified while it is being scanned.
pub fn plan(targets: Vec<TargetEvent>, existing: &[RemoteEvent]) -> SyncPlan {
    let mut claimed = vec![false; existing.len()];
    let mut plan = SyncPlan::default();

    for mut target in targets {
        let hit = existing.iter().enumerate().find_map(|(i, remote)| {
            let free = !claimed[i] && !remote.description.is_empty();
            (free && remote.description == target.description).then_some(i)
        });

        match hit {
            Some(i) => {
                claimed[i] = true;
                target.remote_id = Some(existing[i].id.clone());
                plan.updates.push(target);
            }
            None => {
                target.remote_id = None;
                plan.inserts.push(target);
            }
        }
    }

    plan
}

/// List the cloud events of `window` and classify `targets` against them.
pub async fn reconcile<S: CalendarService>(
    service: &S,
    window: &SyncWindow,
    targets: Vec<TargetEvent>,
) -> SyncResult<SyncPlan> {
    let existing = service.list(window).await?;
    debug!(existing = existing.len(), "fetched existing cloud events");

    let plan = plan(targets, &existing);
    info!(updates = plan.updates.len(), inserts = plan.inserts.len(), "reconciled");

    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Reminders, ZonedTime};
    use chrono::TimeZone;
    use chrono_tz::Asia;

    fn target(description: &str) -> TargetEvent {
        let start = Asia::Tokyo.with_ymd_and_hms(2025, 3, 18, 10, 0, 0).unwrap();
        TargetEvent {
            summary: format!("[会議]{}", description),
            description: description.to_string(),
            start: ZonedTime::new(start, Asia::Tokyo),
            end: ZonedTime::new(start + chrono::Duration::hours(1), Asia::Tokyo),
            reminders: Reminders::single_popup(5),
            remote_id: None,
        }
    }

    fn remote(id: &str, description: &str) -> RemoteEvent {
        RemoteEvent {
            id: id.to_string(),
            summary: "existing".to_string(),
            description: description.to_string(),
        }
    }

    #[test]
    fn matching_description_becomes_update_with_cloud_id() {
        let plan = plan(vec![target("ID-1")], &[remote("g-1", "ID-1")]);

        assert!(plan.inserts.is_empty());
        assert_eq!(plan.updates.len(), 1);
        assert_eq!(plan.updates[0].remote_id.as_deref(), Some("g-1"));
    }

    #[test]
    fn no_match_becomes_insert() {
        let plan = plan(vec![target("ID-2")], &[remote("g-1", "ID-1")]);

        assert!(plan.updates.is_empty());
        assert_eq!(plan.inserts.len(), 1);
        assert!(plan.inserts[0].remote_id.is_none());
    }

    #[test]
    fn each_cloud_event_is_claimed_at_most_once() {
        let targets = vec![target("ID-1"), target("ID-1"), target("ID-1")];
        let existing = [remote("g-1", "ID-1"), remote("g-2", "ID-1")];

        let plan = plan(targets, &existing);

        let claimed: Vec<_> = plan
            .updates
            .iter()
            .map(|t| t.remote_id.clone().unwrap())
            .collect();
        assert_eq!(claimed, vec!["g-1".to_string(), "g-2".to_string()]);
        assert_eq!(plan.inserts.len(), 1);
    }

    #[test]
    fn empty_descriptions_never_match() {
        let mut blank = target("");
        blank.description = String::new();

        let plan = plan(vec![blank], &[remote("g-1", "")]);

        assert_eq!(plan.inserts.len(), 1);
    }

    #[test]
    fn order_of_targets_is_preserved() {
        let plan = plan(
            vec![target("a"), target("b"), target("c")],
            &[remote("g-c", "c"), remote("g-a", "a")],
        );

        let updated: Vec<&str> = plan.updates.iter().map(|t| t.description.as_str()).collect();
        assert_eq!(updated, vec!["a", "c"]);
        assert_eq!(plan.to_string(), "2 to update, 1 to insert");
        assert_eq!(plan.len(), 3);
    }
}
