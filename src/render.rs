//! Colored terminal output for sync plans and results.

use calsync_core::{SyncOutcome, TargetEvent, WriteOp};
use owo_colors::OwoColorize;

/// Above this many events per kind the plan is shown as counts.
const COMPACT_THRESHOLD: usize = 10;

pub trait Render {
    fn render(&self) -> String;
}

impl Render for WriteOp {
    fn render(&self) -> String {
        match self {
            WriteOp::Update => "~".yellow().to_string(),
            WriteOp::Insert => "+".green().to_string(),
        }
    }
}

fn render_event(op: WriteOp, event: &TargetEvent, date_format: &str) -> String {
    let summary = match op {
        WriteOp::Update => event.summary.yellow().to_string(),
        WriteOp::Insert => event.summary.green().to_string(),
    };
    let time = event.start.date_time.format(date_format).to_string();

    format!("{} {} {}", op.render(), summary, time.dimmed())
}

fn render_events(
    op: WriteOp,
    events: &[TargetEvent],
    date_format: &str,
    verbose: bool,
    lines: &mut Vec<String>,
) {
    if events.is_empty() {
        return;
    }

    if verbose || events.len() <= COMPACT_THRESHOLD {
        for event in events {
            lines.push(format!("   {}", render_event(op, event, date_format)));
        }
    } else {
        let label = match op {
            WriteOp::Update => format!("({} {} to update)", events.len(), pluralize(events.len())),
            WriteOp::Insert => format!("({} new {})", events.len(), pluralize(events.len())),
        };
        lines.push(format!("   {} {}", op.render(), label.dimmed()));
    }
}

fn pluralize(count: usize) -> &'static str {
    if count == 1 { "event" } else { "events" }
}

/// The per-run report printed to stdout.
pub fn render_outcome(outcome: &SyncOutcome, date_format: &str, verbose: bool) -> String {
    let window = &outcome.window;
    let mut lines = vec![format!(
        "📅 {} → {} ({})",
        window.start.format("%Y-%m-%d"),
        window.end.format("%Y-%m-%d"),
        window.time_zone().name()
    )];

    if outcome.plan.is_empty() {
        lines.push("   No events in window".dimmed().to_string());
    } else {
        render_events(WriteOp::Update, &outcome.plan.updates, date_format, verbose, &mut lines);
        render_events(WriteOp::Insert, &outcome.plan.inserts, date_format, verbose, &mut lines);
    }

    lines.push(String::new());
    lines.push(
        format!(
            "Read {} {}, skipped {} cancelled",
            outcome.fetched,
            pluralize(outcome.fetched),
            outcome.skipped
        )
        .dimmed()
        .to_string(),
    );

    match outcome.report {
        Some(report) => lines.push(format!("Synced: {}", report)),
        None => lines.push(format!(
            "Dry run: {} {}",
            outcome.plan,
            "(nothing written)".dimmed()
        )),
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use calsync_core::{ApplyReport, Reminders, SyncPlan, SyncWindow, ZonedTime};
    use chrono::{TimeZone, Utc};
    use chrono_tz::Asia;

    fn event(summary: &str, day: u32) -> TargetEvent {
        let start = Asia::Tokyo.with_ymd_and_hms(2025, 3, day, 14, 0, 0).unwrap();
        TargetEvent {
            summary: summary.to_string(),
            description: format!("ID-{day}"),
            start: ZonedTime::new(start, Asia::Tokyo),
            end: ZonedTime::new(start, Asia::Tokyo),
            reminders: Reminders::single_popup(5),
            remote_id: None,
        }
    }

    fn outcome(plan: SyncPlan, report: Option<ApplyReport>) -> SyncOutcome {
        let now = Utc.with_ymd_and_hms(2025, 3, 17, 0, 0, 0).unwrap();
        SyncOutcome {
            window: SyncWindow::starting_at(now, Asia::Tokyo, 7).unwrap(),
            fetched: 3,
            skipped: 1,
            plan,
            report,
        }
    }

    #[test]
    fn lists_each_event_with_its_time() {
        let plan = SyncPlan {
            updates: vec![event("[会議]Roadmap review", 18)],
            inserts: vec![event("[会議]Hiring sync", 19)],
        };

        let text = render_outcome(
            &outcome(plan, Some(ApplyReport { updated: 1, inserted: 1 })),
            "%Y-%m-%dT%H:%M:%S",
            false,
        );

        assert!(text.contains("2025-03-17 → 2025-03-24 (Asia/Tokyo)"));
        assert!(text.contains("[会議]Roadmap review"));
        assert!(text.contains("2025-03-19T14:00:00"));
        assert!(text.contains("Synced: 1 updated, 1 inserted"));
    }

    #[test]
    fn dry_run_says_nothing_was_written() {
        let plan = SyncPlan {
            updates: vec![],
            inserts: vec![event("a", 18)],
        };

        let text = render_outcome(&outcome(plan, None), "%H:%M", false);

        assert!(text.contains("Dry run: 0 to update, 1 to insert"));
        assert!(text.contains("nothing written"));
    }

    #[test]
    fn large_plans_are_compacted_unless_verbose() {
        let plan = SyncPlan {
            updates: vec![],
            inserts: (1..=12).map(|d| event("bulk", d)).collect(),
        };

        let compact = render_outcome(&outcome(plan.clone(), None), "%H:%M", false);
        let full = render_outcome(&outcome(plan, None), "%H:%M", true);

        assert!(compact.contains("12 new events"));
        assert!(!compact.contains("bulk"));
        assert_eq!(full.matches("bulk").count(), 12);
    }

    #[test]
    fn empty_plan_is_called_out() {
        let text = render_outcome(&outcome(SyncPlan::default(), None), "%H:%M", false);

        assert!(text.contains("No events in window"));
    }
}
