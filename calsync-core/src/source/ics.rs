//! Local calendar store backed by iCalendar files.
//!
//! The store is either a single `.ics` file (a desktop client's calendar
//! export) or a directory of `.ics` files. Components are parsed with the
//! icalendar crate's parser; recurring masters are expanded per window.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use icalendar::parser::{Component, Property, read_calendar, unfold};
use icalendar::{CalendarDateTime, DatePerhapsTime};
use tracing::{debug, warn};

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::event::SourceEvent;
use crate::source::recurrence::occurrences_in_window;
use crate::source::{EventSource, sort_by_start};
use crate::window::{SyncWindow, local_midnight};

/// Reads appointments from `.ics` data on disk.
pub struct IcsCalendarSource {
    path: PathBuf,
    config: SyncConfig,
}

/// One VEVENT as parsed, before expansion.
#[derive(Debug, Clone)]
struct IcsEvent {
    uid: String,
    summary: String,
    start: DateTime<Tz>,
    end: DateTime<Tz>,
    status_cancelled: bool,
    rrule: Option<String>,
    exdates: Vec<DateTime<Tz>>,
    recurrence_id: Option<DateTime<Tz>>,
}

impl IcsCalendarSource {
    pub fn new(path: impl Into<PathBuf>, config: &SyncConfig) -> Self {
        IcsCalendarSource {
            path: path.into(),
            config: config.clone(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn unavailable(&self, reason: impl ToString) -> SyncError {
        SyncError::SourceUnavailable {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }

    /// Fail early when the store cannot be listed at all.
    pub fn check(&self) -> SyncResult<()> {
        self.ics_files().map(|_| ())
    }

    /// The files making up the store, in a stable order.
    fn ics_files(&self) -> SyncResult<Vec<PathBuf>> {
        let metadata = std::fs::metadata(&self.path).map_err(|e| self.unavailable(e))?;

        if metadata.is_file() {
            return Ok(vec![self.path.clone()]);
        }

        let mut files: Vec<PathBuf> = std::fs::read_dir(&self.path)
            .map_err(|e| self.unavailable(e))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("ics"))
            })
            .collect();
        files.sort();

        Ok(files)
    }

    fn read_events(&self, fallback: Tz) -> SyncResult<Vec<IcsEvent>> {
        let mut events = Vec::new();

        for file in self.ics_files()? {
            let bytes = match std::fs::read(&file) {
                Ok(bytes) => bytes,
                // The store itself is a single unreadable file
                Err(e) if file == self.path => return Err(self.unavailable(e)),
                Err(e) => {
                    warn!(file = %file.display(), error = %e, "skipping unreadable calendar file");
                    continue;
                }
            };

            let parsed = String::from_utf8(bytes)
                .map_err(|e| format!("not UTF-8: {}", e))
                .and_then(|content| parse_calendar(&content, fallback));

            match parsed {
                Ok(parsed) => {
                    debug!(file = %file.display(), events = parsed.len(), "parsed calendar file");
                    events.extend(parsed);
                }
                Err(reason) => warn!(file = %file.display(), %reason, "skipping unreadable calendar file"),
            }
        }

        Ok(events)
    }
}

impl EventSource for IcsCalendarSource {
    fn fetch_window(&self, window: &SyncWindow) -> SyncResult<Vec<SourceEvent>> {
        let parsed = self.read_events(window.time_zone())?;
        let mut events = expand_into_window(&parsed, window, &self.config);
        sort_by_start(&mut events);

        debug!(
            path = %self.path.display(),
            components = parsed.len(),
            instances = events.len(),
            "read local calendar"
        );

        Ok(events)
    }
}

/// Turn parsed components into concrete instances starting inside `window`.
///
/// Recurrence overrides (RECURRENCE-ID) replace the generated instance they
/// refer to, wherever the override itself was moved.
fn expand_into_window(
    events: &[IcsEvent],
    window: &SyncWindow,
    config: &SyncConfig,
) -> Vec<SourceEvent> {
    let zone = window.time_zone();
    let overridden: HashSet<String> = events
        .iter()
        .filter_map(|e| e.recurrence_id.map(|rid| instance_id(&e.uid, &rid)))
        .collect();

    let mut seen = HashSet::new();
    let mut instances = Vec::new();

    let mut push = |id: String, event: &IcsEvent, start: DateTime<Tz>, end: DateTime<Tz>| {
        if !seen.insert(id.clone()) {
            warn!(%id, "duplicate appointment id, keeping the first one");
            return;
        }
        instances.push(SourceEvent {
            cancelled: event.status_cancelled || config.has_cancellation_marker(&event.summary),
            id,
            subject: event.summary.clone(),
            start,
            end,
        });
    };

    for event in events {
        match (&event.rrule, &event.recurrence_id) {
            (Some(rrule), None) => {
                let duration = event.end - event.start;
                let starts =
                    match occurrences_in_window(&event.uid, &event.start, rrule, &event.exdates, window) {
                        Ok(starts) => starts,
                        Err(reason) => {
                            warn!(uid = %event.uid, %reason, "skipping recurring appointment");
                            continue;
                        }
                    };

                for start in starts {
                    let id = instance_id(&event.uid, &start);
                    if overridden.contains(&id) {
                        continue;
                    }
                    push(id, event, start, start + duration);
                }
            }
            (_, Some(rid)) => {
                let start = event.start.with_timezone(&zone);
                if window.contains(&start) {
                    push(instance_id(&event.uid, rid), event, start, event.end.with_timezone(&zone));
                }
            }
            (None, None) => {
                let start = event.start.with_timezone(&zone);
                if window.contains(&start) {
                    push(event.uid.clone(), event, start, event.end.with_timezone(&zone));
                }
            }
        }
    }

    instances
}

/// Stable id of one instance of a recurring appointment.
fn instance_id(uid: &str, original_start: &DateTime<Tz>) -> String {
    format!(
        "{}/{}",
        uid,
        original_start.with_timezone(&Utc).format("%Y%m%dT%H%M%SZ")
    )
}

fn parse_calendar(content: &str, fallback: Tz) -> Result<Vec<IcsEvent>, String> {
    let unfolded = unfold(content.strip_prefix('\u{FEFF}').unwrap_or(content));
    let calendar = read_calendar(&unfolded)?;

    Ok(calendar
        .components
        .iter()
        .filter(|c| c.name == "VEVENT")
        .filter_map(|vevent| {
            let parsed = parse_vevent(vevent, fallback);
            if parsed.is_none() {
                warn!("skipping VEVENT without UID or a usable DTSTART");
            }
            parsed
        })
        .collect())
}

fn parse_vevent(vevent: &Component<'_>, fallback: Tz) -> Option<IcsEvent> {
    let uid = vevent.find_prop("UID")?.val.to_string();
    let summary = vevent
        .find_prop("SUMMARY")
        .map(|p| unescape_text(p.val.as_ref()))
        .unwrap_or_default();

    let dtstart = DatePerhapsTime::try_from(vevent.find_prop("DTSTART")?).ok()?;
    let all_day = matches!(dtstart, DatePerhapsTime::Date(_));
    let start = resolve_time(dtstart, fallback)?;

    let end = match vevent
        .find_prop("DTEND")
        .and_then(|p| DatePerhapsTime::try_from(p).ok())
    {
        Some(dtend) => resolve_time(dtend, fallback)?,
        None if all_day => {
            let next_day = start.date_naive().checked_add_days(Days::new(1))?;
            local_midnight(next_day, fallback).ok()?
        }
        None => start,
    };

    let status_cancelled = vevent
        .find_prop("STATUS")
        .is_some_and(|p| p.val.as_ref().eq_ignore_ascii_case("CANCELLED"));

    let rrule = vevent.find_prop("RRULE").map(|p| p.val.to_string());
    let exdates = vevent
        .properties
        .iter()
        .filter(|p| p.name == "EXDATE")
        .flat_map(|p| parse_exdate_property(p, fallback))
        .collect();

    let recurrence_id = vevent
        .find_prop("RECURRENCE-ID")
        .and_then(|p| DatePerhapsTime::try_from(p).ok())
        .and_then(|t| resolve_time(t, fallback));

    Some(IcsEvent {
        uid,
        summary,
        start,
        end,
        status_cancelled,
        rrule,
        exdates,
        recurrence_id,
    })
}

/// Pin an iCalendar time to an instant, keeping the zone it was written in.
fn resolve_time(time: DatePerhapsTime, fallback: Tz) -> Option<DateTime<Tz>> {
    match time {
        DatePerhapsTime::Date(date) => local_midnight(date, fallback).ok(),
        DatePerhapsTime::DateTime(cal_dt) => match cal_dt {
            CalendarDateTime::Utc(dt) => Some(dt.with_timezone(&chrono_tz::UTC)),
            CalendarDateTime::Floating(naive) => in_zone(naive, fallback),
            CalendarDateTime::WithTimezone { date_time, tzid } => {
                in_zone(date_time, resolve_zone(&tzid, fallback))
            }
        },
    }
}

fn in_zone(naive: NaiveDateTime, zone: Tz) -> Option<DateTime<Tz>> {
    zone.from_local_datetime(&naive).earliest()
}

/// IANA names resolve directly; anything else (Windows zone names from
/// desktop exports) is read in the configured zone.
fn resolve_zone(tzid: &str, fallback: Tz) -> Tz {
    let name = tzid.trim_matches('"');
    name.parse::<Tz>().unwrap_or_else(|_| {
        debug!(tzid = name, fallback = fallback.name(), "unknown TZID, using configured zone");
        fallback
    })
}

/// Parse an EXDATE property (possibly comma-separated) into instants.
fn parse_exdate_property(prop: &Property<'_>, fallback: Tz) -> Vec<DateTime<Tz>> {
    let tzid = prop
        .params
        .iter()
        .find(|p| p.key == "TZID")
        .and_then(|p| p.val.as_ref().map(|v| v.to_string()));

    let is_date = prop
        .params
        .iter()
        .any(|p| p.key == "VALUE" && p.val.as_ref().map(|v| v.as_ref()) == Some("DATE"));

    prop.val
        .as_ref()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| {
            if is_date {
                NaiveDate::parse_from_str(s, "%Y%m%d")
                    .ok()
                    .and_then(|d| local_midnight(d, fallback).ok())
            } else if let Some(stripped) = s.strip_suffix('Z') {
                NaiveDateTime::parse_from_str(stripped, "%Y%m%dT%H%M%S")
                    .ok()
                    .map(|dt| dt.and_utc().with_timezone(&chrono_tz::UTC))
            } else {
                let zone = tzid
                    .as_deref()
                    .map(|tz| resolve_zone(tz, fallback))
                    .unwrap_or(fallback);
                NaiveDateTime::parse_from_str(s, "%Y%m%dT%H%M%S")
                    .ok()
                    .and_then(|dt| in_zone(dt, zone))
            }
        })
        .collect()
}

/// Undo RFC 5545 TEXT escaping.
fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }

    out
}
