//! RRULE expansion for recurring appointments.
//!
//! Expands a master appointment into the start instants of its occurrences
//! inside a window, honouring EXDATEs.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use rrule::RRuleSet;

use crate::window::SyncWindow;

/// Safety cap on generated occurrences per master.
const MAX_OCCURRENCES: u16 = 1000;

/// Build an iCalendar-format rule set string for the rrule crate parser.
///
/// `start` and `exdates` are rendered in the master's own zone so that
/// wall-clock recurrences survive DST changes.
fn build_rrule_string(start: &DateTime<Tz>, rrule: &str, exdates: &[DateTime<Tz>]) -> String {
    let zone = start.timezone();
    let mut lines = vec![format!("DTSTART{}", format_instant(start, zone))];

    lines.push(format!("RRULE:{}", until_in_utc(rrule, zone)));

    for exdate in exdates {
        let exdate = exdate.with_timezone(&zone);
        lines.push(format!("EXDATE{}", format_instant(&exdate, zone)));
    }

    lines.join("\n")
}

/// Rewrite a date-only or floating `UNTIL` as a UTC instant, which is the
/// only form accepted next to a zoned DTSTART. A date covers that whole local
/// day. Values that do not parse are left for the rule parser to reject.
fn until_in_utc(rrule: &str, zone: Tz) -> String {
    rrule
        .split(';')
        .map(|part| {
            let Some((key, value)) = part.split_once('=') else {
                return part.to_string();
            };
            if !key.eq_ignore_ascii_case("UNTIL") || value.ends_with(['Z', 'z']) {
                return part.to_string();
            }

            let local = match NaiveDate::parse_from_str(value, "%Y%m%d") {
                Ok(date) => date.and_hms_opt(23, 59, 59),
                Err(_) => NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S").ok(),
            };

            match local.and_then(|naive| zone.from_local_datetime(&naive).latest()) {
                Some(until) => format!("{}={}", key, until.to_utc().format("%Y%m%dT%H%M%SZ")),
                None => part.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join(";")
}

fn format_instant(time: &DateTime<Tz>, zone: Tz) -> String {
    if zone == chrono_tz::UTC {
        format!(":{}", time.format("%Y%m%dT%H%M%SZ"))
    } else {
        format!(";TZID={}:{}", zone.name(), time.format("%Y%m%dT%H%M%S"))
    }
}

/// Start instants of every occurrence of `rrule` (anchored at `start`) that
/// begin inside `window`, expressed in the window's zone.
pub(crate) fn occurrences_in_window(
    uid: &str,
    start: &DateTime<Tz>,
    rrule: &str,
    exdates: &[DateTime<Tz>],
    window: &SyncWindow,
) -> Result<Vec<DateTime<Tz>>, String> {
    let rrule_str = build_rrule_string(start, rrule, exdates);

    let rrule_set: RRuleSet = rrule_str
        .parse()
        .map_err(|e| format!("invalid recurrence rule for '{}': {}", uid, e))?;

    // after/before are exclusive; widen by a second and filter afterwards
    let tz: rrule::Tz = Utc.into();
    let after = (window.start_utc() - Duration::seconds(1)).with_timezone(&tz);
    let before = (window.end_utc() + Duration::seconds(1)).with_timezone(&tz);

    let result = rrule_set.after(after).before(before).all(MAX_OCCURRENCES);
    if result.limited {
        tracing::warn!(uid, "recurrence expansion hit the occurrence cap");
    }

    let display_zone = window.time_zone();
    Ok(result
        .dates
        .iter()
        .map(|dt| dt.with_timezone(&display_zone))
        .filter(|dt| window.contains(dt))
        .collect())
}
