//! Expansion of recurring event definitions into concrete occurrences

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};

use crate::config;
use crate::item::Interval;

/// How often a recurring event repeats. Wire values are the backend's
/// uppercase strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecurrenceRule {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

/// One concrete occurrence of a recurring definition.
///
/// The ordinal counts periods since the first occurrence, so it is absolute:
/// expanding the same definition against the same window always yields the
/// same `(ordinal, interval)` pairs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Occurrence {
    pub ordinal: u32,
    pub interval: Interval,
}

/// Hard stop against series that would expand forever (e.g. a daily rule with
/// an end date decades away). Hitting it is logged, not an error.
const MAX_OCCURRENCES: u32 = 5000;

/// Expand a recurring definition into the occurrences intersecting `window`.
///
/// A series with no `until` repeats for [`config::OPEN_SERIES_HORIZON_DAYS`]
/// past its first start. Occurrences outside the window are not materialized.
pub fn expand(starts_at: DateTime<Utc>,
              ends_at: DateTime<Utc>,
              rule: RecurrenceRule,
              until: Option<DateTime<Utc>>,
              window: &Interval,
            ) -> Vec<Occurrence>
{
    let duration = ends_at - starts_at;
    if duration <= Duration::zero() {
        log::warn!("Refusing to expand a series with a non-positive duration (starts {})", starts_at);
        return Vec::new();
    }

    let series_end = until.unwrap_or_else(|| {
        starts_at + Duration::days(config::open_series_horizon_days())
    });

    let mut occurrences = Vec::new();
    for ordinal in 0..MAX_OCCURRENCES {
        let occ_start = match nth_start(starts_at, rule, ordinal) {
            Some(t) => t,
            None => break,
        };
        if ordinal > 0 && occ_start > series_end {
            break;
        }
        if occ_start >= window.end() {
            break;
        }
        let occ_end = occ_start + duration;
        if occ_end > window.start() {
            // constructing from a positive duration cannot fail
            if let Ok(interval) = Interval::new(occ_start, occ_end) {
                occurrences.push(Occurrence { ordinal, interval });
            }
        }
    }
    if occurrences.len() as u32 == MAX_OCCURRENCES {
        log::warn!("Series starting {} was truncated at {} occurrences", starts_at, MAX_OCCURRENCES);
    }
    occurrences
}

fn nth_start(starts_at: DateTime<Utc>, rule: RecurrenceRule, ordinal: u32) -> Option<DateTime<Utc>> {
    match rule {
        RecurrenceRule::Daily => Some(starts_at + Duration::days(i64::from(ordinal))),
        RecurrenceRule::Weekly => Some(starts_at + Duration::weeks(i64::from(ordinal))),
        RecurrenceRule::Monthly => starts_at.checked_add_months(Months::new(ordinal)),
        RecurrenceRule::Yearly => starts_at.checked_add_months(Months::new(ordinal.checked_mul(12)?)),
    }
}
