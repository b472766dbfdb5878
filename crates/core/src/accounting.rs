//! Hour accounting for generation outcomes.
//!
//! A shared course session is stored once (sentinel group), so scheduled
//! hours sum session durations directly. Required hours are group-aware:
//! seminars and laboratories multiply by each enrolled group's split
//! factor, because every subgroup receives its own independent sessions.

use types::{Activity, Catalog, Subject};

/// Whole sessions obtainable from `hours` at `len` hours apiece.
pub fn session_count(hours: u32, len: u32) -> u32 {
    if len == 0 {
        0
    } else {
        hours / len
    }
}

/// Laboratory hours are already rounded up from a possibly fractional
/// weekly count; partial leftovers still earn a full session.
pub fn laboratory_session_count(hours: u32, len: u32) -> u32 {
    if len == 0 {
        0
    } else {
        hours.div_ceil(len)
    }
}

/// Required weekly hours for `subject` given its enrolled groups. A
/// subject nobody takes keeps its base weekly hours so that an empty
/// schedule against a nonzero requirement reads as a failure.
pub fn required_hours(catalog: &Catalog, subject: &Subject) -> u32 {
    let groups = catalog.groups_for(&subject.id);
    if groups.is_empty() {
        return subject.weekly_hours();
    }

    let mut total = session_count(subject.course_hours(), subject.course_len) * subject.course_len;

    let seminar_sessions = session_count(subject.seminar_hours(), subject.seminar_len);
    let lab_sessions =
        laboratory_session_count(subject.laboratory_hours(), subject.laboratory_len);
    for group in groups.iter().filter_map(|id| catalog.group(id)) {
        total += group.seminar_split.max(1) * seminar_sessions * subject.seminar_len;
        total += group.laboratory_split.max(1) * lab_sessions * subject.laboratory_len;
    }
    total
}

/// Unique hours scheduled: every non-placeholder activity is one
/// contiguous session counted once.
pub fn scheduled_hours(activities: &[Activity]) -> u32 {
    activities
        .iter()
        .filter(|a| !a.kind.is_placeholder())
        .map(Activity::duration_hours)
        .sum()
}

/// Aggregate completion percentage, rounded to one decimal place.
pub fn success_rate(scheduled: f64, required: f64) -> f64 {
    if required <= 0.0 {
        return 0.0;
    }
    let rate = scheduled / required * 100.0;
    (rate * 10.0).round() / 10.0
}
