use chrono::{DateTime, Utc};
use uuid::Uuid;

use shared_database::EventRecord;

/// Half-open interval intersection. Intervals that merely touch at an
/// endpoint do not overlap, so back-to-back bookings are allowed.
pub fn intervals_overlap(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    other_start: DateTime<Utc>,
    other_end: DateTime<Utc>,
) -> bool {
    start < other_end && end > other_start
}

/// Events from `existing` that collide with the proposed `[start, end)` slot.
/// `exclude` skips the event being rescheduled so it never conflicts with
/// itself.
pub fn find_conflicts<'a>(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    existing: &'a [EventRecord],
    exclude: Option<Uuid>,
) -> Vec<&'a EventRecord> {
    existing
        .iter()
        .filter(|event| exclude.map_or(true, |id| event.id != id))
        .filter(|event| intervals_overlap(start, end, event.start_at, event.end_at()))
        .collect()
}
