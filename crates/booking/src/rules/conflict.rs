//! Interval overlap detection for members and coaches.

use chrono::{DateTime, Duration, Utc};
use gymbook_database::ClassSession;

/// Whether `[start_a, start_a + duration_a)` and `[start_b, start_b + duration_b)` intersect.
///
/// Touching intervals, where one ends exactly when the other starts, do not overlap.
pub fn overlaps(
    start_a: DateTime<Utc>,
    duration_a: Duration,
    start_b: DateTime<Utc>,
    duration_b: Duration,
) -> bool {
    let end_a = start_a + duration_a;
    let end_b = start_b + duration_b;
    start_a < end_b && start_b < end_a
}

pub fn sessions_overlap(a: &ClassSession, b: &ClassSession) -> bool {
    overlaps(a.starts_at, a.duration(), b.starts_at, b.duration())
}
