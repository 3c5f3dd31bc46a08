use gymbook_database::{Booking, BookingStatus};

use crate::types::StatsResult;

/// Count bookings per status and derive the no-show rate.
///
/// An empty collection yields a rate of zero.
pub fn aggregate<'a, I>(bookings: I) -> StatsResult
where
    I: IntoIterator<Item = &'a Booking>,
{
    let mut stats = StatsResult::default();

    for booking in bookings {
        stats.total_bookings += 1;
        match booking.status {
            BookingStatus::Confirmed => stats.confirmed += 1,
            BookingStatus::Cancelled => stats.cancelled += 1,
            BookingStatus::NoShow => stats.no_shows += 1,
            BookingStatus::CancelledByClass => stats.cancelled_by_class += 1,
        }
    }

    if stats.total_bookings > 0 {
        stats.no_show_rate = stats.no_shows as f64 / stats.total_bookings as f64 * 100.0;
    }

    stats
}
