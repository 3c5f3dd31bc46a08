use gymbook_database::ClassSession;

/// Whether the session can take one more confirmed booking.
///
/// `confirmed_count` must only include bookings in the confirmed state.
pub fn has_capacity(session: &ClassSession, confirmed_count: i64) -> bool {
    confirmed_count < session.capacity
}
