//! Permission checking utilities.

use gymbook_database::{Booking, User};

use crate::types::BookingError;

/// Permission checking utilities
pub struct PermissionChecker;

impl PermissionChecker {
    /// Only administrators may manage class sessions
    pub fn require_admin(user: &User) -> Result<(), BookingError> {
        if !user.is_admin() {
            return Err(BookingError::forbidden("Administrator role required"));
        }
        Ok(())
    }

    /// A booking can only be cancelled by the member who holds it
    pub fn require_booking_owner(booking: &Booking, user_id: i64) -> Result<(), BookingError> {
        if booking.user_id != user_id {
            return Err(BookingError::forbidden("Booking belongs to another user"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use gymbook_database::{BookingStatus, UserRole};

    fn user(id: i64, role: UserRole) -> User {
        User {
            id,
            firstname: "Sam".into(),
            lastname: "Durand".into(),
            email: format!("sam{id}@gym.fr"),
            role,
            date_joined: Utc::now(),
        }
    }

    #[test]
    fn test_require_admin() {
        assert!(PermissionChecker::require_admin(&user(1, UserRole::Admin)).is_ok());
        let err = PermissionChecker::require_admin(&user(2, UserRole::User)).unwrap_err();
        assert!(err.is_forbidden());
    }

    #[test]
    fn test_require_booking_owner() {
        let booking = Booking {
            id: 10,
            user_id: 1,
            class_id: 3,
            status: BookingStatus::Confirmed,
            created_at: Utc::now(),
        };
        assert!(PermissionChecker::require_booking_owner(&booking, 1).is_ok());
        assert!(PermissionChecker::require_booking_owner(&booking, 2).is_err());
    }
}
