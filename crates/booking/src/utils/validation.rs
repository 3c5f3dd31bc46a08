//! Input validation for service requests.

use chrono::{DateTime, Utc};
use gymbook_database::{CreateClassRequest, CreateUserRequest};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{BookingError, NewSubscription};

const MAX_NAME_LEN: usize = 100;
const MAX_EMAIL_LEN: usize = 255;

static EMAIL_REGEX: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$"));

/// Validation utilities
pub struct Validator;

impl Validator {
    /// Validate email format
    pub fn email(email: &str) -> Result<(), BookingError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(BookingError::validation("Email cannot be empty"));
        }

        if email.len() > MAX_EMAIL_LEN {
            return Err(BookingError::validation("Email too long (max 255 characters)"));
        }

        let email_regex = EMAIL_REGEX
            .as_ref()
            .map_err(|_| BookingError::internal("Invalid email regex"))?;

        if !email_regex.is_match(email) {
            return Err(BookingError::validation("Invalid email format"));
        }

        Ok(())
    }

    /// Validate a person's first or last name
    pub fn name(field: &str, value: &str) -> Result<(), BookingError> {
        if value.trim().is_empty() {
            return Err(BookingError::validation(format!("{field} cannot be empty")));
        }

        if value.len() > MAX_NAME_LEN {
            return Err(BookingError::validation(format!(
                "{field} too long (max {MAX_NAME_LEN} characters)"
            )));
        }

        Ok(())
    }

    pub fn user_request(request: &CreateUserRequest) -> Result<(), BookingError> {
        Self::name("First name", &request.firstname)?;
        Self::name("Last name", &request.lastname)?;
        Self::email(&request.email)
    }

    /// Validate a new class session against the current instant
    pub fn class_request(
        request: &CreateClassRequest,
        now: DateTime<Utc>,
    ) -> Result<(), BookingError> {
        if request.title.trim().is_empty() {
            return Err(BookingError::validation("Class title cannot be empty"));
        }

        if request.coach.trim().is_empty() {
            return Err(BookingError::validation("Coach cannot be empty"));
        }

        if request.capacity <= 0 {
            return Err(BookingError::validation("Capacity must be positive"));
        }

        if request.duration_minutes <= 0 {
            return Err(BookingError::validation("Duration must be positive"));
        }

        if request.starts_at <= now {
            return Err(BookingError::validation("Class must start in the future"));
        }

        Ok(())
    }

    pub fn subscription(request: &NewSubscription) -> Result<(), BookingError> {
        if request.end_date < request.start_date {
            return Err(BookingError::validation(
                "Subscription end date precedes its start date",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use gymbook_database::{PlanType, UserRole};

    #[test]
    fn test_email_validation() {
        assert!(Validator::email("member@gym.fr").is_ok());
        assert!(Validator::email("first.last+tag@sub.example.com").is_ok());

        assert!(Validator::email("  padded@gym.fr  ").is_ok());

        for bad in [
            "", "   ", "no-at-sign.com", "@gym.fr", "a@gym", "a@.fr", "a@gym.", "a b@gym.fr",
            "a@b@gym.fr", "a@gym.f", "a@gym.fr1",
        ] {
            assert!(Validator::email(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_user_request_requires_names() {
        let request = CreateUserRequest {
            firstname: " ".into(),
            lastname: "Martin".into(),
            email: "a@gym.fr".into(),
            role: UserRole::User,
        };
        let err = Validator::user_request(&request).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_class_request_rules() {
        let now = Utc::now();
        let valid = CreateClassRequest {
            title: "Yoga".into(),
            coach: "Lea".into(),
            starts_at: now + Duration::hours(3),
            duration_minutes: 60,
            capacity: 12,
        };
        assert!(Validator::class_request(&valid, now).is_ok());

        let zero_capacity = CreateClassRequest { capacity: 0, ..valid.clone() };
        assert!(Validator::class_request(&zero_capacity, now).is_err());

        let no_duration = CreateClassRequest { duration_minutes: 0, ..valid.clone() };
        assert!(Validator::class_request(&no_duration, now).is_err());

        let in_past = CreateClassRequest { starts_at: now - Duration::minutes(1), ..valid.clone() };
        assert!(Validator::class_request(&in_past, now).is_err());

        let no_coach = CreateClassRequest { coach: "".into(), ..valid };
        assert!(Validator::class_request(&no_coach, now).is_err());
    }

    #[test]
    fn test_subscription_dates() {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let mut request = NewSubscription {
            plan_type: PlanType::Standard,
            start_date: start,
            end_date: start,
            auto_renew: false,
        };
        assert!(Validator::subscription(&request).is_ok());

        request.end_date = start.pred_opt().unwrap();
        assert!(Validator::subscription(&request).is_err());
    }
}
