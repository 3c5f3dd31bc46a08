//! User service for member registration and lookup.

use std::sync::Arc;

use gymbook_database::{CreateUserRequest, DatabaseError, User};
use tracing::info;

use crate::clock::Clock;
use crate::repositories::GymStore;
use crate::types::{BookingError, BookingResult, ConflictKind};
use crate::utils::Validator;

/// Service for managing user operations
pub struct UserService<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S> UserService<S>
where
    S: GymStore,
{
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Register a new member; the email is stored lowercased
    pub async fn register_user(&self, mut request: CreateUserRequest) -> BookingResult<User> {
        Validator::user_request(&request)?;
        request.email = request.email.trim().to_lowercase();

        if self
            .store
            .find_user_by_email(&request.email)
            .await?
            .is_some()
        {
            return Err(ConflictKind::EmailTaken.into());
        }

        let user = match self.store.insert_user(&request, self.clock.now()).await {
            Ok(user) => user,
            Err(DatabaseError::Duplicate(_)) => return Err(ConflictKind::EmailTaken.into()),
            Err(e) => return Err(e.into()),
        };

        info!(user_id = user.id, role = %user.role, "registered user");
        Ok(user)
    }

    /// Get a user by ID
    pub async fn get_user(&self, user_id: i64) -> BookingResult<User> {
        self.store
            .find_user(user_id)
            .await?
            .ok_or_else(|| BookingError::user_not_found(user_id))
    }

    pub async fn list_users(&self) -> BookingResult<Vec<User>> {
        Ok(self.store.list_users().await?)
    }
}
