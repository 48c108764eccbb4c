//! Login state and the cache reset that ends a session.

use crate::error::{AppError, AppResult};
use boxoffice_model::Record;
use boxoffice_storage::{Accessor, GlobalCache};
use boxoffice_types::Identity;
use std::sync::Arc;
use tracing::info;

/// The logged-in user, if any.
///
/// Logging out empties the shared [`GlobalCache`], so records materialized
/// for one user are never served to the next.
pub struct Session {
    users: Arc<Accessor>,
    cache: Arc<GlobalCache>,
    current: Option<Record>,
}

impl Session {
    pub fn new(users: Arc<Accessor>, cache: Arc<GlobalCache>) -> Self {
        Self {
            users,
            cache,
            current: None,
        }
    }

    /// Starts a session for `user_id`, replacing any current one.
    pub fn login(&mut self, user_id: &Identity) -> AppResult<&Record> {
        if self.current.is_some() {
            self.logout();
        }
        let user = self.users.require(user_id)?;
        info!("User {} logged in", user.id);
        Ok(self.current.insert(user))
    }

    pub fn logout(&mut self) {
        if let Some(user) = self.current.take() {
            info!("User {} logged out", user.id);
        }
        self.cache.clear_all();
    }

    pub fn current_user(&self) -> AppResult<&Record> {
        self.current.as_ref().ok_or(AppError::NotLoggedIn)
    }

    pub fn is_logged_in(&self) -> bool {
        self.current.is_some()
    }
}
