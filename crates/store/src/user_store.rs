//! User persistence.

use std::collections::HashMap;
use std::sync::RwLock;

use shopcore_accounts::User;
use shopcore_core::{EmailAddress, UserId};

use crate::error::{StoreError, StoreResult};

/// User persistence boundary. Email is the unique natural key.
pub trait UserStore {
    fn save(&self, user: &User) -> StoreResult<()>;

    fn find(&self, id: UserId) -> StoreResult<User>;

    /// Login-path lookup. Emails are stored normalized, so the caller is
    /// expected to pass a parsed `EmailAddress`.
    fn find_by_email(&self, email: &EmailAddress) -> StoreResult<User>;
}

/// In-memory user store.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    inner: RwLock<HashMap<UserId, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, HashMap<UserId, User>>> {
        self.inner
            .read()
            .map_err(|_| StoreError::backend("user store lock poisoned"))
    }
}

impl UserStore for InMemoryUserStore {
    fn save(&self, user: &User) -> StoreResult<()> {
        let mut guard = self
            .inner
            .write()
            .map_err(|_| StoreError::backend("user store lock poisoned"))?;

        if guard
            .values()
            .any(|u| u.id != user.id && u.email == user.email)
        {
            // Generic message: registration must not reveal which emails
            // already have an account.
            tracing::warn!(user_id = %user.id, "duplicate email rejected");
            return Err(StoreError::conflict("unable to register this email"));
        }

        tracing::debug!(user_id = %user.id, version = user.version, "user saved");
        guard.insert(user.id, user.clone());
        Ok(())
    }

    fn find(&self, id: UserId) -> StoreResult<User> {
        self.read()?.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    fn find_by_email(&self, email: &EmailAddress) -> StoreResult<User> {
        self.read()?
            .values()
            .find(|u| u.email == *email)
            .cloned()
            .ok_or(StoreError::NotFound)
    }
}
