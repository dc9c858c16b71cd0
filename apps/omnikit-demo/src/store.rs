//! In-memory user store.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum StoreError {
    #[error("no user with id {0}")]
    NotFound(u64),
    #[error("email {0} is already registered")]
    DuplicateEmail(String),
    #[error("user store is full (capacity {capacity})")]
    Full { capacity: usize },
}

#[derive(Debug, Default)]
struct Inner {
    next_id: u64,
    users: HashMap<u64, User>,
}

#[derive(Debug)]
pub struct UserStore {
    capacity: usize,
    inner: RwLock<Inner>,
}

impl UserStore {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: RwLock::new(Inner::default()),
        }
    }

    /// # Errors
    /// `DuplicateEmail` if the email is taken, `Full` if the store is at capacity.
    pub fn insert(&self, name: &str, email: &str) -> Result<User, StoreError> {
        let mut inner = self.inner.write();
        if inner.users.values().any(|u| u.email == email) {
            return Err(StoreError::DuplicateEmail(email.to_owned()));
        }
        if inner.users.len() >= self.capacity {
            return Err(StoreError::Full {
                capacity: self.capacity,
            });
        }
        inner.next_id += 1;
        let user = User {
            id: inner.next_id,
            name: name.to_owned(),
            email: email.to_owned(),
        };
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    /// # Errors
    /// `NotFound` if there is no user with `id`.
    pub fn get(&self, id: u64) -> Result<User, StoreError> {
        self.inner
            .read()
            .users
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }
}
