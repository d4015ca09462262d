use crate::types::{normalize_key, User};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;

/// Case-insensitive registry of marketplace users.
///
/// Users are keyed by their lowercase name and never removed. The backing
/// `DashMap` gives atomic per-key operations, so concurrent registrations of the
/// same name cannot both succeed.
#[derive(Debug, Default)]
pub struct IdentityRegistry {
    users: DashMap<String, User>,
}

impl IdentityRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
        }
    }

    /// Registers `username` if no user with the same lowercase name exists.
    ///
    /// The check and the insert happen under the same shard lock. Returns `true`
    /// when this call performed the insertion. An empty name is never inserted.
    ///
    /// ## Examples
    ///
    /// ```
    /// use marketplace_index::IdentityRegistry;
    ///
    /// let registry = IdentityRegistry::new();
    /// assert!(registry.register("Alice"));
    /// assert!(!registry.register("ALICE"));
    /// assert!(!registry.register(""));
    /// ```
    pub fn register(&self, username: &str) -> bool {
        if username.is_empty() {
            return false;
        }
        match self.users.entry(normalize_key(username)) {
            Entry::Occupied(_) => false,
            Entry::Vacant(vacant) => {
                vacant.insert(User::new(username));
                debug!(username, "registered user");
                true
            }
        }
    }

    /// Case-insensitive membership test. Empty names are never registered.
    pub fn exists(&self, username: &str) -> bool {
        !username.is_empty() && self.users.contains_key(&normalize_key(username))
    }

    /// Returns the user record, with its original casing, if registered.
    pub fn get(&self, username: &str) -> Option<User> {
        self.users
            .get(&normalize_key(username))
            .map(|user| user.value().clone())
    }

    /// Returns the number of registered users.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Returns `true` if nobody has registered yet.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
