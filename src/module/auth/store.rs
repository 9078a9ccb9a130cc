use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Raised when a user can not be registered
#[derive(Debug, Error)]
pub enum CredentialError {
    /// A user with the same name exists already
    #[error("user already exists")]
    AlreadyExists,
    /// The password could not be hashed
    #[error("unable to hash password: {0}")]
    Hashing(String),
}

/// In-memory user store keeping Argon2id password hashes
///
/// Cloning is cheap and every clone refers to the same users.
#[derive(Clone, Default)]
pub struct CredentialStore {
    users: Arc<Mutex<HashMap<String, String>>>,
}

impl CredentialStore {
    fn users(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.users
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Adds a new user, usernames are case sensitive
    pub fn register(&self, username: &str, password: &str) -> Result<(), CredentialError> {
        if self.users().contains_key(username) {
            return Err(CredentialError::AlreadyExists);
        }

        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| CredentialError::Hashing(e.to_string()))?
            .to_string();

        match self.users().entry(username.to_owned()) {
            Entry::Occupied(_) => Err(CredentialError::AlreadyExists),
            Entry::Vacant(entry) => {
                entry.insert(hash);
                Ok(())
            }
        }
    }

    /// Whether the user exists and the password matches
    pub fn verify(&self, username: &str, password: &str) -> bool {
        let hash = match self.users().get(username) {
            Some(hash) => hash.clone(),
            None => return false,
        };

        match PasswordHash::new(&hash) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod does {
    use super::*;

    #[test]
    fn verify_registered_credentials() {
        let store = CredentialStore::default();
        store.register("alice", "wonderland").unwrap();

        assert!(store.verify("alice", "wonderland"));
        assert!(!store.verify("alice", "looking-glass"));
        assert!(!store.verify("bob", "wonderland"));
    }

    #[test]
    fn refuse_duplicate_users() {
        let store = CredentialStore::default();
        store.register("alice", "wonderland").unwrap();

        assert!(matches!(
            store.register("alice", "other"),
            Err(CredentialError::AlreadyExists)
        ));
    }
}
