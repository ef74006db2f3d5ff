use anyhow::Result;
use tracing::{debug, info, warn};

use crate::models::Session;
use crate::storage::LocalStorage;

pub const USER_ID_KEY: &str = "user_id";
pub const USER_EMAIL_KEY: &str = "user_email";

/// In-memory cache of the session persisted in local storage.
///
/// The store starts out loading; `hydrate` performs the one-time read and
/// clears the flag so callers can tell "not logged in" apart from "not known
/// yet".
pub struct SessionStore {
    storage: LocalStorage,
    session: Option<Session>,
    loading: bool,
}

impl SessionStore {
    pub fn new(storage: LocalStorage) -> Self {
        Self {
            storage,
            session: None,
            loading: true,
        }
    }

    /// Convenience for the CLI: construct and hydrate in one step.
    pub fn load(storage: LocalStorage) -> Result<Self> {
        let mut store = Self::new(storage);
        store.hydrate()?;
        Ok(store)
    }

    pub fn hydrate(&mut self) -> Result<()> {
        let id = self.storage.get_item(USER_ID_KEY)?;
        let email = self.storage.get_item(USER_EMAIL_KEY)?;

        self.session = match (id, email) {
            (None, None) => None,
            (Some(id), Some(email)) if !email.is_empty() => match id.trim().parse::<i64>() {
                Ok(id) => Some(Session { id, email }),
                Err(_) => {
                    warn!(raw = %id, "stored user_id is not an integer, clearing session");
                    self.storage.remove_items(&[USER_ID_KEY, USER_EMAIL_KEY])?;
                    None
                }
            },
            _ => {
                warn!("half-written session found in local storage, clearing it");
                self.storage.remove_items(&[USER_ID_KEY, USER_EMAIL_KEY])?;
                None
            }
        };
        self.loading = false;
        debug!(authenticated = self.session.is_some(), "session hydrated");
        Ok(())
    }

    pub fn login(&mut self, session: Session) -> Result<()> {
        let id = session.id.to_string();
        self.storage
            .set_items(&[(USER_ID_KEY, &id), (USER_EMAIL_KEY, &session.email)])?;
        info!(user_id = session.id, "logged in");
        self.session = Some(session);
        self.loading = false;
        Ok(())
    }

    pub fn logout(&mut self) -> Result<()> {
        self.storage.remove_items(&[USER_ID_KEY, USER_EMAIL_KEY])?;
        if let Some(session) = self.session.take() {
            info!(user_id = session.id, "logged out");
        }
        Ok(())
    }

    pub fn current(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session {
            id: 7,
            email: "a@b.com".to_string(),
        }
    }

    #[test]
    fn test_starts_loading_until_hydrated() {
        let mut store = SessionStore::new(LocalStorage::open_in_memory().unwrap());
        assert!(store.is_loading());
        assert!(!store.is_authenticated());

        store.hydrate().unwrap();
        assert!(!store.is_loading());
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_login_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut store = SessionStore::load(LocalStorage::open(dir.path()).unwrap()).unwrap();
            store.login(session()).unwrap();
            assert!(store.is_authenticated());
        }

        let store = SessionStore::load(LocalStorage::open(dir.path()).unwrap()).unwrap();
        assert!(store.is_authenticated());
        assert_eq!(store.current(), Some(&session()));
    }

    #[test]
    fn test_logout_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut store = SessionStore::load(LocalStorage::open(dir.path()).unwrap()).unwrap();
            store.login(session()).unwrap();
            store.logout().unwrap();
            assert!(!store.is_authenticated());
        }

        let store = SessionStore::load(LocalStorage::open(dir.path()).unwrap()).unwrap();
        assert!(!store.is_authenticated());
        assert_eq!(store.current(), None);
    }

    #[test]
    fn test_half_written_session_is_discarded() {
        let storage = LocalStorage::open_in_memory().unwrap();
        storage.set_items(&[(USER_ID_KEY, "7")]).unwrap();

        let store = SessionStore::load(storage).unwrap();
        assert!(!store.is_authenticated());
        assert_eq!(store.storage.get_item(USER_ID_KEY).unwrap(), None);
    }

    #[test]
    fn test_empty_or_bad_values_are_not_a_session() {
        let storage = LocalStorage::open_in_memory().unwrap();
        storage.set_items(&[(USER_ID_KEY, "7"), (USER_EMAIL_KEY, "")]).unwrap();
        assert!(!SessionStore::load(storage).unwrap().is_authenticated());

        let storage = LocalStorage::open_in_memory().unwrap();
        storage.set_items(&[(USER_ID_KEY, "seven"), (USER_EMAIL_KEY, "a@b.com")]).unwrap();
        let store = SessionStore::load(storage).unwrap();
        assert!(!store.is_authenticated());
        assert_eq!(store.storage.get_item(USER_EMAIL_KEY).unwrap(), None);
    }
}
