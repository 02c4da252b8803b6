//! Session store - single holder for the current authenticated session
//!
//! The store holds at most one [`Session`]. Setting replaces, never merges.
//! `get` is expiry-aware: a session past its local validity window is
//! dropped and reported absent, so callers never observe a stale record.
//!
//! Persistence is a small JSON file. Loading anything unreadable or
//! incompatible yields "absent", never an error - a corrupt session file
//! only costs the user a fresh QR login.
//!
//! Accessor calls are individually memory-safe behind a mutex, but the
//! store provides no mutual exclusion across call sequences; use one store
//! per logical user and issue operations one at a time.

use chrono::Utc;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::models::Session;

#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<Mutex<Option<Session>>>,
}

impl SessionStore {
    /// Create an empty in-memory store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated from a persisted record, if one is
    /// present and readable
    #[must_use]
    pub fn load(path: &Path) -> Self {
        let store = Self::new();
        if let Some(session) = Self::read_record(path) {
            store.set(session);
        }
        store
    }

    /// Return the current session, or `None` if absent or past expiry
    #[must_use]
    pub fn get(&self) -> Option<Session> {
        let mut guard = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if guard.as_ref().is_some_and(|s| s.is_expired_at(Utc::now())) {
            log::debug!("stored session is past its expiry; treating as absent");
            *guard = None;
        }
        guard.clone()
    }

    /// Replace the held session
    pub fn set(&self, session: Session) {
        let mut guard = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        *guard = Some(session);
    }

    /// Remove the held session
    pub fn clear(&self) {
        let mut guard = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        *guard = None;
    }

    /// Persist the current state (present or absent) to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let session = {
            let guard = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            guard.clone()
        };
        let json = serde_json::to_string_pretty(&session)
            .map_err(|e| std::io::Error::other(format!("failed to serialize session: {e}")))?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, json)
    }

    /// Read a persisted record, tolerating any failure as "absent"
    fn read_record(path: &Path) -> Option<Session> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    log::warn!("failed to read session file {}: {e}", path.display());
                }
                return None;
            }
        };
        match serde_json::from_str::<Option<Session>>(&content) {
            Ok(session) => session,
            Err(e) => {
                log::warn!(
                    "ignoring unreadable session record in {}: {e}",
                    path.display()
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{SessionBuilder, TestFixtures};
    use chrono::Duration;

    #[test]
    fn test_set_get_clear() {
        let store = SessionStore::new();
        assert!(store.get().is_none());

        store.set(TestFixtures::session());
        assert_eq!(store.get().unwrap().token, "sid_test");

        store.clear();
        assert!(store.get().is_none());
    }

    #[test]
    fn test_set_replaces_never_merges() {
        let store = SessionStore::new();
        store.set(SessionBuilder::new().token("first").root_dir("root_1").build());
        store.set(SessionBuilder::new().token("second").build());

        let session = store.get().unwrap();
        assert_eq!(session.token, "second");
        assert!(session.root_dir_id.is_none());
    }

    #[test]
    fn test_expired_session_reads_as_absent() {
        let store = SessionStore::new();
        store.set(
            SessionBuilder::new()
                .expires_at(Utc::now() - Duration::minutes(1))
                .build(),
        );
        assert!(store.get().is_none());
        // And it stays gone
        assert!(store.get().is_none());
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let original = SessionBuilder::new()
            .token("sid_persisted")
            .user_id("uid_persisted")
            .root_dir("root_9")
            .expires_at(Utc::now() + Duration::hours(12))
            .build();

        let store = SessionStore::new();
        store.set(original.clone());
        store.save(&path).unwrap();

        let restored = SessionStore::load(&path).get().unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn test_save_absent_round_trips_to_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let store = SessionStore::new();
        store.save(&path).unwrap();

        assert!(SessionStore::load(&path).get().is_none());
    }

    #[test]
    fn test_corrupt_record_loads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{ not json at all").unwrap();

        assert!(SessionStore::load(&path).get().is_none());
    }

    #[test]
    fn test_missing_file_loads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does_not_exist.json");

        assert!(SessionStore::load(&path).get().is_none());
    }

    #[test]
    fn test_save_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let store = SessionStore::new();
        store.set(TestFixtures::session());
        store.save(&path).unwrap();

        assert!(SessionStore::load(&path).get().is_some());
    }
}
