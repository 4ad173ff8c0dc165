//! Session store (§3, §4.C, §6): `load(key) -> session|terminated`, `save(session)`.
//!
//! Sessions persist in `sessions.json` under the configured state path,
//! keyed by `session_id`; a second index maps the deterministic `SessionKey`
//! string to its current `session_id` so repeated turns from the same
//! `(channel, business_id, channel_user_id)` land on the same session.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use convo_domain::{Error, Result, Session, SessionKey, TraceEvent};

/// Outcome of resolving a session for an inbound turn.
#[derive(Debug, Clone)]
pub enum LoadResult {
    Active(Session),
    Terminated { lock_until: Option<DateTime<Utc>> },
}

/// Owns the in-memory (and JSON-file-backed) session records.
pub struct SessionStore {
    sessions_path: PathBuf,
    sessions: RwLock<HashMap<String, Session>>,
    key_index: RwLock<HashMap<String, String>>,
}

impl SessionStore {
    /// Load or create the session store at `state_path/sessions.json`.
    pub fn new(state_path: &Path) -> Result<Self> {
        std::fs::create_dir_all(state_path).map_err(Error::Io)?;

        let sessions_path = state_path.join("sessions.json");
        let sessions: HashMap<String, Session> = if sessions_path.exists() {
            let raw = std::fs::read_to_string(&sessions_path).map_err(Error::Io)?;
            serde_json::from_str(&raw).unwrap_or_default()
        } else {
            HashMap::new()
        };

        let key_index = sessions
            .values()
            .map(|s| (s.key.as_string(), s.session_id.clone()))
            .collect();

        tracing::info!(
            sessions = sessions.len(),
            path = %sessions_path.display(),
            "session store loaded"
        );

        Ok(Self {
            sessions_path,
            sessions: RwLock::new(sessions),
            key_index: RwLock::new(key_index),
        })
    }

    /// Resolve the session for this turn (§4.C, §6). When `explicit_session_id`
    /// is `Some` and no matching session exists, the session is **not**
    /// created implicitly (§3 invariant 1) — the caller must treat that as a
    /// fresh conversation and persist it explicitly via [`Self::save`].
    pub fn load(
        &self,
        key: &SessionKey,
        explicit_session_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> LoadResult {
        let resolved_id = match explicit_session_id {
            Some(id) => Some(id.to_owned()),
            None => self.key_index.read().get(&key.as_string()).cloned(),
        };

        let existing = resolved_id.and_then(|id| self.sessions.read().get(&id).cloned());

        let session = match existing {
            Some(s) => s,
            None if explicit_session_id.is_some() => {
                return LoadResult::Active(Session::new(explicit_session_id.unwrap(), key.clone(), now));
            }
            None => {
                let new_id = uuid::Uuid::new_v4().to_string();
                let session = Session::new(new_id.clone(), key.clone(), now);
                self.insert(session.clone());
                TraceEvent::SessionResolved {
                    session_key: key.as_string(),
                    session_id: new_id,
                    is_new: true,
                }
                .emit();
                return LoadResult::Active(session);
            }
        };

        if session.is_locked(now) {
            return LoadResult::Terminated { lock_until: session.lock_until };
        }

        LoadResult::Active(session)
    }

    /// Persist the (possibly new) session, replacing any prior record under
    /// the same `session_id`. The only writer of durable session state (§2).
    pub fn save(&self, session: Session) -> Result<()> {
        self.insert(session);
        self.flush()
    }

    fn insert(&self, session: Session) {
        let key_str = session.key.as_string();
        let session_id = session.session_id.clone();
        self.key_index.write().insert(key_str, session_id.clone());
        self.sessions.write().insert(session_id, session);
    }

    fn flush(&self) -> Result<()> {
        let sessions = self.sessions.read();
        let json = serde_json::to_string_pretty(&*sessions)
            .map_err(|e| Error::Persist(format!("serializing sessions: {e}")))?;
        std::fs::write(&self.sessions_path, json).map_err(Error::Io)?;
        Ok(())
    }

    pub fn get(&self, session_id: &str) -> Option<Session> {
        self.sessions.read().get(session_id).cloned()
    }

    pub fn list(&self) -> Vec<Session> {
        self.sessions.read().values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use convo_domain::Channel;

    fn tempdir() -> tempfile::TempDir {
        tempfile::tempdir().expect("tempdir")
    }

    #[test]
    fn load_creates_session_when_no_explicit_id() {
        let dir = tempdir();
        let store = SessionStore::new(dir.path()).unwrap();
        let key = SessionKey::new(Channel::Whatsapp, "biz1", "user1");

        let result = store.load(&key, None, Utc::now());
        let session = match result {
            LoadResult::Active(s) => s,
            _ => panic!("expected active session"),
        };
        assert_eq!(session.key, key);
    }

    #[test]
    fn load_is_stable_across_calls_for_same_key() {
        let dir = tempdir();
        let store = SessionStore::new(dir.path()).unwrap();
        let key = SessionKey::new(Channel::Whatsapp, "biz1", "user1");

        let first = match store.load(&key, None, Utc::now()) {
            LoadResult::Active(s) => s,
            _ => panic!(),
        };
        store.save(first.clone()).unwrap();

        let second = match store.load(&key, None, Utc::now()) {
            LoadResult::Active(s) => s,
            _ => panic!(),
        };
        assert_eq!(second.session_id, first.session_id);
    }

    #[test]
    fn explicit_session_id_is_not_created_implicitly_in_index() {
        let dir = tempdir();
        let store = SessionStore::new(dir.path()).unwrap();
        let key = SessionKey::new(Channel::Whatsapp, "biz1", "user1");

        let _ = store.load(&key, Some("explicit-1"), Utc::now());
        assert!(store.key_index.read().is_empty());
    }

    #[test]
    fn terminated_session_is_reported_until_lock_expires() {
        let dir = tempdir();
        let store = SessionStore::new(dir.path()).unwrap();
        let key = SessionKey::new(Channel::Whatsapp, "biz1", "user1");
        let now = Utc::now();

        let mut session = match store.load(&key, None, now) {
            LoadResult::Active(s) => s,
            _ => panic!(),
        };
        session.terminate("enumeration_lock", Some(now + chrono::Duration::hours(1)));
        store.save(session).unwrap();

        match store.load(&key, None, now) {
            LoadResult::Terminated { lock_until } => assert!(lock_until.is_some()),
            LoadResult::Active(_) => panic!("expected terminated"),
        }
    }
}
