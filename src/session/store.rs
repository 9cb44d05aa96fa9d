use crate::session::{SessionId, StoredSession, SCHEMA_VERSION};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const SESSION_FILE: &str = "laptop_chat_session.json";

/// Persists the one laptop-chat session id across restarts.
#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self) -> PathBuf {
        self.dir.join(SESSION_FILE)
    }

    pub fn load(&self) -> Option<SessionId> {
        let path = self.path();
        if !path.exists() {
            return None;
        }
        match read_session_file(&path) {
            Ok(stored) => Some(stored.session_id),
            Err(err) => {
                tracing::warn!("ignoring stored session: {err}");
                None
            }
        }
    }

    /// Writes the id only if nothing is stored yet. Returns whether a write happened.
    pub fn save(&self, session_id: &SessionId) -> io::Result<bool> {
        if self.load().is_some() {
            return Ok(false);
        }

        fs::create_dir_all(&self.dir)?;
        let stored = StoredSession {
            schema_version: SCHEMA_VERSION,
            session_id: session_id.clone(),
            saved_at: chrono::Utc::now().to_rfc3339(),
        };
        let bytes = serde_json::to_vec_pretty(&stored)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err.to_string()))?;

        let final_path = self.path();
        let tmp_path = self.dir.join(format!("{SESSION_FILE}.tmp"));
        fs::write(&tmp_path, bytes)?;
        match fs::rename(&tmp_path, &final_path) {
            Ok(()) => {}
            Err(rename_err) => {
                if final_path.exists() {
                    fs::remove_file(&final_path)?;
                    fs::rename(&tmp_path, &final_path)?;
                } else {
                    return Err(rename_err);
                }
            }
        }
        tracing::info!(session_id = %session_id, "persisted chat session");
        Ok(true)
    }
}

fn read_session_file(path: &Path) -> Result<StoredSession, String> {
    let data = fs::read(path).map_err(|err| format!("failed to read {}: {err}", path.display()))?;
    let stored: StoredSession = serde_json::from_slice(&data)
        .map_err(|err| format!("failed to parse {}: {err}", path.display()))?;
    if stored.schema_version != SCHEMA_VERSION {
        return Err(format!(
            "unknown schema_version in {}: {}",
            path.display(),
            stored.schema_version
        ));
    }
    Ok(stored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn load_returns_none_for_new_visitor() {
        let tmp = TempDir::new().expect("temp dir should be created");
        let store = SessionStore::new(tmp.path());
        assert!(store.load().is_none());
    }

    #[test]
    fn save_then_load_round_trips_id() {
        let tmp = TempDir::new().expect("temp dir should be created");
        let store = SessionStore::new(tmp.path().join("nested"));
        let id = SessionId::new("abc-123").expect("id should be valid");

        assert!(store.save(&id).expect("save should succeed"));
        assert_eq!(store.load(), Some(id));
    }

    #[test]
    fn save_never_replaces_existing_id() {
        let tmp = TempDir::new().expect("temp dir should be created");
        let store = SessionStore::new(tmp.path());
        let first = SessionId::new("first").expect("id should be valid");
        let second = SessionId::new("second").expect("id should be valid");

        store.save(&first).expect("first save should succeed");
        let wrote = store.save(&second).expect("second save should succeed");

        assert!(!wrote);
        assert_eq!(store.load(), Some(first));
    }

    #[test]
    fn unknown_schema_is_treated_as_absent() {
        let tmp = TempDir::new().expect("temp dir should be created");
        fs::write(
            tmp.path().join(SESSION_FILE),
            r#"{"schema_version": 42, "session_id": "x", "saved_at": "1"}"#,
        )
        .expect("fixture should write");

        let store = SessionStore::new(tmp.path());
        assert!(store.load().is_none());
    }

    #[test]
    fn blank_ids_are_rejected() {
        assert!(SessionId::new("   ").is_none());
    }

    #[test]
    fn stored_blank_id_is_treated_as_absent() {
        let tmp = TempDir::new().expect("temp dir should be created");
        fs::write(
            tmp.path().join(SESSION_FILE),
            r#"{"schema_version": 1, "session_id": "", "saved_at": "1"}"#,
        )
        .expect("fixture should write");

        let store = SessionStore::new(tmp.path());
        assert!(store.load().is_none());
    }
}
