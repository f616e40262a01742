//! Session continuity: conversation state persisted across invocations.
//!
//! Each session is one JSON file under the session directory, rewritten
//! wholesale on every save. File name is `<session_id>.json`.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::chat::ChatMessage;
use crate::error::{Error, Result};

// ─────────────────────────────────────────────────────────────────
// Session record
// ─────────────────────────────────────────────────────────────────

/// One persisted conversation session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Session identifier (v4 UUID for generated sessions).
    pub session_id: String,

    /// Persona slug the session runs as.
    pub persona: String,

    /// Model used for the last turn.
    pub model: String,

    /// Last-updated timestamp (RFC 3339, UTC).
    pub timestamp: DateTime<Utc>,

    /// Full conversation history, system message included.
    pub messages: Vec<ChatMessage>,

    /// Most recent user prompt.
    pub last_prompt: String,

    /// Most recent assistant response.
    pub last_response: String,
}

impl SessionRecord {
    /// Create a fresh session with a generated id.
    pub fn new(persona: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), persona, model)
    }

    /// Create a fresh session with an explicit id.
    pub fn with_id(
        session_id: impl Into<String>,
        persona: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            persona: persona.into(),
            model: model.into(),
            timestamp: Utc::now(),
            messages: Vec::new(),
            last_prompt: String::new(),
            last_response: String::new(),
        }
    }

    /// Record one completed turn: exactly one user message and one
    /// assistant message are appended, and the summary fields updated.
    pub fn record_turn(&mut self, prompt: &str, response: &str, model: &str) {
        self.messages.push(ChatMessage::user(prompt));
        self.messages.push(ChatMessage::assistant(response));
        self.last_prompt = prompt.to_string();
        self.last_response = response.to_string();
        self.model = model.to_string();
        self.timestamp = Utc::now();
    }
}

// ─────────────────────────────────────────────────────────────────
// Session store
// ─────────────────────────────────────────────────────────────────

/// File-backed store of session records.
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the session file for an id.
    pub fn path_for(&self, session_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", session_id))
    }

    /// Load a session by id.
    pub fn load(&self, session_id: &str) -> Result<SessionRecord> {
        let path = self.path_for(session_id);
        if !path.exists() {
            return Err(Error::session_not_found(session_id));
        }

        let content = fs::read_to_string(&path).map_err(|e| Error::IoRead {
            path: path.clone(),
            source: e,
        })?;

        let record: SessionRecord =
            serde_json::from_str(&content).map_err(|e| Error::SessionCorrupt {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        debug!(session_id, messages = record.messages.len(), "Session loaded");
        Ok(record)
    }

    /// Load a session if it exists, otherwise start a new one with the id.
    /// A continued session adopts the requested persona so the stored
    /// record reflects who answered the latest turn.
    pub fn load_or_create(
        &self,
        session_id: &str,
        persona: &str,
        model: &str,
    ) -> Result<SessionRecord> {
        match self.load(session_id) {
            Ok(mut record) => {
                if record.persona != persona {
                    info!(
                        session_id,
                        from = %record.persona,
                        to = persona,
                        "Session persona changed"
                    );
                    record.persona = persona.to_string();
                }
                Ok(record)
            }
            Err(Error::SessionNotFound { .. }) => {
                info!(session_id, "Starting new session");
                Ok(SessionRecord::with_id(session_id, persona, model))
            }
            Err(e) => Err(e),
        }
    }

    /// Save a session, replacing any existing file.
    pub fn save(&self, record: &SessionRecord) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).map_err(|e| Error::IoWrite {
            path: self.dir.clone(),
            source: e,
        })?;

        let path = self.path_for(&record.session_id);
        let json = serde_json::to_string_pretty(record)?;
        fs::write(&path, json).map_err(|e| Error::IoWrite {
            path: path.clone(),
            source: e,
        })?;

        debug!(session_id = %record.session_id, path = %path.display(), "Session saved");
        Ok(path)
    }

    /// List session ids present in the store.
    pub fn list(&self) -> Result<Vec<String>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(|e| Error::IoRead {
            path: self.dir.clone(),
            source: e,
        })? {
            let entry = entry.map_err(Error::Io)?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ids.push(stem.to_string());
                }
            }
        }

        ids.sort();
        Ok(ids)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, SessionStore) {
        let tmp = TempDir::new().unwrap();
        let store = SessionStore::new(tmp.path().join("sessions"));
        (tmp, store)
    }

    #[test]
    fn test_new_session_has_uuid_id() {
        let record = SessionRecord::new("ashira", "gpt-4");
        assert!(Uuid::parse_str(&record.session_id).is_ok());
        assert!(record.messages.is_empty());
    }

    #[test]
    fn test_record_turn_appends_one_pair() {
        let mut record = SessionRecord::new("ashira", "gpt-4");
        record.record_turn("hello", "hi there", "gpt-4");

        assert_eq!(record.messages.len(), 2);
        assert_eq!(record.last_prompt, "hello");
        assert_eq!(record.last_response, "hi there");

        record.record_turn("again", "sure", "gpt-4o");
        assert_eq!(record.messages.len(), 4);
        assert_eq!(record.model, "gpt-4o");
    }

    #[test]
    fn test_save_load_roundtrip() {
        let (_tmp, store) = store();

        let mut record = SessionRecord::with_id("test-1", "lumen", "gpt-4");
        record.record_turn("q", "a", "gpt-4");
        store.save(&record).unwrap();

        let loaded = store.load("test-1").unwrap();
        assert_eq!(loaded.session_id, "test-1");
        assert_eq!(loaded.persona, "lumen");
        assert_eq!(loaded.messages.len(), 2);
        assert_eq!(loaded.last_response, "a");
    }

    #[test]
    fn test_save_overwrites_wholesale() {
        let (_tmp, store) = store();

        let mut record = SessionRecord::with_id("test-2", "ashira", "gpt-4");
        record.record_turn("one", "1", "gpt-4");
        store.save(&record).unwrap();

        record.record_turn("two", "2", "gpt-4");
        store.save(&record).unwrap();

        let loaded = store.load("test-2").unwrap();
        assert_eq!(loaded.messages.len(), 4);
        assert_eq!(loaded.last_prompt, "two");
    }

    #[test]
    fn test_load_missing() {
        let (_tmp, store) = store();
        let result = store.load("nope");
        assert!(matches!(result, Err(Error::SessionNotFound { .. })));
    }

    #[test]
    fn test_load_corrupt() {
        let (_tmp, store) = store();
        fs::create_dir_all(store.dir()).unwrap();
        fs::write(store.path_for("bad"), "{not json").unwrap();

        let result = store.load("bad");
        assert!(matches!(result, Err(Error::SessionCorrupt { .. })));
    }

    #[test]
    fn test_load_or_create() {
        let (_tmp, store) = store();

        let fresh = store.load_or_create("s1", "ashira", "gpt-4").unwrap();
        assert!(fresh.messages.is_empty());

        let mut record = fresh;
        record.record_turn("p", "r", "gpt-4");
        store.save(&record).unwrap();

        let continued = store.load_or_create("s1", "ashira", "gpt-4").unwrap();
        assert_eq!(continued.messages.len(), 2);
    }

    #[test]
    fn test_load_or_create_adopts_new_persona() {
        let (_tmp, store) = store();

        let mut record = store.load_or_create("s2", "ashira", "gpt-4").unwrap();
        record.record_turn("p", "r", "gpt-4");
        store.save(&record).unwrap();

        let continued = store.load_or_create("s2", "lumen", "gpt-4").unwrap();
        assert_eq!(continued.persona, "lumen");
        assert_eq!(continued.messages.len(), 2);

        store.save(&continued).unwrap();
        assert_eq!(store.load("s2").unwrap().persona, "lumen");
    }

    #[test]
    fn test_list_sessions() {
        let (_tmp, store) = store();
        assert!(store.list().unwrap().is_empty());

        store
            .save(&SessionRecord::with_id("b", "ashira", "m"))
            .unwrap();
        store
            .save(&SessionRecord::with_id("a", "lumen", "m"))
            .unwrap();

        assert_eq!(store.list().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_timestamp_is_rfc3339_in_json() {
        let record = SessionRecord::with_id("t", "ashira", "m");
        let json = serde_json::to_value(&record).unwrap();
        let ts = json["timestamp"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(ts).is_ok());
    }
}
