use serde::{Deserialize, Serialize};
use std::fmt;

pub mod store;

pub const SCHEMA_VERSION: u32 = 1;

/// Backend-issued conversation identifier. Opaque to the client, never blank.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(String);

impl SessionId {
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SessionId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| "session id must not be blank".to_string())
    }
}

impl From<SessionId> for String {
    fn from(id: SessionId) -> Self {
        id.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSession {
    pub schema_version: u32,
    pub session_id: SessionId,
    pub saved_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::client::ChatReply;

    #[test]
    fn blank_session_id_is_rejected_on_the_wire() {
        let raw = r#"{"session_id": "  ", "response": "hi"}"#;
        assert!(serde_json::from_str::<ChatReply>(raw).is_err());
    }

    #[test]
    fn session_id_serializes_as_plain_string() {
        let id = SessionId::new("s-1").expect("id should be valid");
        assert_eq!(serde_json::to_value(&id).expect("id should serialize"), "s-1");
        let back: SessionId = serde_json::from_str("\"s-1\"").expect("id should parse");
        assert_eq!(back, id);
    }
}
