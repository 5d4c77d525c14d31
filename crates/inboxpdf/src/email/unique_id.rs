use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identity of a message for de-duplication.
///
/// Message-ID when the sender set one, otherwise the server UID, otherwise
/// the sequence number. Sequence numbers change between sessions, so a
/// `SEQ-` identity only protects against repeats within the same mailbox
/// state.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UniqueId(String);

impl UniqueId {
    pub fn derive(message_id: Option<&str>, uid: Option<u32>, seq: u32) -> Self {
        if let Some(id) = message_id.map(str::trim).filter(|id| !id.is_empty()) {
            return Self(id.to_string());
        }
        match uid {
            Some(uid) => Self::from_uid(uid),
            None => Self::from_seq(seq),
        }
    }

    pub fn from_uid(uid: u32) -> Self {
        Self(format!("UID-{}", uid))
    }

    pub fn from_seq(seq: u32) -> Self {
        Self(format!("SEQ-{}", seq))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UniqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UniqueId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for UniqueId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_id_wins() {
        let id = UniqueId::derive(Some("<abc@x>"), Some(7), 3);
        assert_eq!(id.as_str(), "<abc@x>");
    }

    #[test]
    fn test_uid_fallback() {
        assert_eq!(UniqueId::derive(None, Some(4512), 3).as_str(), "UID-4512");
        assert_eq!(UniqueId::derive(Some("  "), Some(9), 3).as_str(), "UID-9");
    }

    #[test]
    fn test_sequence_fallback() {
        assert_eq!(UniqueId::derive(None, None, 3).as_str(), "SEQ-3");
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let id = UniqueId::from("<abc@x>");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"<abc@x>\"");
        let back: UniqueId = serde_json::from_str("\"UID-1\"").unwrap();
        assert_eq!(back, UniqueId::from_uid(1));
    }
}
