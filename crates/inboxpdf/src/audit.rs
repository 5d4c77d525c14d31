//! Append-only JSON Lines record of every newly handled message.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Local, SecondsFormat};
use serde::{Deserialize, Serialize};

use crate::email::UniqueId;
use crate::error::AuditError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    /// At least one PDF was saved.
    Success,
    /// The message was parsed and no PDF was saved.
    NoPdf,
    /// Fetching or parsing failed.
    Error,
}

/// One line of the audit log. Field order is the key order on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub fetched_at: String,
    pub mailbox: String,
    pub message_unique_id: UniqueId,
    pub from: Option<String>,
    pub subject: Option<String>,
    pub saved_files: Vec<String>,
    pub status: RecordStatus,
    pub error: Option<String>,
}

impl MessageRecord {
    /// Record for a message that was parsed and classified.
    ///
    /// `save_errors` lists attachments that were found but could not be
    /// written; they are reported in `error` without changing the status.
    pub fn completed(
        mailbox: &str,
        unique_id: UniqueId,
        from: Option<&str>,
        subject: Option<&str>,
        saved_files: Vec<String>,
        save_errors: &[String],
    ) -> Self {
        let status = if saved_files.is_empty() {
            RecordStatus::NoPdf
        } else {
            RecordStatus::Success
        };
        Self {
            fetched_at: timestamp_now(),
            mailbox: mailbox.to_string(),
            message_unique_id: unique_id,
            from: Some(from.unwrap_or_default().to_string()),
            subject: Some(subject.unwrap_or_default().to_string()),
            saved_files,
            status,
            error: (!save_errors.is_empty()).then(|| save_errors.join("; ")),
        }
    }

    /// Record for a message that could not be fetched or parsed.
    pub fn failed(mailbox: &str, unique_id: UniqueId, error: impl ToString) -> Self {
        Self {
            fetched_at: timestamp_now(),
            mailbox: mailbox.to_string(),
            message_unique_id: unique_id,
            from: None,
            subject: None,
            saved_files: Vec::new(),
            status: RecordStatus::Error,
            error: Some(error.to_string()),
        }
    }
}

/// Local time with UTC offset, second precision.
fn timestamp_now() -> String {
    Local::now().to_rfc3339_opts(SecondsFormat::Secs, false)
}

pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one record as a single line.
    pub fn append(&self, record: &MessageRecord) -> Result<(), AuditError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.write_error(e))?;
        }

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.write_error(e))?;
        file.write_all(line.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|e| self.write_error(e))
    }

    /// Reads every record back. A missing log is empty.
    pub fn read_all(&self) -> Result<Vec<MessageRecord>, AuditError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(AuditError::Read {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };

        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(AuditError::from))
            .collect()
    }

    fn write_error(&self, source: std::io::Error) -> AuditError {
        AuditError::Write {
            path: self.path.clone(),
            source,
        }
    }
}
