//! Test harness for isolated harvester runs.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;

use inboxpdf::{AuditLog, DedupStore, Harvester, HarvesterConfig, MessageRecord, RunSummary};

use super::builders::SENDER;
use super::mock_mailbox::MockMailbox;

/// Output directory, processed-id file and audit log under one temp dir.
pub struct TestHarness {
    temp_dir: TempDir,
    pub output_dir: PathBuf,
    pub processed_ids_file: PathBuf,
    pub audit_log_file: PathBuf,
    pub mailboxes: Vec<String>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_mailboxes(&["INBOX"])
    }

    pub fn with_mailboxes(mailboxes: &[&str]) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path().to_path_buf();
        Self {
            temp_dir,
            output_dir: base.join("In"),
            processed_ids_file: base.join("processed_msg_ids.json"),
            audit_log_file: base.join("pdf_download_log.jsonl"),
            mailboxes: mailboxes.iter().map(|m| m.to_string()).collect(),
        }
    }

    pub fn config(&self) -> HarvesterConfig {
        HarvesterConfig {
            sender_filter: SENDER.to_string(),
            mailboxes: self.mailboxes.clone(),
            output_directory: self.output_dir.clone(),
            processed_ids_file: self.processed_ids_file.clone(),
            audit_log_file: self.audit_log_file.clone(),
        }
    }

    pub fn harvester(&self) -> Harvester {
        Harvester::from_config(Arc::new(self.config()))
    }

    /// One full run followed by release, as the binary does it.
    pub async fn run(&self, mailbox: &mut MockMailbox) -> RunSummary {
        use inboxpdf::MailSession;

        let summary = self.harvester().run(mailbox).await;
        mailbox.release().await;
        summary
    }

    /// Names of the files in the output directory, sorted.
    pub fn saved_files(&self) -> Vec<String> {
        let mut names: Vec<String> = match std::fs::read_dir(&self.output_dir) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect(),
            Err(_) => Vec::new(),
        };
        names.sort();
        names
    }

    pub fn audit_records(&self) -> Vec<MessageRecord> {
        AuditLog::new(&self.audit_log_file)
            .read_all()
            .expect("audit log should be readable")
    }

    pub fn processed_ids(&self) -> Vec<String> {
        DedupStore::load(&self.processed_ids_file)
            .expect("processed ids should be readable")
            .iter()
            .map(|id| id.to_string())
            .collect()
    }
}
