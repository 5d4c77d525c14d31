use std::path::PathBuf;

use crate::config::Config;

/// The subset of [`Config`] a mailbox pass needs.
#[derive(Debug, Clone)]
pub struct HarvesterConfig {
    pub sender_filter: String,
    pub mailboxes: Vec<String>,
    pub output_directory: PathBuf,
    pub processed_ids_file: PathBuf,
    pub audit_log_file: PathBuf,
}

impl HarvesterConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            sender_filter: config.sender_filter.trim().to_string(),
            mailboxes: config.mailboxes.clone(),
            output_directory: config.output_directory.clone(),
            processed_ids_file: config.processed_ids_file.clone(),
            audit_log_file: config.audit_log_file.clone(),
        }
    }
}
