pub mod audit;
pub mod config;
pub mod dedup;
pub mod email;
pub mod error;
pub mod harvester;
pub mod logging;
pub mod sanitize;
pub mod secrets;
pub mod storage;

pub use audit::{AuditLog, MessageRecord, RecordStatus};
pub use config::{load_config, load_config_from_str, Config};
pub use dedup::DedupStore;
pub use email::{EmailError, ImapClient, MailSession, UniqueId};
pub use error::{AuditError, ConfigError, DedupError, InboxPdfError, Result, StorageError};
pub use harvester::{run_once, Harvester, HarvesterConfig, MailboxStats, RunSummary, RunTotals};
pub use secrets::{resolve_secret, SecretError};
pub use storage::FileStorage;
