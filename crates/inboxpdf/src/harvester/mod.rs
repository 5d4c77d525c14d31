pub mod config;
pub mod runner;
pub mod stats;

pub use config::HarvesterConfig;
pub use runner::{run_once, Harvester};
pub use stats::{MailboxStats, RunSummary, RunTotals};
