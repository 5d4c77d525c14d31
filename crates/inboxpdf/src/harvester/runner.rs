use std::path::Path;
use std::sync::Arc;

use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::audit::{AuditLog, MessageRecord};
use crate::config::Config;
use crate::dedup::DedupStore;
use crate::email::{
    mark_seen, pdf_attachments, EmailError, EmailParser, ImapClient, MailSession,
    MailboxScanner, UniqueId,
};
use crate::error::InboxPdfError;
use crate::sanitize;
use crate::storage::{target_filename, FileStorage};

use super::config::HarvesterConfig;
use super::stats::{MailboxStats, RunSummary};

/// How a candidate ended, before the read flag is set.
enum Outcome {
    /// Already recorded by an earlier pass or earlier in this one.
    Duplicate(UniqueId),
    /// Parsed and classified; any PDFs have been written.
    Completed {
        unique_id: UniqueId,
        record: MessageRecord,
    },
}

/// A candidate that could not be fetched or parsed.
struct MessageFailure {
    /// Known once the body has been fetched.
    unique_id: Option<UniqueId>,
    error: EmailError,
}

impl MessageFailure {
    fn unidentified(error: EmailError) -> Self {
        Self {
            unique_id: None,
            error,
        }
    }

    fn identified(unique_id: UniqueId, error: EmailError) -> Self {
        Self {
            unique_id: Some(unique_id),
            error,
        }
    }
}

/// Scans mailboxes for unread messages from one sender and saves their PDFs.
///
/// For every candidate the durable writes happen in a fixed order: PDF
/// files, audit record, processed-id snapshot, and only then the read flag.
/// A crash anywhere before the flag is set leaves the message unread but
/// recorded, so the next run only repeats the flag update.
pub struct Harvester {
    config: Arc<HarvesterConfig>,
    scanner: MailboxScanner,
    parser: EmailParser,
    storage: FileStorage,
    audit: AuditLog,
}

impl Harvester {
    pub fn from_config(config: Arc<HarvesterConfig>) -> Self {
        let scanner = MailboxScanner::new(config.sender_filter.clone());
        let storage = FileStorage::new(&config.output_directory);
        let audit = AuditLog::new(&config.audit_log_file);

        Self {
            config,
            scanner,
            parser: EmailParser::new(),
            storage,
            audit,
        }
    }

    pub fn config(&self) -> &HarvesterConfig {
        &self.config
    }

    /// Scans every configured mailbox in order. A mailbox that cannot be
    /// selected or searched, or whose processed-id file cannot be read, is
    /// reported in the summary and the rest still run.
    pub async fn run<S>(&self, session: &mut S) -> RunSummary
    where
        S: MailSession + ?Sized,
    {
        let mut summary = RunSummary::default();

        for mailbox in &self.config.mailboxes {
            let stats = match self
                .scan_mailbox(session, mailbox)
                .instrument(info_span!("mailbox_pass", mailbox = %mailbox))
                .await
            {
                Ok(stats) => stats,
                Err(e) => {
                    error!("Skipping mailbox '{}': {}", mailbox, e);
                    MailboxStats::failed(mailbox, &e)
                }
            };
            info!("{}", stats);
            summary.push(stats);
        }

        summary
    }

    /// One pass over `mailbox`. Only processed-id load, select and search
    /// failures are returned, before any message is touched; per-message
    /// failures are recorded and the pass continues.
    pub async fn scan_mailbox<S>(
        &self,
        session: &mut S,
        mailbox: &str,
    ) -> Result<MailboxStats, InboxPdfError>
    where
        S: MailSession + ?Sized,
    {
        let mut stats = MailboxStats::new(mailbox);
        let mut dedup = DedupStore::load(&self.config.processed_ids_file)?;
        debug!(
            "Loaded {} processed ids from {}",
            dedup.len(),
            sanitize::redact_path(dedup.path())
        );

        let candidates = self.scanner.candidates(session, mailbox).await?;

        for seq in candidates {
            self.handle_candidate(session, mailbox, seq, &mut dedup, &mut stats)
                .instrument(info_span!("message", seq))
                .await;
        }

        Ok(stats)
    }

    async fn handle_candidate<S>(
        &self,
        session: &mut S,
        mailbox: &str,
        seq: u32,
        dedup: &mut DedupStore,
        stats: &mut MailboxStats,
    ) where
        S: MailSession + ?Sized,
    {
        stats.emails_seen += 1;

        match self.process_candidate(session, mailbox, seq, dedup).await {
            Ok(Outcome::Duplicate(unique_id)) => {
                info!("Skipping already processed message {}", unique_id);
                stats.duplicates += 1;
            }
            Ok(Outcome::Completed { unique_id, record }) => {
                stats.pdf_saved += record.saved_files.len();
                stats.emails_processed += 1;
                self.append_record(&record);
                self.record_processed(dedup, unique_id);
            }
            Err(failure) => {
                error!("Failed to process message {}: {}", seq, failure.error);
                stats.errors += 1;
                let logged_id = failure
                    .unique_id
                    .clone()
                    .unwrap_or_else(|| UniqueId::from_seq(seq));
                self.append_record(&MessageRecord::failed(mailbox, logged_id, &failure.error));
                if let Some(unique_id) = failure.unique_id {
                    self.record_processed(dedup, unique_id);
                }
            }
        }

        if let Err(e) = mark_seen(session, seq).await {
            warn!("Message {} stays unread: {}", seq, e);
        }
    }

    async fn process_candidate<S>(
        &self,
        session: &mut S,
        mailbox: &str,
        seq: u32,
        dedup: &DedupStore,
    ) -> Result<Outcome, MessageFailure>
    where
        S: MailSession + ?Sized,
    {
        let raw = self
            .scanner
            .fetch(session, seq)
            .await
            .map_err(MessageFailure::unidentified)?;
        let parsed = match self.parser.parse(&raw) {
            Ok(parsed) => parsed,
            Err(e) => {
                let uid = lookup_uid(session, seq).await;
                let unique_id = UniqueId::derive(None, uid, seq);
                if dedup.contains(&unique_id) {
                    return Ok(Outcome::Duplicate(unique_id));
                }
                return Err(MessageFailure::identified(unique_id, e));
            }
        };

        // The UID is only needed when the sender set no Message-ID.
        let uid = match parsed.message_id {
            Some(_) => None,
            None => lookup_uid(session, seq).await,
        };
        let unique_id = UniqueId::derive(parsed.message_id.as_deref(), uid, seq);

        if dedup.contains(&unique_id) {
            return Ok(Outcome::Duplicate(unique_id));
        }

        let leaves = parsed.leaves();
        let pdfs = pdf_attachments(&leaves);
        debug!(
            "Message {} has {} leaf parts, {} PDF",
            unique_id,
            leaves.len(),
            pdfs.len()
        );

        let mut saved_files = Vec::new();
        let mut save_errors = Vec::new();
        for pdf in &pdfs {
            let filename = target_filename(pdf.name(), parsed.subject.as_deref());
            match self.storage.store(&filename, pdf.content()) {
                Ok(path) => {
                    let saved = file_name_of(&path);
                    info!("Saved PDF {} ({:?} match)", saved, pdf.evidence);
                    saved_files.push(saved);
                }
                Err(e) => {
                    error!("Failed to save '{}' from {}: {}", filename, unique_id, e);
                    save_errors.push(format!("{}: {}", filename, e));
                }
            }
        }

        let record = MessageRecord::completed(
            mailbox,
            unique_id.clone(),
            parsed.from.as_deref(),
            parsed.subject.as_deref(),
            saved_files,
            &save_errors,
        );
        Ok(Outcome::Completed { unique_id, record })
    }

    fn append_record(&self, record: &MessageRecord) {
        if let Err(e) = self.audit.append(record) {
            error!("Failed to write audit record for {}: {}", record.message_unique_id, e);
        }
    }

    fn record_processed(&self, dedup: &mut DedupStore, unique_id: UniqueId) {
        if let Err(e) = dedup.record(unique_id) {
            error!("Failed to persist processed ids: {}", e);
        }
    }
}

async fn lookup_uid<S>(session: &mut S, seq: u32) -> Option<u32>
where
    S: MailSession + ?Sized,
{
    session.fetch_uid(seq).await.unwrap_or_else(|e| {
        debug!("No UID for message {}: {}", seq, e);
        None
    })
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Connects, scans every mailbox, and releases the session.
///
/// A connection or login failure ends the run before any mailbox is touched.
pub async fn run_once(config: &Config) -> Result<RunSummary, InboxPdfError> {
    let harvester = Harvester::from_config(Arc::new(HarvesterConfig::from_config(config)));

    let mut client = ImapClient::new(config.imap.clone());
    client.connect().await?;

    let summary = harvester.run(&mut client).await;
    client.release().await;

    Ok(summary)
}
