//! Mailbox selection, filtered search, and message fetching.

use tracing::{debug, info};

use crate::sanitize::redact_address;

use super::error::Result;
use super::session::MailSession;

/// Finds unread messages from one sender in a mailbox.
#[derive(Debug, Clone)]
pub struct MailboxScanner {
    sender_filter: String,
}

impl MailboxScanner {
    pub fn new(sender_filter: impl Into<String>) -> Self {
        Self {
            sender_filter: sender_filter.into(),
        }
    }

    pub fn sender_filter(&self) -> &str {
        &self.sender_filter
    }

    /// The SEARCH criteria: unread AND from the configured sender.
    pub fn query(&self) -> String {
        unseen_from_query(&self.sender_filter)
    }

    /// Selects `mailbox` and returns the sequence numbers of candidate
    /// messages in ascending order. Either failure is confined to this mailbox.
    pub async fn candidates<S>(&self, session: &mut S, mailbox: &str) -> Result<Vec<u32>>
    where
        S: MailSession + ?Sized,
    {
        session.select(mailbox).await?;

        let query = self.query();
        let mut seqs = session.search(&query).await?;
        seqs.sort_unstable();
        seqs.dedup();

        if seqs.is_empty() {
            debug!(
                "No unread messages from {} in '{}'",
                redact_address(&self.sender_filter),
                mailbox
            );
        } else {
            info!(
                "Found {} unread messages from {} in '{}'",
                seqs.len(),
                redact_address(&self.sender_filter),
                mailbox
            );
        }
        Ok(seqs)
    }

    /// Fetches the full raw content of one candidate.
    pub async fn fetch<S>(&self, session: &mut S, seq: u32) -> Result<Vec<u8>>
    where
        S: MailSession + ?Sized,
    {
        session.fetch_message(seq).await
    }
}

/// Builds `UNSEEN FROM "<sender>"`, quoting the address as an IMAP string.
pub fn unseen_from_query(sender: &str) -> String {
    let mut quoted = String::with_capacity(sender.len() + 2);
    for c in sender.trim().chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    format!("UNSEEN FROM \"{}\"", quoted)
}
