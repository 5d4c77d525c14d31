use std::fmt;

use serde::Serialize;

/// Counters for one mailbox pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MailboxStats {
    pub mailbox: String,
    /// Candidates returned by the search.
    pub emails_seen: usize,
    /// New messages that were parsed and classified.
    pub emails_processed: usize,
    pub pdf_saved: usize,
    /// Candidates skipped because they were already recorded.
    pub duplicates: usize,
    /// Candidates that failed to fetch or parse.
    pub errors: usize,
    /// Why the pass ended early (select or search failed).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl MailboxStats {
    pub fn new(mailbox: &str) -> Self {
        Self {
            mailbox: mailbox.to_string(),
            ..Default::default()
        }
    }

    pub fn failed(mailbox: &str, failure: impl ToString) -> Self {
        Self {
            failure: Some(failure.to_string()),
            ..Self::new(mailbox)
        }
    }
}

impl fmt::Display for MailboxStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] seen={} processed={} pdf_saved={} duplicates={} errors={}",
            self.mailbox,
            self.emails_seen,
            self.emails_processed,
            self.pdf_saved,
            self.duplicates,
            self.errors
        )?;
        if let Some(failure) = &self.failure {
            write!(f, " failed: {}", failure)?;
        }
        Ok(())
    }
}

/// Outcome of one run over every configured mailbox.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub mailboxes: Vec<MailboxStats>,
}

/// Totals across all mailboxes of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunTotals {
    pub emails_seen: usize,
    pub emails_processed: usize,
    pub pdf_saved: usize,
    pub duplicates: usize,
    pub errors: usize,
    pub failed_mailboxes: usize,
}

impl RunSummary {
    pub fn push(&mut self, stats: MailboxStats) {
        self.mailboxes.push(stats);
    }

    pub fn totals(&self) -> RunTotals {
        self.mailboxes
            .iter()
            .fold(RunTotals::default(), |mut totals, stats| {
                totals.emails_seen += stats.emails_seen;
                totals.emails_processed += stats.emails_processed;
                totals.pdf_saved += stats.pdf_saved;
                totals.duplicates += stats.duplicates;
                totals.errors += stats.errors;
                if stats.failure.is_some() {
                    totals.failed_mailboxes += 1;
                }
                totals
            })
    }

    pub fn mailbox(&self, name: &str) -> Option<&MailboxStats> {
        self.mailboxes.iter().find(|stats| stats.mailbox == name)
    }
}

impl fmt::Display for RunTotals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "seen={} processed={} pdf_saved={} duplicates={} errors={} failed_mailboxes={}",
            self.emails_seen,
            self.emails_processed,
            self.pdf_saved,
            self.duplicates,
            self.errors,
            self.failed_mailboxes
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_totals_add_up() {
        let mut summary = RunSummary::default();
        summary.push(MailboxStats {
            emails_seen: 3,
            emails_processed: 2,
            pdf_saved: 4,
            duplicates: 1,
            ..MailboxStats::new("INBOX")
        });
        summary.push(MailboxStats {
            emails_seen: 1,
            errors: 1,
            ..MailboxStats::new("Invoices")
        });
        summary.push(MailboxStats::failed("Archive", "NO such mailbox"));

        let totals = summary.totals();
        assert_eq!(totals.emails_seen, 4);
        assert_eq!(totals.emails_processed, 2);
        assert_eq!(totals.pdf_saved, 4);
        assert_eq!(totals.duplicates, 1);
        assert_eq!(totals.errors, 1);
        assert_eq!(totals.failed_mailboxes, 1);
        assert_eq!(summary.mailbox("Invoices").unwrap().errors, 1);
    }

    #[test]
    fn test_display() {
        let stats = MailboxStats::failed("Archive", "NO");
        assert_eq!(
            stats.to_string(),
            "[Archive] seen=0 processed=0 pdf_saved=0 duplicates=0 errors=0 failed: NO"
        );
    }

    #[test]
    fn test_failure_omitted_from_json_when_absent() {
        let json = serde_json::to_string(&MailboxStats::new("INBOX")).unwrap();
        assert!(!json.contains("failure"));
    }
}
