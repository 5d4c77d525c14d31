//! Mailbox access and message handling.
//!
//! The IMAP connection is hidden behind the [`MailSession`] trait so the
//! scanning pipeline can run against any mailbox implementation.

pub mod classifier;
pub mod client;
pub mod error;
pub mod mark_seen;
pub mod parser;
pub mod scanner;
pub mod session;
pub mod unique_id;

pub use classifier::{classify, pdf_attachments, PdfAttachment, PdfEvidence};
pub use client::ImapClient;
pub use error::EmailError;
pub use mark_seen::{mark_seen, MarkSeenPath};
pub use parser::{AttachmentLeaf, EmailParser, MimeNode, ParsedMessage};
pub use scanner::MailboxScanner;
pub use session::MailSession;
pub use unique_id::UniqueId;
