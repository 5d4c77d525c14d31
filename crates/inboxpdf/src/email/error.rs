//! Mail session and per-message error types.

use thiserror::Error;

/// Errors that can occur while talking to the mailbox or handling one message.
#[derive(Error, Debug)]
pub enum EmailError {
    /// Failed to connect to the IMAP server.
    #[error("IMAP connection failed: {0}")]
    ConnectionFailed(String),

    /// TLS/SSL error during connection.
    #[error("TLS error: {0}")]
    TlsError(String),

    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Failed to resolve the account password.
    #[error("Credentials not found: {0}")]
    CredentialsNotFound(String),

    /// SELECT was refused for a mailbox.
    #[error("Cannot select mailbox '{mailbox}': {reason}")]
    MailboxSelect { mailbox: String, reason: String },

    /// SEARCH failed in a mailbox.
    #[error("Search failed in '{mailbox}' with query {query}: {reason}")]
    Search {
        mailbox: String,
        query: String,
        reason: String,
    },

    /// FETCH failed or returned no content.
    #[error("Fetch failed for message {seq}: {reason}")]
    Fetch { seq: u32, reason: String },

    /// Failed to parse email message.
    #[error("Failed to parse email: {0}")]
    ParseError(String),

    /// Setting the \Seen flag failed.
    #[error("Failed to mark message as seen: {0}")]
    MarkSeen(String),

    /// Operation timed out.
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

impl EmailError {
    /// Returns true for failures that end the whole run rather than one mailbox
    /// or one message. A timeout is only fatal while connecting, where it is
    /// reported as [`EmailError::ConnectionFailed`].
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            EmailError::ConnectionFailed(_)
                | EmailError::TlsError(_)
                | EmailError::AuthenticationFailed(_)
                | EmailError::CredentialsNotFound(_)
                | EmailError::ConfigError(_)
        )
    }
}

impl From<async_native_tls::Error> for EmailError {
    fn from(err: async_native_tls::Error) -> Self {
        EmailError::TlsError(err.to_string())
    }
}

/// Result type for email operations.
pub type Result<T> = std::result::Result<T, EmailError>;
