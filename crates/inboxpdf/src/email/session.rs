//! The mailbox operations the pipeline relies on.

use async_trait::async_trait;
use tracing::{debug, warn};

use super::error::Result;

/// An authenticated mailbox connection.
///
/// Messages are addressed by their sequence number in the currently selected
/// mailbox unless a method says otherwise.
#[async_trait]
pub trait MailSession: Send {
    /// Selects `mailbox` read-write.
    async fn select(&mut self, mailbox: &str) -> Result<()>;

    /// Runs a SEARCH in the selected mailbox and returns matching sequence
    /// numbers in ascending order.
    async fn search(&mut self, query: &str) -> Result<Vec<u32>>;

    /// Fetches the complete raw message without touching its flags.
    async fn fetch_message(&mut self, seq: u32) -> Result<Vec<u8>>;

    /// Looks up the server UID of a message. `Ok(None)` when the server
    /// answered without one.
    async fn fetch_uid(&mut self, seq: u32) -> Result<Option<u32>>;

    /// Adds `\Seen` to the message with the given UID.
    async fn uid_store_seen(&mut self, uid: u32) -> Result<()>;

    /// Adds `\Seen` to the message at the given sequence number.
    async fn store_seen(&mut self, seq: u32) -> Result<()>;

    /// Closes the selected mailbox.
    async fn close(&mut self) -> Result<()>;

    /// Ends the session.
    async fn logout(&mut self) -> Result<()>;

    /// Releases the session: CLOSE, then LOGOUT, each attempted regardless of
    /// the other's outcome.
    async fn release(&mut self) {
        if let Err(e) = self.close().await {
            debug!("CLOSE failed during release: {}", e);
        }
        if let Err(e) = self.logout().await {
            warn!("LOGOUT failed during release: {}", e);
        }
    }
}
