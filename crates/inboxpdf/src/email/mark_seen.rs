//! Setting the read flag on a processed message.

use tracing::debug;

use super::error::{EmailError, Result};
use super::session::MailSession;

/// How the `\Seen` flag was finally applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkSeenPath {
    /// `UID STORE` using the server UID.
    Uid(u32),
    /// `STORE` using the sequence number.
    Sequence(u32),
}

/// Marks the message at `seq` as read.
///
/// The UID is looked up first and the flag set by UID; if any part of that
/// fails the flag is set by sequence number instead. An error means both
/// attempts failed and the message is still unread.
pub async fn mark_seen<S>(session: &mut S, seq: u32) -> Result<MarkSeenPath>
where
    S: MailSession + ?Sized,
{
    let uid_error = match by_uid(session, seq).await {
        Ok(uid) => {
            debug!("Marked message {} (UID {}) as seen", seq, uid);
            return Ok(MarkSeenPath::Uid(uid));
        }
        Err(e) => e,
    };

    debug!(
        "UID STORE failed for message {}, falling back to sequence number: {}",
        seq, uid_error
    );

    match session.store_seen(seq).await {
        Ok(()) => Ok(MarkSeenPath::Sequence(seq)),
        Err(seq_error) => Err(EmailError::MarkSeen(format!(
            "message {}: by UID: {}; by sequence number: {}",
            seq, uid_error, seq_error
        ))),
    }
}

async fn by_uid<S>(session: &mut S, seq: u32) -> Result<u32>
where
    S: MailSession + ?Sized,
{
    let uid = session
        .fetch_uid(seq)
        .await?
        .ok_or_else(|| EmailError::MarkSeen(format!("no UID returned for message {}", seq)))?;
    session.uid_store_seen(uid).await?;
    Ok(uid)
}
