//! IMAP client for connecting to email servers.

use std::future::Future;
use std::net::ToSocketAddrs;
use std::time::Duration;

use async_imap::types::Fetch;
use async_imap::Session;
use async_native_tls::TlsConnector;
use async_trait::async_trait;
use futures_util::TryStreamExt;
use secrecy::ExposeSecret;
use tracing::{debug, info, warn};

use crate::config::ImapConfig;

use super::error::{EmailError, Result};
use super::session::MailSession;

/// Type alias for the underlying async stream (using async-std compatible TcpStream).
type AsyncTcpStream = async_io::Async<std::net::TcpStream>;

/// Type alias for the TLS stream used by the IMAP session.
type TlsStream = async_native_tls::TlsStream<AsyncTcpStream>;

const SEEN_FLAG: &str = "+FLAGS (\\Seen)";

/// IMAP client over an implicit-TLS connection.
pub struct ImapClient {
    session: Option<Session<TlsStream>>,
    config: ImapConfig,
    current_mailbox: Option<String>,
}

impl ImapClient {
    /// Creates a new IMAP client with the given configuration.
    pub fn new(config: ImapConfig) -> Self {
        Self {
            session: None,
            config,
            current_mailbox: None,
        }
    }

    /// Connects to the IMAP server and authenticates.
    ///
    /// Any failure here is fatal for the run; nothing in the mailbox has been
    /// touched yet.
    pub async fn connect(&mut self) -> Result<()> {
        if self.session.is_some() {
            debug!("Already connected to IMAP server");
            return Ok(());
        }

        if !self.config.use_tls {
            return Err(EmailError::ConfigError(
                "TLS is required for secure email connections".to_string(),
            ));
        }

        let password = crate::secrets::resolve_password(&self.config.auth)
            .map_err(|e| EmailError::CredentialsNotFound(e.to_string()))?;

        let timeout = self.config.timeout();
        let addr = format!("{}:{}", self.config.host, self.config.port);
        info!(
            "Connecting to IMAP server at {} as {}",
            addr,
            crate::sanitize::redact_address(&self.config.username)
        );

        let std_stream = connect_tcp(&self.config.host, self.config.port, timeout)?;
        std_stream
            .set_nonblocking(true)
            .map_err(|e| EmailError::ConnectionFailed(e.to_string()))?;
        let tcp_stream = async_io::Async::new(std_stream)
            .map_err(|e| EmailError::ConnectionFailed(e.to_string()))?;

        let tls = TlsConnector::new();
        let tls_stream = with_timeout(timeout, "TLS handshake", async {
            tls.connect(&self.config.host, tcp_stream)
                .await
                .map_err(EmailError::from)
        })
        .await
        .map_err(connect_failure)?;

        let client = async_imap::Client::new(tls_stream);
        let session = with_timeout(timeout, "LOGIN", async {
            client
                .login(&self.config.username, password.expose_secret())
                .await
                .map_err(|(e, _)| EmailError::AuthenticationFailed(e.to_string()))
        })
        .await
        .map_err(connect_failure)?;

        info!("Successfully authenticated to IMAP server");
        self.session = Some(session);
        Ok(())
    }

    /// Checks if the client is currently connected.
    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    /// The mailbox selected by the last successful SELECT.
    pub fn current_mailbox(&self) -> Option<&str> {
        self.current_mailbox.as_deref()
    }

    fn session_mut(&mut self) -> Result<&mut Session<TlsStream>> {
        self.session
            .as_mut()
            .ok_or_else(|| EmailError::ConnectionFailed("Not connected".to_string()))
    }

    /// Runs a FETCH for one message and drains the response stream.
    async fn fetch_all(&mut self, seq: u32, query: &str) -> Result<Vec<Fetch>> {
        let timeout = self.config.timeout();
        let session = self.session_mut()?;
        with_timeout(timeout, "FETCH", async {
            let stream = session
                .fetch(seq.to_string(), query)
                .await
                .map_err(|e| EmailError::Fetch {
                    seq,
                    reason: e.to_string(),
                })?;
            stream
                .try_collect::<Vec<Fetch>>()
                .await
                .map_err(|e| EmailError::Fetch {
                    seq,
                    reason: e.to_string(),
                })
        })
        .await
    }
}

#[async_trait]
impl MailSession for ImapClient {
    async fn select(&mut self, mailbox: &str) -> Result<()> {
        let timeout = self.config.timeout();
        let session = self.session_mut()?;

        info!("Selecting mailbox: {}", mailbox);
        let selected = with_timeout(timeout, "SELECT", async {
            session
                .select(mailbox)
                .await
                .map_err(|e| EmailError::MailboxSelect {
                    mailbox: mailbox.to_string(),
                    reason: e.to_string(),
                })
        })
        .await?;

        debug!("Mailbox '{}' holds {} messages", mailbox, selected.exists);
        self.current_mailbox = Some(mailbox.to_string());
        Ok(())
    }

    async fn search(&mut self, query: &str) -> Result<Vec<u32>> {
        let timeout = self.config.timeout();
        let mailbox = self.current_mailbox.clone().unwrap_or_default();
        let session = self.session_mut()?;

        debug!("Searching with query: {}", query);
        let found = with_timeout(timeout, "SEARCH", async {
            session.search(query).await.map_err(|e| EmailError::Search {
                mailbox: mailbox.clone(),
                query: query.to_string(),
                reason: e.to_string(),
            })
        })
        .await?;

        // SEARCH answers with a set; keep server order (ascending sequence numbers).
        let mut seqs: Vec<u32> = found.into_iter().collect();
        seqs.sort_unstable();
        debug!("Found {} messages matching search", seqs.len());
        Ok(seqs)
    }

    async fn fetch_message(&mut self, seq: u32) -> Result<Vec<u8>> {
        debug!("Fetching message {}", seq);

        // BODY.PEEK[] leaves \Seen alone; marking is done separately.
        let messages = self.fetch_all(seq, "BODY.PEEK[]").await?;
        messages
            .iter()
            .find_map(|message| message.body().map(|body| body.to_vec()))
            .ok_or_else(|| EmailError::Fetch {
                seq,
                reason: "server returned no message content".to_string(),
            })
    }

    async fn fetch_uid(&mut self, seq: u32) -> Result<Option<u32>> {
        let messages = self.fetch_all(seq, "(UID)").await?;
        Ok(messages.iter().find_map(|message| message.uid))
    }

    async fn uid_store_seen(&mut self, uid: u32) -> Result<()> {
        let timeout = self.config.timeout();
        let session = self.session_mut()?;
        with_timeout(timeout, "UID STORE", async {
            let stream = session
                .uid_store(uid.to_string(), SEEN_FLAG)
                .await
                .map_err(|e| EmailError::MarkSeen(format!("UID STORE {}: {}", uid, e)))?;
            stream
                .try_collect::<Vec<Fetch>>()
                .await
                .map_err(|e| EmailError::MarkSeen(format!("UID STORE {}: {}", uid, e)))?;
            Ok(())
        })
        .await
    }

    async fn store_seen(&mut self, seq: u32) -> Result<()> {
        let timeout = self.config.timeout();
        let session = self.session_mut()?;
        with_timeout(timeout, "STORE", async {
            let stream = session
                .store(seq.to_string(), SEEN_FLAG)
                .await
                .map_err(|e| EmailError::MarkSeen(format!("STORE {}: {}", seq, e)))?;
            stream
                .try_collect::<Vec<Fetch>>()
                .await
                .map_err(|e| EmailError::MarkSeen(format!("STORE {}: {}", seq, e)))?;
            Ok(())
        })
        .await
    }

    async fn close(&mut self) -> Result<()> {
        if self.current_mailbox.is_none() {
            return Ok(());
        }
        let timeout = self.config.timeout();
        let session = self.session_mut()?;
        with_timeout(timeout, "CLOSE", async {
            session
                .close()
                .await
                .map_err(|e| EmailError::ConnectionFailed(e.to_string()))
        })
        .await?;
        self.current_mailbox = None;
        Ok(())
    }

    async fn logout(&mut self) -> Result<()> {
        let timeout = self.config.timeout();
        self.current_mailbox = None;
        if let Some(mut session) = self.session.take() {
            info!("Disconnecting from IMAP server");
            with_timeout(timeout, "LOGOUT", async {
                session
                    .logout()
                    .await
                    .map_err(|e| EmailError::ConnectionFailed(e.to_string()))
            })
            .await?;
        }
        Ok(())
    }
}

impl Drop for ImapClient {
    fn drop(&mut self) {
        if self.session.is_some() {
            warn!("ImapClient dropped without explicit release - session will be closed");
        }
    }
}

/// Opens a TCP connection to the first reachable address of `host`.
fn connect_tcp(host: &str, port: u16, timeout: Duration) -> Result<std::net::TcpStream> {
    let addrs = (host, port)
        .to_socket_addrs()
        .map_err(|e| EmailError::ConnectionFailed(format!("{}: {}", host, e)))?;

    let mut last_error = None;
    for addr in addrs {
        match std::net::TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                debug!("Connection to {} failed: {}", addr, e);
                last_error = Some(e);
            }
        }
    }

    Err(match last_error {
        Some(e) if e.kind() == std::io::ErrorKind::TimedOut => {
            EmailError::ConnectionFailed(format!("timed out connecting to {}:{}", host, port))
        }
        Some(e) => EmailError::ConnectionFailed(format!("{}:{}: {}", host, port, e)),
        None => EmailError::ConnectionFailed(format!("{} did not resolve to any address", host)),
    })
}

/// A timeout while opening the session ends the run like any other
/// connection failure.
fn connect_failure(error: EmailError) -> EmailError {
    match error {
        EmailError::Timeout(message) => {
            EmailError::ConnectionFailed(format!("timed out: {}", message))
        }
        other => other,
    }
}

/// Bounds an IMAP operation by the configured timeout.
async fn with_timeout<T, F>(timeout: Duration, operation: &str, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::time::timeout(timeout, future)
        .await
        .map_err(|_| EmailError::Timeout(format!("{} after {}s", operation, timeout.as_secs())))?
}
