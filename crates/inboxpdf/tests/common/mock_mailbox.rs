//! In-memory mailbox server.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;

use inboxpdf::email::error::Result;
use inboxpdf::{EmailError, MailSession};

pub struct MockMessage {
    pub raw: Vec<u8>,
    /// Envelope sender matched by `FROM` searches.
    pub from: String,
    pub uid: Option<u32>,
    pub seen: bool,
}

impl MockMessage {
    pub fn new(raw: Vec<u8>, from: &str) -> Self {
        Self {
            raw,
            from: from.to_string(),
            uid: None,
            seen: false,
        }
    }

    pub fn uid(mut self, uid: u32) -> Self {
        self.uid = Some(uid);
        self
    }

    pub fn seen(mut self) -> Self {
        self.seen = true;
        self
    }
}

/// A mailbox server holding messages per folder. Messages are addressed by
/// their 1-based position in the selected folder.
#[derive(Default)]
pub struct MockMailbox {
    folders: BTreeMap<String, Vec<MockMessage>>,
    selected: Option<String>,

    pub fail_select: HashSet<String>,
    pub fail_search: HashSet<String>,
    pub fail_fetch: HashSet<u32>,
    pub fail_uid_fetch: bool,
    pub fail_uid_store: bool,
    pub fail_store: bool,

    /// Every command received, in order.
    pub commands: Vec<String>,
    pub logged_out: bool,
}

impl MockMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_folder(mut self, name: &str) -> Self {
        self.folders.entry(name.to_string()).or_default();
        self
    }

    pub fn with_message(mut self, folder: &str, message: MockMessage) -> Self {
        self.folders
            .entry(folder.to_string())
            .or_default()
            .push(message);
        self
    }

    pub fn messages(&self, folder: &str) -> &[MockMessage] {
        self.folders.get(folder).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_seen(&self, folder: &str, seq: u32) -> bool {
        self.messages(folder)[(seq - 1) as usize].seen
    }

    pub fn unseen_count(&self, folder: &str) -> usize {
        self.messages(folder).iter().filter(|m| !m.seen).count()
    }

    pub fn mark_all_unseen(&mut self) {
        for messages in self.folders.values_mut() {
            for message in messages {
                message.seen = false;
            }
        }
    }

    pub fn count_commands(&self, prefix: &str) -> usize {
        self.commands.iter().filter(|c| c.starts_with(prefix)).count()
    }

    fn selected_messages(&mut self) -> Result<&mut Vec<MockMessage>> {
        let name = self
            .selected
            .clone()
            .ok_or_else(|| EmailError::ConnectionFailed("no mailbox selected".to_string()))?;
        self.folders
            .get_mut(&name)
            .ok_or_else(|| EmailError::ConnectionFailed("selected mailbox vanished".to_string()))
    }

    fn message_mut(&mut self, seq: u32) -> Result<&mut MockMessage> {
        self.selected_messages()?
            .get_mut((seq as usize).wrapping_sub(1))
            .ok_or_else(|| EmailError::Fetch {
                seq,
                reason: "no such message".to_string(),
            })
    }
}

/// Extracts the sender from `UNSEEN FROM "<sender>"`.
fn sender_of(query: &str) -> Option<String> {
    let start = query.find("FROM \"")? + "FROM \"".len();
    let mut sender = String::new();
    let mut escaped = false;
    for c in query[start..].chars() {
        match (escaped, c) {
            (false, '\\') => escaped = true,
            (false, '"') => return Some(sender),
            _ => {
                sender.push(c);
                escaped = false;
            }
        }
    }
    None
}

#[async_trait]
impl MailSession for MockMailbox {
    async fn select(&mut self, mailbox: &str) -> Result<()> {
        self.commands.push(format!("SELECT {}", mailbox));
        if self.fail_select.contains(mailbox) || !self.folders.contains_key(mailbox) {
            return Err(EmailError::MailboxSelect {
                mailbox: mailbox.to_string(),
                reason: "NO mailbox does not exist".to_string(),
            });
        }
        self.selected = Some(mailbox.to_string());
        Ok(())
    }

    async fn search(&mut self, query: &str) -> Result<Vec<u32>> {
        self.commands.push(format!("SEARCH {}", query));
        let mailbox = self.selected.clone().unwrap_or_default();
        if self.fail_search.contains(&mailbox) {
            return Err(EmailError::Search {
                mailbox,
                query: query.to_string(),
                reason: "BAD search failed".to_string(),
            });
        }

        let sender = sender_of(query).unwrap_or_default().to_lowercase();
        let unseen_only = query.contains("UNSEEN");
        let messages = self.selected_messages()?;
        Ok(messages
            .iter()
            .enumerate()
            .filter(|(_, m)| !(unseen_only && m.seen))
            .filter(|(_, m)| m.from.to_lowercase().contains(&sender))
            .map(|(i, _)| i as u32 + 1)
            .collect())
    }

    async fn fetch_message(&mut self, seq: u32) -> Result<Vec<u8>> {
        self.commands.push(format!("FETCH {} BODY.PEEK[]", seq));
        if self.fail_fetch.contains(&seq) {
            return Err(EmailError::Fetch {
                seq,
                reason: "NO fetch failed".to_string(),
            });
        }
        Ok(self.message_mut(seq)?.raw.clone())
    }

    async fn fetch_uid(&mut self, seq: u32) -> Result<Option<u32>> {
        self.commands.push(format!("FETCH {} (UID)", seq));
        if self.fail_uid_fetch {
            return Err(EmailError::Fetch {
                seq,
                reason: "NO uid fetch failed".to_string(),
            });
        }
        Ok(self.message_mut(seq)?.uid)
    }

    async fn uid_store_seen(&mut self, uid: u32) -> Result<()> {
        self.commands.push(format!("UID STORE {} +FLAGS (\\Seen)", uid));
        if self.fail_uid_store {
            return Err(EmailError::MarkSeen("NO uid store failed".to_string()));
        }
        let message = self
            .selected_messages()?
            .iter_mut()
            .find(|m| m.uid == Some(uid))
            .ok_or_else(|| EmailError::MarkSeen(format!("no message with UID {}", uid)))?;
        message.seen = true;
        Ok(())
    }

    async fn store_seen(&mut self, seq: u32) -> Result<()> {
        self.commands.push(format!("STORE {} +FLAGS (\\Seen)", seq));
        if self.fail_store {
            return Err(EmailError::MarkSeen("NO store failed".to_string()));
        }
        self.message_mut(seq)
            .map_err(|e| EmailError::MarkSeen(e.to_string()))?
            .seen = true;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.commands.push("CLOSE".to_string());
        self.selected = None;
        Ok(())
    }

    async fn logout(&mut self) -> Result<()> {
        self.commands.push("LOGOUT".to_string());
        self.logged_out = true;
        Ok(())
    }
}
