//! Email parsing into decoded headers and a MIME part tree.

use mail_parser::decoders::base64::base64_decode;
use mail_parser::decoders::quoted_printable::quoted_printable_decode;
use mail_parser::{
    Address, Encoding, HeaderName, Message, MessageParser, MessagePart, MimeHeaders, PartType,
};
use tracing::debug;

use super::error::{EmailError, Result};

/// Content type assumed for a part that does not declare one.
const DEFAULT_CONTENT_TYPE: &str = "text/plain";

/// A non-container body part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentLeaf {
    /// Declared content type, lowercased (`type/subtype`).
    pub content_type: String,
    /// Decoded filename from Content-Disposition or Content-Type, if any.
    pub filename: Option<String>,
    /// Payload with the transfer encoding removed.
    pub content: Vec<u8>,
}

/// The body structure of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MimeNode {
    /// A multipart container or an embedded message.
    Multipart { children: Vec<MimeNode> },
    Leaf(AttachmentLeaf),
}

impl MimeNode {
    /// Leaves in document order; containers are descended into, never returned.
    pub fn leaves(&self) -> Vec<&AttachmentLeaf> {
        let mut leaves = Vec::new();
        self.collect_leaves(&mut leaves);
        leaves
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a AttachmentLeaf>) {
        match self {
            MimeNode::Multipart { children } => {
                for child in children {
                    child.collect_leaves(out);
                }
            }
            MimeNode::Leaf(leaf) => out.push(leaf),
        }
    }
}

/// A message reduced to what the pipeline needs.
#[derive(Debug, Clone)]
pub struct ParsedMessage {
    /// The raw Message-ID header value (brackets kept), when present and non-empty.
    pub message_id: Option<String>,
    /// Decoded From header.
    pub from: Option<String>,
    /// Decoded Subject header.
    pub subject: Option<String>,
    pub body: MimeNode,
}

impl ParsedMessage {
    pub fn leaves(&self) -> Vec<&AttachmentLeaf> {
        self.body.leaves()
    }
}

/// Parser for raw RFC 822 messages.
#[derive(Default)]
pub struct EmailParser {
    parser: MessageParser,
}

impl EmailParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a raw message. Header decoding never fails: undecodable bytes
    /// are replaced rather than rejected.
    pub fn parse(&self, raw_email: &[u8]) -> Result<ParsedMessage> {
        if raw_email.iter().all(|b| b.is_ascii_whitespace()) {
            return Err(EmailError::ParseError("Message is empty".to_string()));
        }

        let message = self
            .parser
            .parse(raw_email)
            .ok_or_else(|| EmailError::ParseError("Failed to parse email message".to_string()))?;

        let parsed = ParsedMessage {
            message_id: raw_message_id(&message),
            from: decoded_from(&message),
            subject: message.subject().map(|s| s.to_string()),
            body: build_node(&message, message.root_part()),
        };

        debug!(
            "Parsed message {:?} subject={:?} with {} leaf parts",
            parsed.message_id.as_deref().unwrap_or("(no Message-ID)"),
            parsed.subject.as_deref().unwrap_or("(no subject)"),
            parsed.leaves().len()
        );
        Ok(parsed)
    }
}

/// The Message-ID exactly as sent, unfolded and trimmed.
fn raw_message_id(message: &Message) -> Option<String> {
    message
        .header_raw(HeaderName::MessageId)
        .map(unfold)
        .filter(|id| !id.is_empty())
}

/// The From header decoded into "Name <address>" entries.
fn decoded_from(message: &Message) -> Option<String> {
    match message.from() {
        Some(address) => format_address_list(address),
        None => message
            .header_raw(HeaderName::From)
            .map(unfold)
            .filter(|from| !from.is_empty()),
    }
}

/// Formats an address list as "Name <email>" or "email", comma separated.
fn format_address_list(address: &Address) -> Option<String> {
    let parts: Vec<String> = address
        .iter()
        .map(|addr| {
            let email = addr.address().unwrap_or_default();
            match addr.name() {
                Some(name) if !name.is_empty() => format!("{} <{}>", name, email),
                _ => email.to_string(),
            }
        })
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}

fn unfold(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn build_node(message: &Message, part: &MessagePart) -> MimeNode {
    let content = match &part.body {
        PartType::Multipart(ids) => {
            let children = ids
                .iter()
                .filter_map(|id| message.part(*id))
                .map(|child| build_node(message, child))
                .collect();
            return MimeNode::Multipart { children };
        }
        PartType::Message(nested) => {
            return MimeNode::Multipart {
                children: vec![build_node(nested, nested.root_part())],
            };
        }
        // Raw bytes, not the charset-converted text.
        PartType::Text(text) | PartType::Html(text) => {
            transfer_decoded(message, part).unwrap_or_else(|| text.as_bytes().to_vec())
        }
        PartType::Binary(data) | PartType::InlineBinary(data) => data.to_vec(),
    };

    MimeNode::Leaf(AttachmentLeaf {
        content_type: content_type_of(part),
        filename: part
            .attachment_name()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty()),
        content,
    })
}

/// The part body with only the transfer encoding undone.
fn transfer_decoded(message: &Message, part: &MessagePart) -> Option<Vec<u8>> {
    let raw = message
        .raw_message
        .get(part.raw_body_offset() as usize..part.raw_end_offset() as usize)?;
    match part.encoding {
        Encoding::Base64 => base64_decode(raw),
        Encoding::QuotedPrintable => quoted_printable_decode(raw),
        Encoding::None => Some(raw.to_vec()),
    }
}

fn content_type_of(part: &MessagePart) -> String {
    part.content_type()
        .map(|ct| match ct.subtype() {
            Some(subtype) => format!("{}/{}", ct.ctype(), subtype),
            None => ct.ctype().to_string(),
        })
        .map(|ct| ct.to_ascii_lowercase())
        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string())
}
