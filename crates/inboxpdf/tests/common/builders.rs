//! Builders for raw RFC 822 test messages.

#![allow(dead_code)]

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

/// A minimal valid PDF payload.
pub const PDF_BYTES: &[u8] = b"%PDF-1.4\n1 0 obj << /Type /Catalog >> endobj\ntrailer << /Root 1 0 R >>\n%%EOF\n";

pub const SENDER: &str = "billing@vendor.example";

struct Attachment {
    content_type: String,
    filename: Option<String>,
    content: Vec<u8>,
}

/// Builds a raw message. Attachments are base64 encoded inside a
/// `multipart/mixed` body; without attachments the message is a single
/// text part.
pub struct MessageBuilder {
    message_id: Option<String>,
    from: String,
    subject: Option<String>,
    text: String,
    attachments: Vec<Attachment>,
}

impl MessageBuilder {
    pub fn new() -> Self {
        Self {
            message_id: None,
            from: SENDER.to_string(),
            subject: None,
            text: "Please find the document attached.".to_string(),
            attachments: Vec::new(),
        }
    }

    pub fn message_id(mut self, id: &str) -> Self {
        self.message_id = Some(id.to_string());
        self
    }

    pub fn from(mut self, from: &str) -> Self {
        self.from = from.to_string();
        self
    }

    pub fn subject(mut self, subject: &str) -> Self {
        self.subject = Some(subject.to_string());
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn attachment(mut self, content_type: &str, filename: Option<&str>, content: &[u8]) -> Self {
        self.attachments.push(Attachment {
            content_type: content_type.to_string(),
            filename: filename.map(str::to_string),
            content: content.to_vec(),
        });
        self
    }

    pub fn pdf(self, filename: &str) -> Self {
        self.attachment("application/pdf", Some(filename), PDF_BYTES)
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = String::new();
        if let Some(id) = &self.message_id {
            out.push_str(&format!("Message-ID: {}\r\n", id));
        }
        out.push_str(&format!("From: {}\r\n", self.from));
        out.push_str("To: me@example.com\r\n");
        if let Some(subject) = &self.subject {
            out.push_str(&format!("Subject: {}\r\n", subject));
        }
        out.push_str("Date: Mon, 3 Mar 2025 09:15:00 +0700\r\n");
        out.push_str("MIME-Version: 1.0\r\n");

        if self.attachments.is_empty() {
            out.push_str("Content-Type: text/plain; charset=utf-8\r\n\r\n");
            out.push_str(&self.text);
            out.push_str("\r\n");
            return out.into_bytes();
        }

        let boundary = "----=_inboxpdf_test_boundary";
        out.push_str(&format!(
            "Content-Type: multipart/mixed; boundary=\"{}\"\r\n\r\n",
            boundary
        ));
        out.push_str(&format!("--{}\r\n", boundary));
        out.push_str("Content-Type: text/plain; charset=utf-8\r\n\r\n");
        out.push_str(&self.text);
        out.push_str("\r\n");

        for attachment in &self.attachments {
            out.push_str(&format!("--{}\r\n", boundary));
            match &attachment.filename {
                Some(name) => {
                    out.push_str(&format!(
                        "Content-Type: {}; name=\"{}\"\r\n",
                        attachment.content_type, name
                    ));
                    out.push_str(&format!(
                        "Content-Disposition: attachment; filename=\"{}\"\r\n",
                        name
                    ));
                }
                None => {
                    out.push_str(&format!("Content-Type: {}\r\n", attachment.content_type));
                    out.push_str("Content-Disposition: attachment\r\n");
                }
            }
            out.push_str("Content-Transfer-Encoding: base64\r\n\r\n");
            let encoded = BASE64.encode(&attachment.content);
            for chunk in encoded.as_bytes().chunks(76) {
                out.push_str(std::str::from_utf8(chunk).unwrap());
                out.push_str("\r\n");
            }
        }
        out.push_str(&format!("--{}--\r\n", boundary));
        out.into_bytes()
    }
}

impl Default for MessageBuilder {
    fn default() -> Self {
        Self::new()
    }
}
