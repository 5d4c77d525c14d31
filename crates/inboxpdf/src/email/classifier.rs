//! PDF detection for leaf parts.

use super::parser::AttachmentLeaf;

const PDF_CONTENT_TYPE: &str = "application/pdf";
const PDF_SIGNATURE: &[u8] = b"%PDF";

/// Filename used when a part is recognised only by its signature.
pub const DEFAULT_PDF_NAME: &str = "attachment.pdf";

/// Which check identified a part as a PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdfEvidence {
    ContentType,
    Extension,
    Signature,
}

/// A leaf part that was classified as a PDF.
#[derive(Debug, Clone, Copy)]
pub struct PdfAttachment<'a> {
    pub leaf: &'a AttachmentLeaf,
    pub evidence: PdfEvidence,
}

impl PdfAttachment<'_> {
    /// The name to save the attachment under, before sanitisation.
    pub fn name(&self) -> &str {
        self.leaf
            .filename
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_PDF_NAME)
    }

    pub fn content(&self) -> &[u8] {
        &self.leaf.content
    }
}

/// Decides whether a leaf is a PDF. Checks run in priority order and the
/// first match wins.
pub fn classify(leaf: &AttachmentLeaf) -> Option<PdfEvidence> {
    if leaf.content_type.eq_ignore_ascii_case(PDF_CONTENT_TYPE) {
        return Some(PdfEvidence::ContentType);
    }

    if leaf
        .filename
        .as_deref()
        .is_some_and(|name| name.to_ascii_lowercase().ends_with(".pdf"))
    {
        return Some(PdfEvidence::Extension);
    }

    if leaf.content.starts_with(PDF_SIGNATURE) {
        return Some(PdfEvidence::Signature);
    }

    None
}

/// PDF attachments among `leaves`, in order. Empty payloads are skipped.
pub fn pdf_attachments<'a>(leaves: &[&'a AttachmentLeaf]) -> Vec<PdfAttachment<'a>> {
    leaves
        .iter()
        .copied()
        .filter(|leaf| !leaf.content.is_empty())
        .filter_map(|leaf| {
            classify(leaf).map(|evidence| PdfAttachment { leaf, evidence })
        })
        .collect()
}
