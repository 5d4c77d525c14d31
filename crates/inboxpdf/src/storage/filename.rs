//! Turning attachment names and subjects into safe file names.

use std::sync::LazyLock;

use regex::Regex;

use crate::email::classifier::DEFAULT_PDF_NAME;

/// Longest file name produced, in characters.
pub const MAX_FILENAME_CHARS: usize = 150;

/// Longest file name produced, in UTF-8 bytes. Leaves room under the usual
/// 255-byte limit for a `(n)` collision suffix.
pub const MAX_FILENAME_BYTES: usize = 240;

/// Longest subject fragment appended to a file name, in characters.
pub const SUBJECT_FRAGMENT_CHARS: usize = 60;

static RE_HAZARD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"[\\/*?:"<>|]"#).unwrap());
static RE_WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Replaces path-hazard characters with `_`, collapses whitespace, and caps
/// the length at `max_chars` characters and [`MAX_FILENAME_BYTES`] bytes
/// while keeping the extension. May return an empty string.
pub fn sanitize_filename(name: &str, max_chars: usize) -> String {
    let name = RE_HAZARD.replace_all(name, "_");
    let name = RE_WHITESPACE.replace_all(&name, " ");
    let name = name.trim();

    if name.chars().count() <= max_chars && name.len() <= MAX_FILENAME_BYTES {
        return name.to_string();
    }

    // An extension that cannot fit is cut with the rest of the name.
    let (stem, ext) = match split_extension(name) {
        (_, ext) if ext.chars().count() >= max_chars || ext.len() >= MAX_FILENAME_BYTES => {
            (name, "")
        }
        split => split,
    };

    let keep_chars = max_chars - ext.chars().count();
    let keep_bytes = MAX_FILENAME_BYTES - ext.len();
    let mut kept = String::with_capacity(keep_bytes);
    for c in stem.chars().take(keep_chars) {
        if kept.len() + c.len_utf8() > keep_bytes {
            break;
        }
        kept.push(c);
    }
    format!("{}{}", kept, ext)
}

/// Splits `name` into stem and extension (with its dot). Leading dots are
/// part of the stem, so `.hidden` has no extension.
pub fn split_extension(name: &str) -> (&str, &str) {
    let leading_dots = name.len() - name.trim_start_matches('.').len();
    match name[leading_dots..].rfind('.') {
        Some(pos) => name.split_at(leading_dots + pos),
        None => (name, ""),
    }
}

/// The file name an attachment is saved under.
///
/// The sanitised subject, cut to [`SUBJECT_FRAGMENT_CHARS`], is appended to
/// the attachment name unless the name already contains it.
pub fn target_filename(attachment_name: &str, subject: Option<&str>) -> String {
    let mut name = sanitize_filename(attachment_name, MAX_FILENAME_CHARS);
    if name.is_empty() {
        name = DEFAULT_PDF_NAME.to_string();
    }

    let fragment: String = sanitize_filename(subject.unwrap_or_default(), MAX_FILENAME_CHARS)
        .chars()
        .take(SUBJECT_FRAGMENT_CHARS)
        .collect();
    let fragment = fragment.trim();

    if fragment.is_empty() || name.contains(fragment) {
        return name;
    }

    let combined = match split_extension(&name) {
        (stem, ext) if !ext.is_empty() => format!("{} - {}{}", stem, fragment, ext),
        _ => format!("{} - {}.pdf", name, fragment),
    };
    sanitize_filename(&combined, MAX_FILENAME_CHARS)
}
