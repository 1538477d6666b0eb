use std::path::{Path, PathBuf};

use mail_parser::{MessageParser, MimeHeaders, PartType};

use super::mime::{MAX_MIME_DEPTH, MimeNode};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0} is not a parseable message")]
    Unparseable(PathBuf),
}

/// A message loaded from disk: its top-level headers and its body tree.
#[derive(Debug, Clone)]
pub struct ParsedMessage {
    /// (lower-cased name, unfolded value), in file order
    pub headers: Vec<(String, String)>,
    pub root: MimeNode,
}

impl ParsedMessage {
    /// First value of a header, case-insensitive
    pub fn header(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.headers
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }
}

pub trait MessageStore: Send + Sync {
    fn load(&self, location: &Path) -> Result<ParsedMessage, StoreError>;
}

/// Reads message files straight from the maildir.
#[derive(Debug, Default, Clone)]
pub struct FileStore;

impl MessageStore for FileStore {
    fn load(&self, location: &Path) -> Result<ParsedMessage, StoreError> {
        let raw = std::fs::read(location).map_err(|source| StoreError::Io {
            path: location.to_path_buf(),
            source,
        })?;
        parse_message(&raw, location)
    }
}

/// Parse raw message bytes; `location` is only used for error messages
pub fn parse_message(raw: &[u8], location: &Path) -> Result<ParsedMessage, StoreError> {
    let message = MessageParser::default()
        .parse(raw)
        .ok_or_else(|| StoreError::Unparseable(location.to_path_buf()))?;

    let mut headers = read_header_block(raw);
    if let Some(subject) = message.subject() {
        match headers.iter_mut().find(|(key, _)| key.as_str() == "subject") {
            Some((_, value)) => *value = subject.to_string(),
            None => headers.push(("subject".to_string(), subject.to_string())),
        }
    }

    if message.parts.is_empty() {
        return Err(StoreError::Unparseable(location.to_path_buf()));
    }
    let root = convert_part(&message, 0, 0);

    Ok(ParsedMessage { headers, root })
}

/// Collect the top-level header block, unfolding continuation lines
fn read_header_block(raw: &[u8]) -> Vec<(String, String)> {
    let text = String::from_utf8_lossy(raw);
    let mut headers: Vec<(String, String)> = Vec::new();
    let mut current: Option<(String, String)> = None;

    for line in text.lines() {
        let line = line.trim_end_matches('\r');

        // Empty line marks end of headers
        if line.is_empty() {
            break;
        }

        if line.starts_with(' ') || line.starts_with('\t') {
            if let Some((_, value)) = current.as_mut() {
                value.push(' ');
                value.push_str(line.trim());
            }
            continue;
        }

        if let Some(header) = current.take() {
            push_header(&mut headers, header);
        }
        if let Some((name, value)) = line.split_once(':') {
            current = Some((name.trim().to_ascii_lowercase(), value.trim().to_string()));
        }
    }

    if let Some(header) = current.take() {
        push_header(&mut headers, header);
    }

    headers
}

fn push_header(headers: &mut Vec<(String, String)>, header: (String, String)) {
    if !headers.iter().any(|(key, _)| *key == header.0) {
        headers.push(header);
    }
}

/// Convert one mail-parser part (and its children) into a MimeNode.
/// Parts past the nesting limit are kept as empty leaves, so the walkers
/// still reach that depth and report it.
fn convert_part(message: &mail_parser::Message, part_id: usize, depth: usize) -> MimeNode {
    let Some(part) = message.parts.get(part_id) else {
        return MimeNode::binary("application/octet-stream", Vec::new());
    };

    let content_type = part
        .content_type()
        .map(|ct| {
            format!(
                "{}/{}",
                ct.ctype(),
                ct.subtype().unwrap_or(match ct.ctype() {
                    "multipart" => "mixed",
                    "text" => "plain",
                    _ => "octet-stream",
                })
            )
        })
        .unwrap_or_else(|| {
            match &part.body {
                PartType::Text(_) => "text/plain",
                PartType::Html(_) => "text/html",
                PartType::Multipart(_) => "multipart/mixed",
                PartType::Message(_) => "message/rfc822",
                PartType::Binary(_) | PartType::InlineBinary(_) => "application/octet-stream",
            }
            .to_string()
        });

    if depth >= MAX_MIME_DEPTH {
        return MimeNode::binary(&content_type, Vec::new());
    }

    let mut node = match &part.body {
        PartType::Text(text) | PartType::Html(text) => MimeNode::text(&content_type, text.to_string()),
        PartType::Binary(data) | PartType::InlineBinary(data) => {
            MimeNode::binary(&content_type, data.to_vec())
        }
        PartType::Message(nested) => MimeNode::binary(&content_type, nested.raw_message().to_vec()),
        PartType::Multipart(children) => {
            let parts = children
                .iter()
                .map(|&child| convert_part(message, child as usize, depth + 1))
                .collect();
            MimeNode::multipart(&content_type, parts)
        }
    };

    if let Some(disposition) = part.content_disposition() {
        node = node.with_disposition(disposition.ctype(), part.attachment_name());
    } else if let Some(name) = part.attachment_name() {
        node.filename = Some(name.to_string());
    }

    node
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::mime::{MimePayload, render_all};
    use std::io::Write;

    const ALTERNATIVE: &[u8] = b"From: Alice <alice@example.com>\r\n\
To: bob@example.com\r\n\
Subject: Lunch\r\n\
\x20plans\r\n\
Message-Id: <lunch@example.com>\r\n\
MIME-Version: 1.0\r\n\
Content-Type: multipart/alternative; boundary=\"b1\"\r\n\
\r\n\
--b1\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
\r\n\
Noon?\r\n\
--b1\r\n\
Content-Type: text/html; charset=utf-8\r\n\
\r\n\
<p>Noon?</p>\r\n\
--b1--\r\n";

    #[test]
    fn test_headers_are_unfolded_and_lowercased() {
        let parsed = parse_message(ALTERNATIVE, Path::new("lunch")).unwrap();
        assert_eq!(parsed.header("From"), Some("Alice <alice@example.com>"));
        assert_eq!(parsed.header("subject"), Some("Lunch plans"));
        assert_eq!(parsed.header("message-id"), Some("<lunch@example.com>"));
        assert_eq!(parsed.header("cc"), None);
    }

    #[test]
    fn test_multipart_tree() {
        let parsed = parse_message(ALTERNATIVE, Path::new("lunch")).unwrap();
        assert_eq!(parsed.root.content_type, "multipart/alternative");
        let kinds: Vec<&str> = parsed
            .root
            .parts()
            .iter()
            .map(|p| p.content_type.as_str())
            .collect();
        assert_eq!(kinds, vec!["text/plain", "text/html"]);

        let mut out = String::new();
        render_all(&parsed.root, &mut out).unwrap();
        assert!(out.contains("Noon?"));
        assert!(!out.contains("<p>"));
    }

    #[test]
    fn test_attachment_metadata() {
        let raw = b"From: a@example.com\r\n\
Subject: report\r\n\
Content-Type: multipart/mixed; boundary=\"m\"\r\n\
\r\n\
--m\r\n\
Content-Type: text/plain\r\n\
\r\n\
attached\r\n\
--m\r\n\
Content-Type: application/pdf\r\n\
Content-Disposition: attachment; filename=\"q3.pdf\"\r\n\
Content-Transfer-Encoding: base64\r\n\
\r\n\
JVBERi0xLjQK\r\n\
--m--\r\n";
        let parsed = parse_message(raw, Path::new("report")).unwrap();
        let pdf = &parsed.root.parts()[1];
        assert_eq!(pdf.content_type, "application/pdf");
        assert_eq!(pdf.disposition.as_deref(), Some("attachment"));
        assert_eq!(pdf.filename.as_deref(), Some("q3.pdf"));
        assert!(matches!(pdf.payload, MimePayload::Binary(_)));
    }

    #[test]
    fn test_single_part_defaults_to_text() {
        let raw = b"From: a@example.com\r\nSubject: hi\r\n\r\nhello there\r\n";
        let parsed = parse_message(raw, Path::new("hi")).unwrap();
        assert_eq!(parsed.root.content_type, "text/plain");
        assert!(!parsed.root.is_multipart());
    }

    #[test]
    fn test_file_store_reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(ALTERNATIVE).unwrap();
        file.flush().unwrap();

        let parsed = FileStore.load(file.path()).unwrap();
        assert_eq!(parsed.header("to"), Some("bob@example.com"));
    }

    /// `levels` multipart/mixed wrappers around a single text part
    fn nested_message(levels: usize) -> Vec<u8> {
        let mut raw = String::from("From: a@example.com\r\nSubject: deep\r\nMIME-Version: 1.0\r\n");
        for level in 0..levels {
            raw.push_str(&format!(
                "Content-Type: multipart/mixed; boundary=\"b{level}\"\r\n\r\n--b{level}\r\n"
            ));
        }
        raw.push_str("Content-Type: text/plain\r\n\r\nbottom\r\n");
        for level in (0..levels).rev() {
            raw.push_str(&format!("--b{level}--\r\n"));
        }
        raw.into_bytes()
    }

    #[test]
    fn test_deep_nesting_still_parses() {
        let parsed = parse_message(&nested_message(70), Path::new("deep")).unwrap();
        assert_eq!(parsed.header("subject"), Some("deep"));

        let mut out = String::new();
        assert!(matches!(
            render_all(&parsed.root, &mut out),
            Err(crate::mail::mime::RenderError::TooDeep(MAX_MIME_DEPTH))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = FileStore
            .load(Path::new("/nonexistent/mailwin/message"))
            .unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }
}
