use std::borrow::Cow;
use std::fmt::Write;

/// Deepest nesting either walk will follow before giving up.
pub const MAX_MIME_DEPTH: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("MIME tree nested deeper than {0} levels")]
    TooDeep(usize),
    #[error("failed to write rendered text")]
    Sink(#[from] std::fmt::Error),
}

#[derive(Debug, Clone)]
pub enum MimePayload {
    Text(String),
    Binary(Vec<u8>),
    Parts(Vec<MimeNode>),
}

/// A node of a parsed message body.
#[derive(Debug, Clone)]
pub struct MimeNode {
    /// Lower-cased `type/subtype`
    pub content_type: String,
    pub disposition: Option<String>,
    pub filename: Option<String>,
    pub payload: MimePayload,
}

/// How the walkers see a node.
enum Variant<'a> {
    Text(Cow<'a, str>),
    Alternative(&'a [MimeNode]),
    Mixed(&'a [MimeNode]),
    Other,
}

impl MimeNode {
    pub fn text(content_type: &str, body: impl Into<String>) -> Self {
        Self {
            content_type: content_type.to_ascii_lowercase(),
            disposition: None,
            filename: None,
            payload: MimePayload::Text(body.into()),
        }
    }

    pub fn binary(content_type: &str, data: Vec<u8>) -> Self {
        Self {
            content_type: content_type.to_ascii_lowercase(),
            disposition: None,
            filename: None,
            payload: MimePayload::Binary(data),
        }
    }

    pub fn multipart(content_type: &str, parts: Vec<MimeNode>) -> Self {
        Self {
            content_type: content_type.to_ascii_lowercase(),
            disposition: None,
            filename: None,
            payload: MimePayload::Parts(parts),
        }
    }

    pub fn with_disposition(mut self, disposition: &str, filename: Option<&str>) -> Self {
        self.disposition = Some(disposition.to_string());
        self.filename = filename.map(|s| s.to_string());
        self
    }

    pub fn main_type(&self) -> &str {
        self.content_type
            .split_once('/')
            .map(|(main, _)| main)
            .unwrap_or(&self.content_type)
    }

    pub fn is_multipart(&self) -> bool {
        matches!(self.payload, MimePayload::Parts(_))
    }

    pub fn parts(&self) -> &[MimeNode] {
        match &self.payload {
            MimePayload::Parts(parts) => parts,
            _ => &[],
        }
    }

    /// Decoded text of a leaf; binary leaves are read as lossy UTF-8
    pub fn decoded_text(&self) -> Option<String> {
        match &self.payload {
            MimePayload::Text(text) => Some(text.clone()),
            MimePayload::Binary(data) => Some(String::from_utf8_lossy(data).into_owned()),
            MimePayload::Parts(_) => None,
        }
    }

    fn variant(&self) -> Variant<'_> {
        match (&self.payload, self.content_type.as_str()) {
            (MimePayload::Parts(parts), "multipart/alternative") => Variant::Alternative(parts),
            (MimePayload::Parts(parts), "multipart/mixed") => Variant::Mixed(parts),
            (MimePayload::Text(text), _) if self.main_type() == "text" => {
                Variant::Text(Cow::Borrowed(text))
            }
            (MimePayload::Binary(data), _) if self.main_type() == "text" => {
                Variant::Text(String::from_utf8_lossy(data))
            }
            _ => Variant::Other,
        }
    }

    /// One-line stand-in for a part that is not shown inline
    pub fn placeholder(&self) -> String {
        let mut fields = vec![self.content_type.as_str()];
        if let Some(disposition) = &self.disposition {
            fields.push(disposition);
        }
        match &self.filename {
            Some(name) => format!("[ {} filename=\"{}\" ]", fields.join(" "), name),
            None => format!("[ {} ]", fields.join(" ")),
        }
    }
}

/// Render every displayable leaf of `node` into `out`, in document order.
///
/// Text leaves are written as-is, `multipart/alternative` shows only its first
/// alternative that rendered something, `multipart/mixed` shows all parts, and
/// anything else becomes a placeholder line. Returns whether the node was
/// handled.
pub fn render_all<W: Write>(node: &MimeNode, out: &mut W) -> Result<bool, RenderError> {
    render_node(node, out, 0)
}

fn render_node<W: Write>(node: &MimeNode, out: &mut W, depth: usize) -> Result<bool, RenderError> {
    if depth >= MAX_MIME_DEPTH {
        return Err(RenderError::TooDeep(MAX_MIME_DEPTH));
    }

    match node.variant() {
        Variant::Text(text) => {
            writeln!(out, "{}", text)?;
            Ok(true)
        }
        Variant::Alternative(parts) => {
            for part in parts {
                if render_node(part, out, depth + 1)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Variant::Mixed(parts) => {
            let mut handled = false;
            for part in parts {
                handled |= render_node(part, out, depth + 1)?;
            }
            Ok(handled)
        }
        Variant::Other => {
            writeln!(out, "{}", node.placeholder())?;
            Ok(true)
        }
    }
}

/// Find the body to quote in a reply: the first non-empty `text/plain` part,
/// falling back to `text/html` verbatim.
pub fn extract_reply_body(node: &MimeNode) -> Result<Option<String>, RenderError> {
    extract_node(node, 0)
}

fn extract_node(node: &MimeNode, depth: usize) -> Result<Option<String>, RenderError> {
    if depth >= MAX_MIME_DEPTH {
        return Err(RenderError::TooDeep(MAX_MIME_DEPTH));
    }

    if node.is_multipart() {
        for part in node.parts() {
            if let Some(body) = extract_node(part, depth + 1)?
                && !body.is_empty()
            {
                return Ok(Some(body));
            }
        }
        return Ok(None);
    }

    match node.content_type.as_str() {
        "text/plain" | "text/html" => Ok(node.decoded_text()),
        _ => Ok(None),
    }
}

/// Prefix every line with "> "
pub fn quote(body: &str) -> String {
    body.split('\n')
        .map(|line| format!("> {}", line))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(node: &MimeNode) -> String {
        let mut out = String::new();
        render_all(node, &mut out).unwrap();
        out
    }

    #[test]
    fn test_alternative_renders_first_handled_only() {
        let node = MimeNode::multipart(
            "multipart/alternative",
            vec![
                MimeNode::text("text/plain", "A"),
                MimeNode::text("text/html", "B"),
            ],
        );
        assert_eq!(render(&node), "A\n");
    }

    #[test]
    fn test_alternative_skips_unhandled_children() {
        // An empty mixed part handles nothing, so the next alternative wins
        let node = MimeNode::multipart(
            "multipart/alternative",
            vec![
                MimeNode::multipart("multipart/mixed", vec![]),
                MimeNode::text("text/html", "<p>B</p>"),
            ],
        );
        assert_eq!(render(&node), "<p>B</p>\n");
    }

    #[test]
    fn test_mixed_renders_every_part() {
        let node = MimeNode::multipart(
            "multipart/mixed",
            vec![
                MimeNode::text("text/plain", "A"),
                MimeNode::text("text/plain", "B"),
            ],
        );
        assert_eq!(render(&node), "A\nB\n");
    }

    #[test]
    fn test_other_parts_get_placeholder() {
        let node = MimeNode::multipart(
            "multipart/mixed",
            vec![
                MimeNode::text("text/plain", "see attached"),
                MimeNode::binary("application/pdf", b"%PDF".to_vec())
                    .with_disposition("attachment", Some("report.pdf")),
                MimeNode::binary("image/png", vec![0x89]),
            ],
        );
        assert_eq!(
            render(&node),
            "see attached\n\
             [ application/pdf attachment filename=\"report.pdf\" ]\n\
             [ image/png ]\n"
        );
    }

    #[test]
    fn test_text_leaf_with_raw_payload_is_shown() {
        let node = MimeNode::multipart(
            "multipart/mixed",
            vec![
                MimeNode::binary("text/calendar", b"BEGIN:VCALENDAR".to_vec()),
                MimeNode::binary("text/plain", b"caf\xc3\xa9".to_vec()),
            ],
        );
        assert_eq!(render(&node), "BEGIN:VCALENDAR\ncaf\u{e9}\n");
    }

    #[test]
    fn test_unknown_multipart_is_opaque() {
        let node = MimeNode::multipart(
            "multipart/related",
            vec![MimeNode::text("text/html", "<p>hi</p>")],
        );
        assert_eq!(render(&node), "[ multipart/related ]\n");
    }

    #[test]
    fn test_too_deep_is_an_error() {
        let mut node = MimeNode::text("text/plain", "bottom");
        for _ in 0..MAX_MIME_DEPTH {
            node = MimeNode::multipart("multipart/mixed", vec![node]);
        }
        let mut out = String::new();
        assert!(matches!(
            render_all(&node, &mut out),
            Err(RenderError::TooDeep(MAX_MIME_DEPTH))
        ));
        assert!(matches!(
            extract_reply_body(&node),
            Err(RenderError::TooDeep(_))
        ));
    }

    #[test]
    fn test_extract_prefers_first_plain_part() {
        let node = MimeNode::multipart(
            "multipart/mixed",
            vec![
                MimeNode::multipart(
                    "multipart/alternative",
                    vec![
                        MimeNode::text("text/plain", "plain body"),
                        MimeNode::text("text/html", "<b>html body</b>"),
                    ],
                ),
                MimeNode::text("text/plain", "footer"),
            ],
        );
        assert_eq!(
            extract_reply_body(&node).unwrap().as_deref(),
            Some("plain body")
        );
    }

    #[test]
    fn test_extract_falls_back_to_html() {
        let node = MimeNode::multipart(
            "multipart/alternative",
            vec![
                MimeNode::text("text/plain", ""),
                MimeNode::text("text/html", "<p>only html</p>"),
            ],
        );
        assert_eq!(
            extract_reply_body(&node).unwrap().as_deref(),
            Some("<p>only html</p>")
        );
    }

    #[test]
    fn test_extract_nothing_from_attachment_only() {
        let node = MimeNode::multipart(
            "multipart/mixed",
            vec![MimeNode::binary("application/pdf", b"%PDF-1.4".to_vec())],
        );
        assert_eq!(extract_reply_body(&node).unwrap(), None);
    }

    #[test]
    fn test_quote() {
        assert_eq!(quote("hello"), "> hello");
        assert_eq!(quote("a\nb"), "> a\n> b");
    }
}
