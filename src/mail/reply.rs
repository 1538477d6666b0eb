use super::mime::{RenderError, extract_reply_body, quote};
use super::store::ParsedMessage;

/// Everything needed to seed a compose window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComposeDraft {
    pub body: String,
    pub sender: String,
    pub recipients: String,
    pub subject: String,
    /// Filled with the current time when the draft is seeded if absent
    pub date: Option<String>,
    pub references: Option<String>,
    pub in_reply_to: Option<String>,
}

impl ComposeDraft {
    /// The compose buffer: headers, a blank line, then the body
    pub fn to_buffer(&self, now: impl FnOnce() -> String) -> String {
        let date = self.date.clone().unwrap_or_else(now);
        let mut buffer = format!(
            "From: {}\nTo: {}\nSubject: {}\nDate: {}\n",
            self.sender, self.recipients, self.subject, date
        );
        if let Some(references) = &self.references {
            buffer.push_str(&format!("References: {}\n", references));
        }
        if let Some(in_reply_to) = &self.in_reply_to {
            buffer.push_str(&format!("In-Reply-To: {}\n", in_reply_to));
        }
        buffer.push('\n');
        buffer.push_str(&self.body);
        buffer
    }
}

/// Build the reply to `original`, sent from `sender`.
///
/// Only the raw From header becomes the recipient; CC and address lists are
/// not expanded.
pub fn build_reply_draft(original: &ParsedMessage, sender: &str) -> Result<ComposeDraft, RenderError> {
    let body = extract_reply_body(&original.root)?
        .filter(|body| !body.is_empty())
        .map(|body| quote(&body))
        .unwrap_or_default();

    let message_id = original.header("message-id").map(|s| s.to_string());

    Ok(ComposeDraft {
        body,
        sender: sender.to_string(),
        recipients: original.header("from").unwrap_or_default().to_string(),
        subject: reply_subject(original.header("subject").unwrap_or_default()),
        date: None,
        references: message_id.clone(),
        in_reply_to: message_id,
    })
}

/// Lower-case and trim the subject, then prefix "Re: " unless it already
/// reads like a reply.
pub fn reply_subject(subject: &str) -> String {
    let subject = subject.to_lowercase();
    let subject = subject.trim();
    if ["re:", "re :", "aw:"]
        .iter()
        .any(|prefix| subject.starts_with(prefix))
    {
        subject.to_string()
    } else {
        format!("Re: {}", subject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::mime::MimeNode;

    fn message(headers: &[(&str, &str)], root: MimeNode) -> ParsedMessage {
        ParsedMessage {
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            root,
        }
    }

    #[test]
    fn test_reply_subject() {
        assert_eq!(reply_subject("Hello"), "Re: hello");
        assert_eq!(reply_subject("RE: hello"), "re: hello");
        assert_eq!(reply_subject("Aw: hi"), "aw: hi");
        assert_eq!(reply_subject("  Re : spaced  "), "re : spaced");
        assert_eq!(reply_subject(""), "Re: ");
    }

    #[test]
    fn test_reply_draft() {
        let original = message(
            &[
                ("from", "Alice <alice@example.com>, Bob <bob@example.com>"),
                ("subject", "Lunch"),
                ("message-id", "<lunch@example.com>"),
            ],
            MimeNode::text("text/plain", "Noon?\nOr later?"),
        );

        let draft = build_reply_draft(&original, "me@example.com").unwrap();
        assert_eq!(
            draft,
            ComposeDraft {
                body: "> Noon?\n> Or later?".to_string(),
                sender: "me@example.com".to_string(),
                recipients: "Alice <alice@example.com>, Bob <bob@example.com>".to_string(),
                subject: "Re: lunch".to_string(),
                date: None,
                references: Some("<lunch@example.com>".to_string()),
                in_reply_to: Some("<lunch@example.com>".to_string()),
            }
        );
    }

    #[test]
    fn test_reply_without_body_or_id() {
        let original = message(
            &[("from", "a@example.com"), ("subject", "scan")],
            MimeNode::multipart(
                "multipart/mixed",
                vec![MimeNode::binary("application/pdf", vec![1, 2, 3])],
            ),
        );

        let draft = build_reply_draft(&original, "me@example.com").unwrap();
        assert_eq!(draft.body, "");
        assert_eq!(draft.references, None);
    }

    #[test]
    fn test_buffer_layout() {
        let draft = ComposeDraft {
            body: "> hi".to_string(),
            sender: "me@example.com".to_string(),
            recipients: "a@example.com".to_string(),
            subject: "Re: hi".to_string(),
            date: None,
            references: Some("<1@x>".to_string()),
            in_reply_to: None,
        };
        assert_eq!(
            draft.to_buffer(|| "Mon, 19 Oct 2026 10:00:00 +0000".to_string()),
            "From: me@example.com\n\
             To: a@example.com\n\
             Subject: Re: hi\n\
             Date: Mon, 19 Oct 2026 10:00:00 +0000\n\
             References: <1@x>\n\
             \n\
             > hi"
        );
    }
}
