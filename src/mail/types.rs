use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One message as reported by the index.
///
/// Cheap to clone: the data lives behind an `Arc` so that thread and message
/// windows running on different OS threads can share the same snapshot.
#[derive(Debug, Clone)]
pub struct MessageRef(Arc<MessageData>);

#[derive(Debug, Clone, Default)]
pub struct MessageData {
    pub id: String,
    /// Header values keyed by lower-cased header name
    pub headers: HashMap<String, String>,
    pub matched: bool,
    pub replies: Vec<MessageRef>,
    pub location: PathBuf,
}

impl MessageRef {
    pub fn new(data: MessageData) -> Self {
        Self(Arc::new(data))
    }

    pub fn id(&self) -> &str {
        &self.0.id
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.0
            .headers
            .get(&name.to_ascii_lowercase())
            .map(|s| s.as_str())
    }

    pub fn is_match(&self) -> bool {
        self.0.matched
    }

    pub fn replies(&self) -> &[MessageRef] {
        &self.0.replies
    }

    pub fn location(&self) -> &Path {
        &self.0.location
    }

    /// Author as shown in listings: the From header, or "(unknown)"
    pub fn from_display(&self) -> &str {
        self.header("from").unwrap_or("(unknown)")
    }
}

impl MessageData {
    pub fn new(id: impl Into<String>, location: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            location: location.into(),
            ..Self::default()
        }
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn matched(mut self, matched: bool) -> Self {
        self.matched = matched;
        self
    }

    pub fn reply(mut self, reply: MessageRef) -> Self {
        self.replies.push(reply);
        self
    }

    pub fn build(self) -> MessageRef {
        MessageRef::new(self)
    }
}

/// A thread returned by a search, snapshotted at query time.
#[derive(Debug, Clone)]
pub struct ThreadSummary {
    pub subject: Option<String>,
    pub authors: String,
    pub matched: usize,
    pub total: usize,
    pub top_level: Vec<MessageRef>,
}

impl ThreadSummary {
    pub fn top_level_messages(&self) -> &[MessageRef] {
        &self.top_level
    }

    pub fn subject_display(&self) -> &str {
        self.subject
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or("[None]")
    }
}

/// A message placed in the depth-first traversal of its thread.
#[derive(Debug, Clone)]
pub struct HierarchyNode {
    pub message: MessageRef,
    pub depth: usize,
}
