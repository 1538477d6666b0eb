use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Command;

use serde::Deserialize;

use super::hierarchy::build_hierarchy;
use super::types::{MessageData, MessageRef, ThreadSummary};

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
    #[error("unexpected index output: {0}")]
    Json(#[from] serde_json::Error),
}

pub trait MailIndex: Send + Sync {
    fn search(&self, query: &str) -> Result<Vec<ThreadSummary>, IndexError>;
}

/// Mail index backed by the notmuch command line tool.
#[derive(Debug, Clone)]
pub struct NotmuchIndex {
    program: String,
}

impl NotmuchIndex {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for NotmuchIndex {
    fn default() -> Self {
        Self::new("notmuch")
    }
}

impl MailIndex for NotmuchIndex {
    fn search(&self, query: &str) -> Result<Vec<ThreadSummary>, IndexError> {
        tracing::debug!(query, "running notmuch show");

        let output = Command::new(&self.program)
            .args([
                "show",
                "--format=json",
                "--body=false",
                "--entire-thread=true",
                query,
            ])
            .output()
            .map_err(|source| IndexError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(IndexError::Failed {
                program: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let threads = parse_show_output(&output.stdout)?;
        tracing::info!(query, threads = threads.len(), "search finished");
        Ok(threads)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Filenames {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Deserialize)]
struct NotmuchMessage {
    id: String,
    #[serde(rename = "match", default)]
    matched: bool,
    filename: Filenames,
    #[serde(default)]
    headers: HashMap<String, Option<String>>,
}

/// `[message or null, [replies...]]`
#[derive(Debug, Deserialize)]
struct NotmuchNode(Option<NotmuchMessage>, Vec<NotmuchNode>);

/// Turn `notmuch show --format=json` output into thread summaries
pub fn parse_show_output(json: &[u8]) -> Result<Vec<ThreadSummary>, IndexError> {
    let threads: Vec<Vec<NotmuchNode>> = serde_json::from_slice(json)?;
    Ok(threads
        .into_iter()
        .map(|nodes| summarize(convert_nodes(nodes)))
        .collect())
}

fn convert_nodes(nodes: Vec<NotmuchNode>) -> Vec<MessageRef> {
    let mut messages = Vec::new();
    for NotmuchNode(message, replies) in nodes {
        let replies = convert_nodes(replies);
        match message {
            Some(message) => messages.push(convert_message(message, replies)),
            // Excluded message: its replies take its place
            None => messages.extend(replies),
        }
    }
    messages
}

fn convert_message(message: NotmuchMessage, replies: Vec<MessageRef>) -> MessageRef {
    let location = match message.filename {
        Filenames::One(name) => PathBuf::from(name),
        Filenames::Many(names) => names.into_iter().next().map(PathBuf::from).unwrap_or_default(),
    };

    let mut data = MessageData::new(message.id.clone(), location).matched(message.matched);
    for (name, value) in message.headers {
        if let Some(value) = value {
            data = data.header(&name, value);
        }
    }
    data = data.header("message-id", format!("<{}>", message.id));
    data.replies = replies;
    data.build()
}

/// Derive the summary fields from the thread itself
fn summarize(top_level: Vec<MessageRef>) -> ThreadSummary {
    let nodes = build_hierarchy(&top_level);

    let total = nodes.len();
    let matched = nodes.iter().filter(|n| n.message.is_match()).count();

    let subject = nodes
        .iter()
        .find(|n| n.message.is_match())
        .or_else(|| nodes.first())
        .and_then(|n| n.message.header("subject"))
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string());

    let mut matched_authors: Vec<&str> = Vec::new();
    let mut other_authors: Vec<&str> = Vec::new();
    for node in &nodes {
        let author = author_name(node.message.from_display());
        let bucket = if node.message.is_match() {
            &mut matched_authors
        } else {
            &mut other_authors
        };
        if !bucket.contains(&author) {
            bucket.push(author);
        }
    }
    other_authors.retain(|a| !matched_authors.contains(a));

    let authors = match (matched_authors.is_empty(), other_authors.is_empty()) {
        (_, true) => matched_authors.join(", "),
        (true, false) => other_authors.join(", "),
        (false, false) => format!("{}| {}", matched_authors.join(", "), other_authors.join(", ")),
    };

    ThreadSummary {
        subject,
        authors,
        matched,
        total,
        top_level,
    }
}

/// "Alice Example <alice@example.com>" -> "Alice Example"
fn author_name(from: &str) -> &str {
    match from.find('<') {
        Some(start) if start > 0 => from[..start].trim().trim_matches('"').trim(),
        _ => from.trim().trim_start_matches('<').trim_end_matches('>'),
    }
}
