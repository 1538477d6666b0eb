use crate::mail::types::{HierarchyNode, ThreadSummary};

/// Width of the message number column in thread windows
pub const MESSAGE_INDEX_WIDTH: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot size an index column for zero items")]
pub struct DegenerateInput;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("line has no item number: {0:?}")]
    NoNumber(String),
    #[error("item {index} is not listed ({len} items shown)")]
    OutOfRange { index: usize, len: usize },
}

/// Decimal digits needed to print `n`
pub fn digit_count(n: usize) -> Result<usize, DegenerateInput> {
    match n {
        0 => Err(DegenerateInput),
        n => Ok(n.ilog10() as usize + 1),
    }
}

/// One line per thread: number, match counts, authors and subject
pub fn thread_lines(threads: &[ThreadSummary]) -> Result<Vec<String>, DegenerateInput> {
    let width = digit_count(threads.len())?;
    Ok(threads
        .iter()
        .enumerate()
        .map(|(i, thread)| {
            format!(
                "{:>width$}  [{}/{}]  {}; {}",
                i + 1,
                thread.matched,
                thread.total,
                thread.authors,
                thread.subject_display(),
                width = width
            )
        })
        .collect())
}

/// Formats message lines, showing a subject only when it changes.
///
/// The decision depends on the previous line emitted, so one lister must see
/// a whole render pass in order.
#[derive(Debug, Default)]
pub struct GroupedLister {
    /// `None` until the first line; then the last line's group key
    last_group: Option<Option<String>>,
    count: usize,
}

impl GroupedLister {
    pub fn line(&mut self, depth: usize, label: &str, group: Option<&str>) -> String {
        self.count += 1;
        let mut line = format!(
            "{:>width$} {} {}",
            self.count,
            "| ".repeat(depth),
            label,
            width = MESSAGE_INDEX_WIDTH
        );

        let changed = self
            .last_group
            .as_ref()
            .is_none_or(|last| last.as_deref() != group);
        if changed {
            if let Some(group) = group {
                line.push(' ');
                line.push_str(group);
            }
            self.last_group = Some(group.map(|g| g.to_string()));
        }
        line
    }
}

/// Lines for messages in hierarchy order, grouped by subject
pub fn message_lines(nodes: &[HierarchyNode]) -> Vec<String> {
    let mut lister = GroupedLister::default();
    nodes
        .iter()
        .map(|node| {
            lister.line(
                node.depth,
                node.message.from_display(),
                node.message.header("subject"),
            )
        })
        .collect()
}

/// The first run of ASCII digits in a line, as a number
pub fn leading_number(line: &str) -> Result<usize, LookupError> {
    let start = line
        .find(|c: char| c.is_ascii_digit())
        .ok_or_else(|| LookupError::NoNumber(line.to_string()))?;
    let digits: String = line[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits
        .parse()
        .map_err(|_| LookupError::NoNumber(line.to_string()))
}

/// Resolve a 1-based number shown to the user to an item
pub fn resolve<T>(items: &[T], number: usize) -> Result<&T, LookupError> {
    number
        .checked_sub(1)
        .and_then(|index| items.get(index))
        .ok_or(LookupError::OutOfRange {
            index: number,
            len: items.len(),
        })
}
