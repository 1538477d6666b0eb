//! The window service contract: surfaces that hold text, and the events users
//! raise on them.

mod buffer;
mod help;
pub mod memory;
mod reader;
pub mod terminal;

pub use buffer::TextBuffer;
pub use memory::{MemoryService, SurfaceProbe};
pub use terminal::TerminalService;

#[derive(Debug, thiserror::Error)]
pub enum UiError {
    #[error("surface is closed")]
    Closed,
    #[error("terminal error: {0}")]
    Io(#[from] std::io::Error),
}

/// Which region of a window an event came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Tag,
    Body,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Run the named action in `text`
    Execute(Origin),
    /// Look at (open) whatever `text` names
    Look(Origin),
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiEvent {
    pub kind: EventKind,
    pub flag: u32,
    /// Character offsets of the event's text in its region
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl UiEvent {
    pub fn execute(origin: Origin, command: &str) -> Self {
        Self {
            kind: EventKind::Execute(origin),
            flag: 0,
            start: 0,
            end: command.chars().count(),
            text: command.to_string(),
        }
    }

    pub fn look(origin: Origin, start: usize, end: usize, text: &str) -> Self {
        Self {
            kind: EventKind::Look(origin),
            flag: 0,
            start,
            end,
            text: text.to_string(),
        }
    }

    /// The command word of an execute event
    pub fn command(&self) -> &str {
        self.text.split_whitespace().next().unwrap_or("")
    }
}

/// Where to put a surface's selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Address {
    Start,
    /// A whole 1-based line
    Line(usize),
}

/// One window's visual surface, owned by a window service.
pub trait Surface: Send + Sync {
    fn set_name(&self, name: &str) -> Result<(), UiError>;
    fn set_tag(&self, tag: &str) -> Result<(), UiError>;
    /// Address everything, then write nothing
    fn clear(&self) -> Result<(), UiError>;
    fn append(&self, text: &str) -> Result<(), UiError>;
    fn set_selection(&self, address: Address) -> Result<(), UiError>;
    /// Line number and text of the body line holding `offset`
    fn line_at(&self, offset: usize) -> Result<(usize, String), UiError>;
    fn body(&self) -> Result<String, UiError>;
    fn report(&self, diagnostic: &str) -> Result<(), UiError>;
    fn mark_clean(&self) -> Result<(), UiError>;
    /// Blocks until the next event; None once the surface is closed
    fn next_event(&self) -> Option<UiEvent>;
    /// Hand an event back to the service for default handling
    fn write_back(&self, event: UiEvent) -> Result<(), UiError>;
    fn destroy(&self);
}

pub trait WindowService: Send + Sync {
    fn create_surface(&self) -> Result<Box<dyn Surface>, UiError>;
}
