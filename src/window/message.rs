use std::path::{Path, PathBuf};

use super::{Command, ComposeWindow, Window, WindowCx, WindowError, WindowKind};
use crate::mail::mime::render_all;
use crate::mail::reply::build_reply_draft;
use crate::ui::{Address, UiEvent};

/// Headers shown above the body, in this order, when present
pub const HEADERS_TO_SHOW: [&str; 7] = ["to", "from", "subject", "date", "cc", "bcc", "message-id"];

const SEPARATOR_WIDTH: usize = 80;

/// A single message, rendered from its file.
pub struct MessageWindow {
    location: PathBuf,
}

impl MessageWindow {
    pub fn new(location: impl Into<PathBuf>) -> Self {
        Self {
            location: location.into(),
        }
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    fn reply(&mut self, cx: &WindowCx, _event: &UiEvent) -> Result<(), WindowError> {
        let original = cx.services.store.load(&self.location)?;
        let draft = build_reply_draft(&original, &cx.services.sender)?;
        tracing::debug!(subject = %draft.subject, "replying");
        cx.open(Window::Compose(ComposeWindow::from_draft(draft)))
    }
}

impl WindowKind for MessageWindow {
    const COMMANDS: &'static [Command<Self>] = &[
        Command {
            name: "Redraw",
            run: |w, cx, _| w.redraw(cx),
        },
        Command {
            name: "Reply",
            run: MessageWindow::reply,
        },
    ];

    fn title(&self) -> String {
        let file = self
            .location
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.location.display().to_string());
        format!("message/{}", file)
    }

    fn redraw(&mut self, cx: &WindowCx) -> Result<(), WindowError> {
        let message = cx.services.store.load(&self.location)?;

        let mut text = String::new();
        for name in HEADERS_TO_SHOW {
            if let Some(value) = message.header(name) {
                text.push_str(&format!("{}: {}\n", name, value));
            }
        }
        text.push_str(&"-".repeat(SEPARATOR_WIDTH));
        text.push('\n');

        if let Err(e) = render_all(&message.root, &mut text) {
            tracing::warn!(location = %self.location.display(), "cannot render body: {}", e);
            text.push_str(&format!("[ {} ]\n", e));
        }

        cx.surface.clear()?;
        cx.surface.append(&text)?;
        cx.surface.set_selection(Address::Start)?;
        cx.surface.mark_clean()?;
        Ok(())
    }
}
