use super::{Command, WindowCx, WindowError, WindowKind};
use crate::mail::reply::ComposeDraft;
use crate::ui::{Address, UiEvent};

/// A message being written. The surface body is the message.
pub struct ComposeWindow {
    subject: String,
    seed: String,
    seeded: bool,
}

impl ComposeWindow {
    pub fn from_draft(draft: ComposeDraft) -> Self {
        let seed = draft.to_buffer(|| chrono::Local::now().to_rfc2822());
        Self {
            subject: draft.subject,
            seed,
            seeded: false,
        }
    }

    fn send(&mut self, cx: &WindowCx, _event: &UiEvent) -> Result<(), WindowError> {
        let message = cx.surface.body()?;
        cx.services.transfer.send(&message)?;

        tracing::info!(subject = %self.subject, "message sent");
        cx.surface.clear()?;
        cx.surface.mark_clean()?;
        Ok(())
    }
}

impl WindowKind for ComposeWindow {
    const COMMANDS: &'static [Command<Self>] = &[Command {
        name: "Send",
        run: ComposeWindow::send,
    }];

    fn title(&self) -> String {
        format!("compose/{}", self.subject)
    }

    /// Seeds the buffer once; later redraws leave the user's text alone
    fn redraw(&mut self, cx: &WindowCx) -> Result<(), WindowError> {
        if self.seeded {
            return Ok(());
        }
        cx.surface.clear()?;
        cx.surface.append(&self.seed)?;
        cx.surface.set_selection(Address::Start)?;
        self.seeded = true;
        Ok(())
    }
}
