//! Mail windows. Each window owns one surface and runs its own event loop on
//! a dedicated thread; windows share nothing but the collaborators in
//! [`Services`].

pub mod compose;
pub mod listing;
pub mod message;
pub mod thread;
pub mod thread_list;

use std::sync::Arc;
use std::thread::JoinHandle;

use crate::mail::mime::RenderError;
use crate::mail::store::{MessageStore, StoreError};
use crate::mail::transfer::{MailTransfer, TransferError};
use crate::ui::{EventKind, Surface, UiError, UiEvent, WindowService};

pub use compose::ComposeWindow;
pub use listing::{DegenerateInput, LookupError};
pub use message::MessageWindow;
pub use thread::ThreadWindow;
pub use thread_list::ThreadListWindow;

#[derive(Debug, thiserror::Error)]
pub enum WindowError {
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error(transparent)]
    Degenerate(#[from] DegenerateInput),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Transfer(#[from] TransferError),
    #[error(transparent)]
    Ui(#[from] UiError),
    #[error("cannot start window thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Collaborators shared by every window.
#[derive(Clone)]
pub struct Services {
    pub ui: Arc<dyn WindowService>,
    pub store: Arc<dyn MessageStore>,
    pub transfer: Arc<dyn MailTransfer>,
    /// Identity replies are sent from
    pub sender: String,
}

impl Services {
    /// Create `window` on a new surface and start its event loop
    pub fn open(&self, window: Window) -> Result<JoinHandle<Phase>, WindowError> {
        WindowTask::create(self.clone(), window)?.spawn()
    }
}

/// What a window may touch while it redraws or runs a command
pub struct WindowCx<'a> {
    pub surface: &'a dyn Surface,
    pub services: &'a Services,
}

impl WindowCx<'_> {
    pub fn open(&self, window: Window) -> Result<(), WindowError> {
        self.services.open(window).map(|_| ())
    }
}

/// A named action listed in a window's tag.
pub struct Command<W> {
    pub name: &'static str,
    pub run: fn(&mut W, &WindowCx, &UiEvent) -> Result<(), WindowError>,
}

/// Behaviour shared by the window variants.
pub trait WindowKind: Sized + 'static {
    /// Commands this variant answers to; also its tag
    const COMMANDS: &'static [Command<Self>];

    /// Name without the `/mail/` prefix
    fn title(&self) -> String;

    fn redraw(&mut self, cx: &WindowCx) -> Result<(), WindowError>;

    /// Returns whether the event was handled
    fn handle_event(&mut self, cx: &WindowCx, event: &UiEvent) -> Result<bool, WindowError> {
        dispatch(self, cx, event)
    }
}

/// Run the command an execute event names, if this window has one
pub fn dispatch<W: WindowKind>(
    window: &mut W,
    cx: &WindowCx,
    event: &UiEvent,
) -> Result<bool, WindowError> {
    if !matches!(event.kind, EventKind::Execute(_)) {
        return Ok(false);
    }
    match W::COMMANDS.iter().find(|c| c.name == event.command()) {
        Some(command) => {
            tracing::trace!(command = command.name, "dispatching");
            (command.run)(window, cx, event)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

fn tag_of<W: WindowKind>() -> String {
    W::COMMANDS
        .iter()
        .map(|c| c.name)
        .collect::<Vec<_>>()
        .join(" ")
}

pub enum Window {
    ThreadList(ThreadListWindow),
    Thread(ThreadWindow),
    Message(MessageWindow),
    Compose(ComposeWindow),
}

macro_rules! each_variant {
    ($window:expr, $inner:ident => $body:expr) => {
        match $window {
            Window::ThreadList($inner) => $body,
            Window::Thread($inner) => $body,
            Window::Message($inner) => $body,
            Window::Compose($inner) => $body,
        }
    };
}

impl Window {
    pub fn title(&self) -> String {
        each_variant!(self, w => w.title())
    }

    pub fn name(&self) -> String {
        format!("/mail/{}", self.title())
    }

    pub fn tag(&self) -> String {
        match self {
            Window::ThreadList(_) => tag_of::<ThreadListWindow>(),
            Window::Thread(_) => tag_of::<ThreadWindow>(),
            Window::Message(_) => tag_of::<MessageWindow>(),
            Window::Compose(_) => tag_of::<ComposeWindow>(),
        }
    }

    pub fn redraw(&mut self, cx: &WindowCx) -> Result<(), WindowError> {
        each_variant!(self, w => w.redraw(cx))
    }

    pub fn handle_event(&mut self, cx: &WindowCx, event: &UiEvent) -> Result<bool, WindowError> {
        each_variant!(self, w => w.handle_event(cx, event))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Surface allocated and first drawn; no event loop yet
    Created,
    Running,
    Closed,
}

/// A window bound to its surface.
pub struct WindowTask {
    window: Window,
    surface: Box<dyn Surface>,
    services: Services,
    phase: Phase,
}

impl WindowTask {
    pub fn create(services: Services, mut window: Window) -> Result<Self, WindowError> {
        let surface = services.ui.create_surface()?;
        surface.set_name(&window.name())?;
        surface.set_tag(&window.tag())?;
        tracing::debug!(name = %window.name(), "window created");

        let cx = WindowCx {
            surface: &*surface,
            services: &services,
        };
        if let Err(e) = window.redraw(&cx) {
            report(&*surface, "Redraw", &e);
        }

        Ok(Self {
            window,
            surface,
            services,
            phase: Phase::Created,
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Handle one event. Failed commands are reported on the surface; only a
    /// closed surface is an error.
    pub fn handle(&mut self, event: UiEvent) -> Result<(), UiError> {
        let cx = WindowCx {
            surface: &*self.surface,
            services: &self.services,
        };
        match self.window.handle_event(&cx, &event) {
            Ok(true) => Ok(()),
            Ok(false) => self.surface.write_back(event),
            Err(WindowError::Ui(UiError::Closed)) => Err(UiError::Closed),
            Err(e) => {
                report(&*self.surface, &event.text, &e);
                Ok(())
            }
        }
    }

    fn enter(&mut self, phase: Phase) {
        tracing::debug!(name = %self.window.name(), from = ?self.phase, to = ?phase, "window phase");
        self.phase = phase;
    }

    /// Pull events until the surface closes, then destroy it. Returns the
    /// phase the task ended in.
    pub fn run(mut self) -> Phase {
        self.enter(Phase::Running);
        while let Some(event) = self.surface.next_event() {
            if let Err(e) = self.handle(event) {
                tracing::debug!(name = %self.window.name(), "stopping: {}", e);
                break;
            }
        }
        self.surface.destroy();
        self.enter(Phase::Closed);
        self.phase
    }

    /// Run the event loop on its own named thread
    pub fn spawn(self) -> Result<JoinHandle<Phase>, WindowError> {
        let name = format!("window-{}", self.window.title());
        Ok(std::thread::Builder::new()
            .name(name)
            .spawn(move || self.run())?)
    }
}

fn report(surface: &dyn Surface, action: &str, error: &WindowError) {
    tracing::warn!(action, "command failed: {}", error);
    if let Err(e) = surface.report(&format!("{}: {}", action, error)) {
        tracing::debug!("diagnostic dropped: {}", e);
    }
}
