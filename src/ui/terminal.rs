//! Terminal desk: hosts every surface in one terminal, shows the focused one
//! and turns keys into window events.

use std::collections::{HashMap, HashSet};
use std::io::{self, Write};
use std::process::Command;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use super::help::{Status, render_help};
use super::reader::{follow, render_body};
use super::{
    Address, EventKind, MemoryService, Origin, Surface, SurfaceProbe, UiError, UiEvent,
    WindowService,
};
use crate::config::ThemeConfig;

/// Window service drawing to the terminal.
///
/// Windows create surfaces from any thread; [`TerminalService::run`] must own
/// the terminal on the main thread.
pub struct TerminalService {
    surfaces: MemoryService,
    theme: ThemeConfig,
    editor: String,
}

impl WindowService for TerminalService {
    fn create_surface(&self) -> Result<Box<dyn Surface>, UiError> {
        self.surfaces.create_surface()
    }
}

impl TerminalService {
    pub fn new(theme: ThemeConfig, editor: impl Into<String>) -> Self {
        Self {
            surfaces: MemoryService::new(),
            theme,
            editor: editor.into(),
        }
    }

    /// Draw and dispatch keys until no surface is left or the user quits
    pub fn run(&self) -> Result<(), UiError> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.event_loop(&mut terminal);

        // Restore terminal
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn event_loop(
        &self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> Result<(), UiError> {
        let mut desk = Desk::default();

        loop {
            let visible = desk.sync(&self.surfaces);
            if visible.is_empty() {
                tracing::debug!("no windows left");
                return Ok(());
            }

            terminal.draw(|f| desk.draw(f, &visible, &self.theme))?;

            // Poll with timeout so windows updating in the background get redrawn
            if !event::poll(Duration::from_millis(100))? {
                continue;
            }

            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match desk.on_key(key, &visible) {
                    DeskAction::None => {}
                    DeskAction::Quit => return Ok(()),
                    DeskAction::Edit(probe) => {
                        desk.status = Some(self.edit(terminal, &probe)?);
                    }
                }
            }
        }
    }

    /// Hand the body to the external editor and take back what it saved
    fn edit(
        &self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        probe: &SurfaceProbe,
    ) -> Result<Status, UiError> {
        let mut temp_file = tempfile::NamedTempFile::new()?;
        write!(temp_file, "{}", probe.body())?;
        temp_file.flush()?;
        let path = temp_file.path().to_owned();

        let argv = shell_words::split(&self.editor).unwrap_or_else(|_| vec![self.editor.clone()]);
        let Some((program, args)) = argv.split_first() else {
            return Ok(Status::Error("no editor configured".to_string()));
        };

        // Open editor
        disable_raw_mode()?;
        execute!(io::stdout(), LeaveAlternateScreen)?;

        let status = Command::new(program).args(args).arg(&path).status();

        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen)?;
        terminal.clear()?;

        match status {
            Ok(status) if status.success() => {
                let text = std::fs::read_to_string(&path)?;
                probe.edit(|buffer| buffer.replace(text));
                Ok(Status::Info("edited".to_string()))
            }
            Ok(status) => Ok(Status::Error(format!("{} exited with {}", program, status))),
            Err(e) => {
                tracing::warn!(%program, "cannot start editor: {}", e);
                Ok(Status::Error(format!("cannot start {}: {}", program, e)))
            }
        }
    }
}

enum DeskAction {
    None,
    Quit,
    Edit(SurfaceProbe),
}

/// State of the desk itself, separate from any surface
#[derive(Default)]
struct Desk {
    focus: Option<u64>,
    known: HashSet<u64>,
    scroll: HashMap<u64, usize>,
    seen_diagnostics: HashMap<u64, usize>,
    prompt: Option<String>,
    status: Option<Status>,
}

impl Desk {
    /// Catch up with the windows: new surfaces take focus, written-back
    /// events get default handling, new diagnostics reach the status strip.
    /// Returns the surfaces still open.
    fn sync(&mut self, surfaces: &MemoryService) -> Vec<SurfaceProbe> {
        for probe in surfaces.surfaces() {
            for event in probe.take_written_back() {
                if let Some(status) = default_action(&probe, event) {
                    self.status = Some(status);
                }
            }
        }

        let visible: Vec<SurfaceProbe> = surfaces
            .surfaces()
            .into_iter()
            .filter(|probe| !probe.is_closed())
            .collect();
        let live: HashSet<u64> = visible.iter().map(|probe| probe.id()).collect();

        for probe in &visible {
            if self.known.insert(probe.id()) {
                self.focus = Some(probe.id());
            }

            let diagnostics = probe.diagnostics();
            let seen = self.seen_diagnostics.entry(probe.id()).or_insert(0);
            if diagnostics.len() > *seen {
                if let Some(last) = diagnostics.last() {
                    self.status = Some(Status::Error(last.clone()));
                }
                *seen = diagnostics.len();
            }
        }

        self.known.retain(|id| live.contains(id));
        self.scroll.retain(|id, _| live.contains(id));
        self.seen_diagnostics.retain(|id, _| live.contains(id));
        if self.focus.is_none_or(|id| !live.contains(&id)) {
            self.focus = visible.last().map(|probe| probe.id());
        }

        visible
    }

    fn focused<'a>(&self, visible: &'a [SurfaceProbe]) -> Option<&'a SurfaceProbe> {
        visible.iter().find(|probe| Some(probe.id()) == self.focus)
    }

    fn cycle_focus(&mut self, visible: &[SurfaceProbe], forward: bool) {
        let Some(current) = visible.iter().position(|probe| Some(probe.id()) == self.focus) else {
            return;
        };
        let next = if forward {
            (current + 1) % visible.len()
        } else {
            (current + visible.len() - 1) % visible.len()
        };
        self.focus = Some(visible[next].id());
    }

    fn on_key(&mut self, key: KeyEvent, visible: &[SurfaceProbe]) -> DeskAction {
        let Some(probe) = self.focused(visible).cloned() else {
            return DeskAction::Quit;
        };

        if let Some(prompt) = self.prompt.as_mut() {
            match key.code {
                KeyCode::Esc => self.prompt = None,
                KeyCode::Enter => {
                    let command = prompt.trim().to_string();
                    self.prompt = None;
                    if !command.is_empty() {
                        probe.send(UiEvent::execute(Origin::Tag, &command));
                    }
                }
                KeyCode::Backspace => {
                    prompt.pop();
                }
                KeyCode::Char(c) => prompt.push(c),
                _ => {}
            }
            return DeskAction::None;
        }

        self.status = None;
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => move_cursor(&probe, 1),
            KeyCode::Char('k') | KeyCode::Up => move_cursor(&probe, -1),
            KeyCode::Char('g') => probe.edit(|b| b.select(Address::Line(1))),
            KeyCode::Char('G') => probe.edit(|b| b.select(Address::Line(b.line_count().max(1)))),
            KeyCode::Enter => look(&probe),
            KeyCode::Char(':') => self.prompt = Some(String::new()),
            KeyCode::Tab => self.cycle_focus(visible, true),
            KeyCode::BackTab => self.cycle_focus(visible, false),
            KeyCode::Char('q') => probe.close(),
            KeyCode::Char('Q') => {
                for probe in visible {
                    probe.close();
                }
                return DeskAction::Quit;
            }
            KeyCode::Char('e') => return DeskAction::Edit(probe),
            _ => {}
        }
        DeskAction::None
    }

    fn draw(&mut self, f: &mut Frame, visible: &[SurfaceProbe], theme: &ThemeConfig) {
        let Some(probe) = self.focused(visible) else {
            return;
        };
        let buffer = probe.snapshot();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(1),
                Constraint::Length(1),
            ])
            .split(f.area());

        // Window list
        let mut tabs = Vec::new();
        for (i, other) in visible.iter().enumerate() {
            if i > 0 {
                tabs.push(Span::styled(" │ ", Style::default().fg(theme.border())));
            }
            let style = if other.id() == probe.id() {
                Style::default()
                    .fg(theme.primary())
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme.fg_muted())
            };
            tabs.push(Span::styled(other.name(), style));
        }
        f.render_widget(
            Paragraph::new(Line::from(tabs)).style(Style::default().bg(theme.bg_panel())),
            chunks[0],
        );

        // Tag strip
        f.render_widget(
            Paragraph::new(buffer.tag.clone()).style(Style::default().fg(theme.secondary())),
            chunks[1],
        );

        // Body, scrolled to keep the selection in view; one row goes to the border
        let height = chunks[2].height.saturating_sub(1) as usize;
        let scroll = self.scroll.entry(probe.id()).or_insert(0);
        *scroll = follow(*scroll, buffer.selected_line().saturating_sub(1), height);
        render_body(f, chunks[2], &buffer, *scroll, self.prompt.is_none(), theme);

        render_help(
            f,
            chunks[3],
            self.prompt.as_deref(),
            self.status.as_ref(),
            theme,
        );
    }
}

fn move_cursor(probe: &SurfaceProbe, delta: isize) {
    probe.edit(|buffer| {
        let last = buffer.line_count().max(1) as isize;
        let line = (buffer.selected_line() as isize + delta).clamp(1, last);
        buffer.select(Address::Line(line as usize));
    });
}

/// Ask the window to open whatever the selected line names
fn look(probe: &SurfaceProbe) {
    let buffer = probe.snapshot();
    if buffer.line_count() == 0 {
        return;
    }
    let (start, end) = buffer.line_range(buffer.selected_line());
    let (_, text) = buffer.line_at(start);
    probe.send(UiEvent::look(Origin::Body, start, end, &text));
}

/// What the desk does with an event the window did not want
fn default_action(probe: &SurfaceProbe, event: UiEvent) -> Option<Status> {
    match event.kind {
        EventKind::Execute(_) if event.command() == "Del" => {
            probe.close();
            None
        }
        EventKind::Execute(_) => Some(Status::Error(format!(
            "{}: unknown command",
            event.command()
        ))),
        _ => {
            tracing::trace!(text = %event.text, "unhandled event dropped");
            None
        }
    }
}
