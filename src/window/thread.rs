use super::listing::{leading_number, message_lines, resolve};
use super::{Command, MessageWindow, Window, WindowCx, WindowError, WindowKind, dispatch};
use crate::mail::hierarchy::build_hierarchy;
use crate::mail::types::{HierarchyNode, MessageRef};
use crate::ui::{Address, EventKind, Origin, UiEvent};

/// One thread as an indented message list.
pub struct ThreadWindow {
    subject: String,
    top_level: Vec<MessageRef>,
    only_matched: bool,
    /// Messages in the order the last redraw numbered them
    displayed: Vec<MessageRef>,
}

impl ThreadWindow {
    pub fn new(subject: impl Into<String>, top_level: Vec<MessageRef>) -> Self {
        Self {
            subject: subject.into(),
            top_level,
            only_matched: true,
            displayed: Vec::new(),
        }
    }

    pub fn only_matched(&self) -> bool {
        self.only_matched
    }

    pub fn displayed_items(&self) -> &[MessageRef] {
        &self.displayed
    }

    fn visible_nodes(&self) -> Vec<HierarchyNode> {
        build_hierarchy(&self.top_level)
            .into_iter()
            .filter(|node| !self.only_matched || node.message.is_match())
            .collect()
    }

    fn toggle_match(&mut self, cx: &WindowCx) -> Result<(), WindowError> {
        self.only_matched = !self.only_matched;
        self.redraw(cx)
    }

    fn open_selected(&mut self, cx: &WindowCx, event: &UiEvent) -> Result<(), WindowError> {
        let (line, text) = cx.surface.line_at(event.start)?;
        let message = resolve(&self.displayed, leading_number(&text)?)?;

        cx.surface.set_selection(Address::Line(line))?;
        cx.open(Window::Message(MessageWindow::new(message.location())))
    }
}

impl WindowKind for ThreadWindow {
    const COMMANDS: &'static [Command<Self>] = &[
        Command {
            name: "Redraw",
            run: |w, cx, _| w.redraw(cx),
        },
        Command {
            name: "ToggleMatch",
            run: |w, cx, _| w.toggle_match(cx),
        },
    ];

    fn title(&self) -> String {
        format!("thread/{}", self.subject)
    }

    fn redraw(&mut self, cx: &WindowCx) -> Result<(), WindowError> {
        let nodes = self.visible_nodes();
        let text: String = message_lines(&nodes)
            .into_iter()
            .map(|line| line + "\n")
            .collect();
        self.displayed = nodes.into_iter().map(|node| node.message).collect();

        cx.surface.clear()?;
        cx.surface.append(&text)?;
        Ok(())
    }

    fn handle_event(&mut self, cx: &WindowCx, event: &UiEvent) -> Result<bool, WindowError> {
        if event.kind == EventKind::Look(Origin::Body) && event.flag == 0 {
            self.open_selected(cx, event)?;
            return Ok(true);
        }
        dispatch(self, cx, event)
    }
}
