use super::listing::{leading_number, resolve, thread_lines};
use super::{Command, ThreadWindow, Window, WindowCx, WindowError, WindowKind, dispatch};
use crate::mail::types::ThreadSummary;
use crate::ui::{Address, EventKind, Origin, UiEvent};

/// Search results, one line per thread.
pub struct ThreadListWindow {
    query: String,
    /// Snapshot taken when the search ran; never re-queried
    threads: Vec<ThreadSummary>,
}

impl ThreadListWindow {
    pub fn new(query: impl Into<String>, threads: Vec<ThreadSummary>) -> Self {
        Self {
            query: query.into(),
            threads,
        }
    }

    pub fn threads(&self) -> &[ThreadSummary] {
        &self.threads
    }

    fn open_selected(&mut self, cx: &WindowCx, event: &UiEvent) -> Result<(), WindowError> {
        let (line, text) = cx.surface.line_at(event.start)?;
        let thread = resolve(&self.threads, leading_number(&text)?)?;

        cx.surface.set_selection(Address::Line(line))?;
        cx.open(Window::Thread(ThreadWindow::new(
            thread.subject_display(),
            thread.top_level_messages().to_vec(),
        )))
    }
}

impl WindowKind for ThreadListWindow {
    const COMMANDS: &'static [Command<Self>] = &[Command {
        name: "Redraw",
        run: |w, cx, _| w.redraw(cx),
    }];

    fn title(&self) -> String {
        format!("search/{}", self.query)
    }

    fn redraw(&mut self, cx: &WindowCx) -> Result<(), WindowError> {
        let text = match thread_lines(&self.threads) {
            Ok(lines) => lines.into_iter().map(|line| line + "\n").collect(),
            Err(_) => "(no threads)\n".to_string(),
        };
        cx.surface.clear()?;
        cx.surface.append(&text)?;
        cx.surface.mark_clean()?;
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

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::mail::types::MessageData;
    use crate::window::WindowTask;
    use crate::window::testing::Harness;

    fn thread(subject: &str, author: &str) -> ThreadSummary {
        let message = MessageData::new(subject, format!("/mail/{}", subject))
            .header("from", author)
            .header("subject", subject)
            .matched(true)
            .build();
        ThreadSummary {
            subject: Some(subject.to_string()),
            authors: author.to_string(),
            matched: 1,
            total: 1,
            top_level: vec![message],
        }
    }

    #[test]
    fn test_redraw_lists_threads() {
        let harness = Harness::new();
        let window = ThreadListWindow::new("tag:inbox", vec![thread("One", "a"), thread("Two", "b")]);
        WindowTask::create(harness.services.clone(), Window::ThreadList(window)).unwrap();

        let probe = harness.ui.find("/mail/search/tag:inbox").unwrap();
        assert_eq!(probe.body(), "1  [1/1]  a; One\n2  [1/1]  b; Two\n");
    }

    #[test]
    fn test_empty_search_shows_placeholder() {
        let harness = Harness::new();
        let window = ThreadListWindow::new("tag:nothing", Vec::new());
        WindowTask::create(harness.services.clone(), Window::ThreadList(window)).unwrap();

        let probe = harness.ui.find("/mail/search/tag:nothing").unwrap();
        assert_eq!(probe.body(), "(no threads)\n");
        assert!(probe.diagnostics().is_empty());
    }

    #[test]
    fn test_click_opens_thread_and_selects_line() {
        let harness = Harness::new();
        let window = ThreadListWindow::new("tag:inbox", vec![thread("One", "a"), thread("Two", "b")]);
        let mut task =
            WindowTask::create(harness.services.clone(), Window::ThreadList(window)).unwrap();
        let list = harness.ui.find("/mail/search/tag:inbox").unwrap();

        // Second line starts after "1  [1/1]  a; One\n"
        task.handle(UiEvent::look(Origin::Body, 20, 20, "b")).unwrap();

        assert_eq!(list.selection(), (17, 33));
        let thread = harness
            .ui
            .wait_for("/mail/thread/Two", Duration::from_secs(5))
            .unwrap();
        assert!(thread.wait_until(Duration::from_secs(5), |b| b.body().contains("b Two")));
        thread.close();
    }

    #[test]
    fn test_click_with_other_flag_is_not_handled() {
        let harness = Harness::new();
        let window = ThreadListWindow::new("tag:inbox", vec![thread("One", "a")]);
        let mut task =
            WindowTask::create(harness.services.clone(), Window::ThreadList(window)).unwrap();

        let mut event = UiEvent::look(Origin::Body, 0, 0, "1");
        event.flag = 2;
        task.handle(event).unwrap();

        let list = harness.ui.find("/mail/search/tag:inbox").unwrap();
        assert_eq!(list.take_written_back().len(), 1);
        // No thread window was opened
        assert_eq!(harness.ui.surfaces().len(), 1);
    }
}
