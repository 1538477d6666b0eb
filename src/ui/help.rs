use ratatui::{
    Frame,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::config::ThemeConfig;

/// Last thing the desk wants the user to notice
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Info(String),
    Error(String),
}

/// Bottom strip: key hints or the command prompt, then the status
pub fn render_help(
    f: &mut Frame,
    area: Rect,
    prompt: Option<&str>,
    status: Option<&Status>,
    theme: &ThemeConfig,
) {
    let key_style = Style::default().fg(theme.primary());
    let text_style = Style::default().fg(theme.fg_subtle());
    let prompt_style = Style::default().fg(theme.fg());

    let mut spans = match prompt {
        Some(command) => vec![
            Span::styled(":", key_style),
            Span::styled(command, prompt_style),
            Span::styled("_", key_style),
            Span::styled("  ", text_style),
            Span::styled("Enter", key_style),
            Span::styled(" run  ", text_style),
            Span::styled("Esc", key_style),
            Span::styled(" cancel", text_style),
        ],
        None => vec![
            Span::styled("j/k", key_style),
            Span::styled(" nav  ", text_style),
            Span::styled("Enter", key_style),
            Span::styled(" open  ", text_style),
            Span::styled(":", key_style),
            Span::styled(" command  ", text_style),
            Span::styled("Tab", key_style),
            Span::styled(" window  ", text_style),
            Span::styled("e", key_style),
            Span::styled(" edit  ", text_style),
            Span::styled("q", key_style),
            Span::styled(" close  ", text_style),
            Span::styled("Q", key_style),
            Span::styled(" quit", text_style),
        ],
    };

    if let Some(status) = status {
        let (message, color) = match status {
            Status::Info(message) => (message, theme.success()),
            Status::Error(message) => (message, theme.error()),
        };
        spans.push(Span::styled("  │  ", Style::default().fg(theme.border())));
        spans.push(Span::styled(message.as_str(), Style::default().fg(color)));
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(theme.bg_panel()));

    f.render_widget(paragraph, area);
}
