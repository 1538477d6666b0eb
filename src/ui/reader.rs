use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use super::TextBuffer;
use crate::config::ThemeConfig;

/// Byte ranges of URLs in one line
fn find_urls(line: &str) -> Vec<(usize, usize)> {
    let mut urls = Vec::new();
    let mut search_start = 0;

    while let Some(start) = ["http://", "https://"]
        .iter()
        .filter_map(|scheme| line[search_start..].find(scheme))
        .min()
    {
        let abs_start = search_start + start;

        // Find end of URL (whitespace or common delimiters)
        let url_end = line[abs_start..]
            .find(|c: char| c.is_whitespace() || c == '>' || c == ')' || c == ']' || c == '"')
            .map(|i| abs_start + i)
            .unwrap_or(line.len());

        urls.push((abs_start, url_end));
        search_start = url_end;
    }

    urls
}

/// One body line with underlined URLs
fn style_line(line: &str, url_style: Style) -> Line<'static> {
    let mut spans = Vec::new();
    let mut last_end = 0;

    for (start, end) in find_urls(line) {
        if start > last_end {
            spans.push(Span::raw(line[last_end..start].to_string()));
        }
        spans.push(Span::styled(line[start..end].to_string(), url_style));
        last_end = end;
    }

    if last_end < line.len() || spans.is_empty() {
        spans.push(Span::raw(line[last_end..].to_string()));
    }

    Line::from(spans)
}

/// Keep `line` (0-based) on screen, returning the new scroll offset
pub fn follow(scroll: usize, line: usize, height: usize) -> usize {
    if line < scroll {
        line
    } else if height > 0 && line >= scroll + height {
        line + 1 - height
    } else {
        scroll
    }
}

/// Border titled with the surface name; `*` marks unsaved changes
fn surface_block<'a>(buffer: &TextBuffer, focused: bool, theme: &ThemeConfig) -> Block<'a> {
    let border_color = if focused {
        theme.border_active()
    } else {
        theme.border_subtle()
    };
    let title = match buffer.is_dirty() {
        true => format!(" {} * ", buffer.name),
        false => format!(" {} ", buffer.name),
    };

    Block::default()
        .borders(Borders::TOP)
        .border_style(Style::default().fg(border_color))
        .title_style(Style::default().fg(theme.primary()))
        .title(title)
}

/// Draw a surface body with its selected line highlighted
pub fn render_body(
    f: &mut Frame,
    area: Rect,
    buffer: &TextBuffer,
    scroll: usize,
    focused: bool,
    theme: &ThemeConfig,
) {
    let url_style = Style::default()
        .fg(theme.url())
        .add_modifier(Modifier::UNDERLINED);
    let selected_style = Style::default()
        .bg(theme.selected_bg())
        .add_modifier(Modifier::BOLD);
    let selected = buffer.selected_line().saturating_sub(1);

    let lines: Vec<Line> = buffer
        .body()
        .split('\n')
        .take(buffer.line_count())
        .enumerate()
        .map(|(row, text)| {
            let line = style_line(text, url_style);
            if row == selected {
                line.style(selected_style)
            } else {
                line
            }
        })
        .collect();

    let paragraph = Paragraph::new(lines)
        .style(Style::default().fg(theme.fg()))
        .block(surface_block(buffer, focused, theme))
        .scroll((scroll.min(u16::MAX as usize) as u16, 0));

    f.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_urls() {
        assert_eq!(
            find_urls("see https://example.com/x) and http://a.b"),
            vec![(4, 25), (31, 41)]
        );
        assert!(find_urls("no links").is_empty());
    }

    #[test]
    fn test_follow_keeps_line_visible() {
        assert_eq!(follow(0, 3, 10), 0);
        assert_eq!(follow(0, 12, 10), 3);
        assert_eq!(follow(5, 2, 10), 2);
    }
}
