use crate::ui::app::Pane;
use crate::utils::get_color;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph, Widget},
};

/// Hard-wrap `lines` to `width` columns and keep the last `height` rows.
///
/// Wrapping is done here rather than by `Paragraph` so the number of rows is
/// known and the pane can stay pinned to its newest output.
pub fn wrap_tail<'a, I>(lines: I, width: usize, height: usize) -> Vec<String>
where
    I: DoubleEndedIterator<Item = &'a String>,
{
    if width == 0 || height == 0 {
        return Vec::new();
    }

    let mut rows = Vec::with_capacity(height);
    for line in lines.rev() {
        let chars: Vec<char> = line.chars().collect();
        let mut chunks: Vec<String> = chars.chunks(width).map(|c| c.iter().collect()).collect();
        if chunks.is_empty() {
            chunks.push(String::new());
        }
        for chunk in chunks.into_iter().rev() {
            rows.push(chunk);
            if rows.len() == height {
                rows.reverse();
                return rows;
            }
        }
    }
    rows.reverse();
    rows
}

/// Bordered, auto-scrolling view of one pod.
pub struct PaneView<'a> {
    pane: &'a Pane,
}

impl<'a> PaneView<'a> {
    pub fn new(pane: &'a Pane) -> Self {
        Self { pane }
    }
}

impl<'a> Widget for PaneView<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let color = get_color(&format!("{}/{}", self.pane.context, self.pane.pod_name));
        let title_style = if self.pane.ended {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default().fg(color).add_modifier(Modifier::BOLD)
        };
        let block = Block::default()
            .title(Line::styled(self.pane.title(), title_style))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color));

        let inner = block.inner(area);
        let rows = wrap_tail(
            self.pane.lines.iter(),
            inner.width as usize,
            inner.height as usize,
        );
        let lines: Vec<Line> = rows.into_iter().map(Line::from).collect();

        Paragraph::new(lines).block(block).render(area, buf);
    }
}

pub struct StatusBar {
    live_streams: usize,
    total_panes: usize,
    total_lines: usize,
}

impl StatusBar {
    pub fn new(live_streams: usize, total_panes: usize, total_lines: usize) -> Self {
        Self {
            live_streams,
            total_panes,
            total_lines,
        }
    }
}

impl Widget for StatusBar {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let status_text = [
            format!("Pods: {}/{}", self.live_streams, self.total_panes),
            format!("Lines: {}", self.total_lines),
            "q to quit".to_string(),
        ]
        .join(" | ");

        Paragraph::new(status_text)
            .style(Style::default().bg(Color::DarkGray).fg(Color::White))
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|l| l.to_string()).collect()
    }

    #[test]
    fn test_wrap_tail_keeps_newest_rows() {
        let lines = owned(&["one", "two", "three", "four"]);
        assert_eq!(wrap_tail(lines.iter(), 10, 2), owned(&["three", "four"]));
    }

    #[test]
    fn test_wrap_tail_splits_long_lines() {
        let lines = owned(&["abcdefgh", "xy"]);
        assert_eq!(wrap_tail(lines.iter(), 3, 3), owned(&["def", "gh", "xy"]));
    }

    #[test]
    fn test_wrap_tail_short_history() {
        let lines = owned(&["", "a"]);
        assert_eq!(wrap_tail(lines.iter(), 5, 10), owned(&["", "a"]));
    }

    #[test]
    fn test_wrap_tail_degenerate_area() {
        let lines = owned(&["a"]);
        assert!(wrap_tail(lines.iter(), 0, 5).is_empty());
        assert!(wrap_tail(lines.iter(), 5, 0).is_empty());
    }
}
