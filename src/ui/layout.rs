use ratatui::layout::{Constraint, Direction, Layout, Rect};

pub struct AppLayout {
    pub panes: Vec<Rect>,
    pub status_bar: Rect,
}

/// One column per pane, equal widths, with the status bar underneath.
pub fn create_layout(area: Rect, pane_count: usize) -> AppLayout {
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),    // Panes
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    let panes = if pane_count == 0 {
        Vec::new()
    } else {
        let count = pane_count as u32;
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints((0..count).map(|_| Constraint::Ratio(1, count)))
            .split(main_chunks[0])
            .to_vec()
    };

    AppLayout {
        panes,
        status_bar: main_chunks[1],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panes_side_by_side() {
        let layout = create_layout(Rect::new(0, 0, 90, 20), 3);

        assert_eq!(layout.panes.len(), 3);
        assert!(layout.panes.iter().all(|p| p.width == 30 && p.height == 19));
        assert_eq!(layout.panes[1].x, 30);
        assert_eq!(layout.status_bar, Rect::new(0, 19, 90, 1));
    }

    #[test]
    fn test_no_panes() {
        let layout = create_layout(Rect::new(0, 0, 40, 10), 0);
        assert!(layout.panes.is_empty());
    }
}
