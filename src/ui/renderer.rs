use crate::ui::app::App;
use crate::ui::layout::create_layout;
use crate::ui::widgets::{PaneView, StatusBar};
use ratatui::{Frame, Terminal, backend::Backend};

pub fn render<B: Backend>(terminal: &mut Terminal<B>, app: &App) -> std::io::Result<()> {
    terminal.draw(|f| render_frame(f, app))?;
    Ok(())
}

fn render_frame(f: &mut Frame, app: &App) {
    let layout = create_layout(f.area(), app.panes.len());

    for (pane, area) in app.panes.iter().zip(layout.panes) {
        f.render_widget(PaneView::new(pane), area);
    }

    let status_bar = StatusBar::new(app.live_streams(), app.panes.len(), app.total_lines);
    f.render_widget(status_bar, layout.status_bar);
}
