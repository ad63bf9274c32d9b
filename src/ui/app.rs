use std::collections::VecDeque;

/// Lifecycle of the dashboard. There is no way back to `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardState {
    Running,
    Quitting,
    Terminated,
}

/// Scrollback of one pod.
#[derive(Debug)]
pub struct Pane {
    pub context: String,
    pub pod_name: String,
    pub lines: VecDeque<String>,
    pub ended: bool,
}

impl Pane {
    pub fn new(context: String, pod_name: String) -> Self {
        Self {
            context,
            pod_name,
            lines: VecDeque::new(),
            ended: false,
        }
    }

    pub fn title(&self) -> String {
        if self.ended {
            format!("  {} - {} (ended)  ", self.context, self.pod_name)
        } else {
            format!("  {} - {}  ", self.context, self.pod_name)
        }
    }
}

pub struct App {
    pub panes: Vec<Pane>,
    // Ring buffer size, per pane
    pub max_buffer_size: usize,
    pub total_lines: usize,
    state: DashboardState,
    dirty: bool,
}

impl App {
    pub fn new(panes: Vec<Pane>, max_buffer_size: usize) -> Self {
        Self {
            panes,
            max_buffer_size: max_buffer_size.max(1),
            total_lines: 0,
            state: DashboardState::Running,
            dirty: true,
        }
    }

    pub fn state(&self) -> DashboardState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == DashboardState::Running
    }

    /// `Running -> Quitting`. Returns false if the dashboard was already
    /// leaving.
    pub fn request_quit(&mut self) -> bool {
        if self.state != DashboardState::Running {
            return false;
        }
        self.state = DashboardState::Quitting;
        true
    }

    /// `Quitting -> Terminated`, once the render loop has stopped.
    pub fn finish(&mut self) {
        if self.state == DashboardState::Quitting {
            self.state = DashboardState::Terminated;
        }
    }

    pub fn add_line(&mut self, pane: usize, line: String) {
        let capacity = self.max_buffer_size;
        let Some(pane) = self.panes.get_mut(pane) else {
            return;
        };
        while pane.lines.len() >= capacity {
            pane.lines.pop_front();
        }
        pane.lines.push_back(line);
        self.total_lines += 1;
        self.dirty = true;
    }

    pub fn mark_ended(&mut self, pane: usize) {
        if let Some(pane) = self.panes.get_mut(pane) {
            pane.ended = true;
            self.dirty = true;
        }
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Whether something changed since the last call.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn live_streams(&self) -> usize {
        self.panes.iter().filter(|p| !p.ended).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(capacity: usize) -> App {
        App::new(
            vec![
                Pane::new("c1".into(), "api".into()),
                Pane::new("c2".into(), "db".into()),
            ],
            capacity,
        )
    }

    #[test]
    fn test_quit_transitions_once() {
        let mut app = app(10);
        assert_eq!(app.state(), DashboardState::Running);

        assert!(app.request_quit());
        assert_eq!(app.state(), DashboardState::Quitting);
        assert!(!app.request_quit());

        app.finish();
        assert_eq!(app.state(), DashboardState::Terminated);
        assert!(!app.request_quit());
        assert_eq!(app.state(), DashboardState::Terminated);
    }

    #[test]
    fn test_finish_requires_quitting() {
        let mut app = app(10);
        app.finish();
        assert_eq!(app.state(), DashboardState::Running);
    }

    #[test]
    fn test_lines_go_to_their_pane() {
        let mut app = app(10);
        app.add_line(1, "ready".into());
        app.add_line(0, "listening".into());
        app.add_line(7, "nowhere".into());

        assert_eq!(app.panes[0].lines, vec!["listening"]);
        assert_eq!(app.panes[1].lines, vec!["ready"]);
        assert_eq!(app.total_lines, 2);
    }

    #[test]
    fn test_ring_buffer_keeps_latest() {
        let mut app = app(3);
        for i in 0..5 {
            app.add_line(0, format!("line {}", i));
        }
        assert_eq!(app.panes[0].lines, vec!["line 2", "line 3", "line 4"]);
    }

    #[test]
    fn test_ended_pane_title() {
        let mut app = app(3);
        app.mark_ended(1);
        assert_eq!(app.panes[0].title(), "  c1 - api  ");
        assert_eq!(app.panes[1].title(), "  c2 - db (ended)  ");
        assert_eq!(app.live_streams(), 1);
    }

    #[test]
    fn test_dirty_flag() {
        let mut app = app(3);
        assert!(app.take_dirty());
        assert!(!app.take_dirty());
        app.add_line(0, "x".into());
        assert!(app.take_dirty());
    }
}
