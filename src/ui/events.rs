use crate::ui::app::App;
use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Everything the render loop reacts to. Readers and the keyboard task only
/// ever talk to the terminal through these.
#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Line { pane: usize, line: String },
    StreamEnded(usize),
    Resize,
}

/// Forward terminal input to the render loop until `cancel` fires.
pub async fn event_loop(tx: mpsc::Sender<AppEvent>, cancel: CancellationToken) {
    let mut event_stream = EventStream::new();

    loop {
        let maybe_event = tokio::select! {
            _ = cancel.cancelled() => break,
            maybe_event = event_stream.next() => maybe_event,
        };

        let event = match maybe_event {
            Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => AppEvent::Key(key),
            Some(Ok(Event::Resize(_, _))) => AppEvent::Resize,
            Some(Ok(_)) => continue,
            Some(Err(e)) => {
                warn!("Error reading terminal events: {}", e);
                break;
            }
            None => break,
        };
        if tx.send(event).await.is_err() {
            break;
        }
    }
}

/// `q`, Ctrl-C and Ctrl-D leave the dashboard.
pub fn is_quit_key(key: &KeyEvent) -> bool {
    matches!(
        (key.code, key.modifiers),
        (KeyCode::Char('q'), KeyModifiers::NONE)
            | (KeyCode::Char('c'), KeyModifiers::CONTROL)
            | (KeyCode::Char('d'), KeyModifiers::CONTROL)
    )
}

/// Returns false once the key asked the dashboard to stop.
pub fn handle_key_event(app: &mut App, key: KeyEvent) -> bool {
    if is_quit_key(&key) {
        app.request_quit();
        return false;
    }
    true
}

/// Apply one event to the dashboard state.
pub fn apply_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => {
            handle_key_event(app, key);
        }
        AppEvent::Line { pane, line } => app.add_line(pane, line),
        AppEvent::StreamEnded(pane) => app.mark_ended(pane),
        AppEvent::Resize => app.mark_dirty(),
    }
}
