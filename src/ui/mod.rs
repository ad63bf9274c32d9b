//! Split-pane dashboard, one pane per pod.
//!
//! The render loop is the only code touching the terminal. Pod readers and
//! the keyboard task send [`AppEvent`]s over one channel and never see the
//! surface itself.

pub mod app;
pub mod events;
pub mod layout;
pub mod renderer;
pub mod terminal;
pub mod widgets;

pub use app::App;
pub use events::AppEvent;

use crate::error::TailError;
use crate::output::forward_lines;
use crate::types::Pod;
use app::Pane;
use ratatui::{Terminal, backend::Backend};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const EVENT_QUEUE_SIZE: usize = 1024;

/// Upper bound of queued events applied between two renders.
const MAX_EVENT_BATCH: usize = 512;

/// Spawn one reader per pod, each feeding its own pane.
pub fn spawn_pane_readers(
    pods: Vec<Pod>,
    tx: &mpsc::Sender<AppEvent>,
    cancel: &CancellationToken,
) -> (Vec<Pane>, JoinSet<()>) {
    let mut panes = Vec::with_capacity(pods.len());
    let mut readers = JoinSet::new();

    for (index, mut pod) in pods.into_iter().enumerate() {
        let mut pane = Pane::new(pod.context.clone(), pod.name.clone());
        let Some(stream) = pod.stream.take() else {
            pane.ended = true;
            panes.push(pane);
            continue;
        };
        panes.push(pane);

        let tx = tx.clone();
        let cancel = cancel.clone();
        readers.spawn(async move {
            let id = pod.id();
            let result = forward_lines(&id, stream, &tx, &cancel, |line| AppEvent::Line {
                pane: index,
                line,
            })
            .await;
            if let Err(e) = result {
                warn!("{}", e);
            }
            debug!("[{}] Reader for pod {} finished", pod.context, pod.name);

            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tx.send(AppEvent::StreamEnded(index)) => {}
            }
        });
    }

    (panes, readers)
}

/// Drive the dashboard until a quit key arrives or every event source is gone.
pub async fn run_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    event_rx: &mut mpsc::Receiver<AppEvent>,
) -> std::io::Result<()> {
    // ~60 FPS
    let mut render_interval = tokio::time::interval(Duration::from_millis(16));
    render_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    while app.is_running() {
        tokio::select! {
            _ = render_interval.tick() => {
                if app.take_dirty() {
                    renderer::render(terminal, app)?;
                }
            }
            event = event_rx.recv() => {
                let Some(event) = event else {
                    debug!("Event channel closed, leaving dashboard");
                    app.request_quit();
                    break;
                };
                let is_key = matches!(event, AppEvent::Key(_));
                events::apply_event(app, event);

                let mut batched = 0;
                while app.is_running() && batched < MAX_EVENT_BATCH {
                    let Ok(event) = event_rx.try_recv() else {
                        break;
                    };
                    events::apply_event(app, event);
                    batched += 1;
                }

                // Keyboard input gets an immediate frame
                if is_key && app.is_running() && app.take_dirty() {
                    renderer::render(terminal, app)?;
                }
            }
        }
    }

    app.finish();
    Ok(())
}

/// Show every pod in its own pane until the operator quits.
///
/// On return `cancel` has fired, so every reader has dropped its stream.
pub async fn run_dashboard(
    pods: Vec<Pod>,
    buffer_size: usize,
    cancel: CancellationToken,
) -> Result<(), TailError> {
    let mut tui = terminal::Tui::new().map_err(TailError::RenderInit)?;

    let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(EVENT_QUEUE_SIZE);
    let (panes, mut readers) = spawn_pane_readers(pods, &event_tx, &cancel);

    let keyboard = tokio::spawn(events::event_loop(event_tx, cancel.clone()));

    let mut app = App::new(panes, buffer_size);
    info!("Dashboard started with {} panes", app.panes.len());
    let result = run_loop(tui.terminal(), &mut app, &mut event_rx).await;

    cancel.cancel();
    drop(event_rx);
    if let Err(e) = tui.restore() {
        warn!("Failed to restore terminal: {}", e);
    }
    while readers.join_next().await.is_some() {}
    let _ = keyboard.await;
    info!("Dashboard {:?}", app.state());

    result.map_err(TailError::Render)
}
