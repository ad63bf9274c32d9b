use crate::error::TailError;
use crate::types::{LineConfig, LogStream, Pod};
use std::io::Write;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Render one log line with the prefixes selected in `config`.
pub fn format_log_line(content: &str, pod: &Pod, config: &LineConfig) -> String {
    let mut line = String::with_capacity(content.len() + 1);

    if config.show_context_name {
        line.push('[');
        line.push_str(&pod.context);
        line.push(']');
    }
    if config.show_pod_name {
        line.push('[');
        line.push_str(&pod.name);
        line.push(']');
    }
    if config.show_context_name || config.show_pod_name {
        line.push(' ');
    }

    line.push_str(content);
    line.push('\n');
    line
}

/// Forward every line of `stream` through `tx` until end-of-stream,
/// cancellation or a closed receiver.
///
/// Lines are split on `\n`, a trailing `\r` is dropped and invalid UTF-8 is
/// replaced rather than treated as an error.
pub async fn forward_lines<T, F>(
    pod_id: &str,
    stream: LogStream,
    tx: &mpsc::Sender<T>,
    cancel: &CancellationToken,
    map: F,
) -> Result<(), TailError>
where
    F: Fn(String) -> T,
{
    let mut segments = stream.split(b'\n');
    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            next = segments.next_segment() => next,
        };

        let mut segment = match next {
            Ok(Some(segment)) => segment,
            Ok(None) => return Ok(()),
            Err(source) => {
                return Err(TailError::StreamRead {
                    pod: pod_id.to_string(),
                    source,
                });
            }
        };
        if segment.last() == Some(&b'\r') {
            segment.pop();
        }
        let line = String::from_utf8_lossy(&segment).into_owned();

        tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            sent = tx.send(map(line)) => {
                if sent.is_err() {
                    return Ok(());
                }
            }
        }
    }
}

/// Merge the output of every pod into `out`, one formatted line per write.
///
/// Returns the number of lines written once every pod's stream has ended,
/// or earlier if `cancel` fires.
pub async fn print_raw<W: Write>(
    pods: Vec<Pod>,
    config: LineConfig,
    out: &mut W,
    cancel: CancellationToken,
    buffer_size: usize,
) -> std::io::Result<usize> {
    let (tx, mut rx) = mpsc::channel::<String>(buffer_size.max(1));
    let mut readers = JoinSet::new();

    for mut pod in pods {
        let Some(stream) = pod.stream.take() else {
            debug!("[{}] Pod {} has no stream, skipping", pod.context, pod.name);
            continue;
        };
        let tx = tx.clone();
        let cancel = cancel.clone();

        readers.spawn(async move {
            let id = pod.id();
            let result = forward_lines(&id, stream, &tx, &cancel, move |line| {
                format_log_line(&line, &pod, &config)
            })
            .await;
            match result {
                Ok(()) => debug!("Log stream of {} ended", id),
                Err(e) => warn!("{}", e),
            }
        });
    }
    drop(tx);

    let mut written = 0;
    let result = loop {
        let Some(line) = rx.recv().await else {
            break Ok(written);
        };
        if let Err(e) = out.write_all(line.as_bytes()).and_then(|_| out.flush()) {
            break Err(e);
        }
        written += 1;
    };

    if result.is_err() {
        cancel.cancel();
    }
    drop(rx);
    while readers.join_next().await.is_some() {}

    result
}
