use crate::error::TailError;
use crate::providers::LogSource;
use crate::types::Pod;
use futures::stream::{self, StreamExt};
use std::time::Duration;
use tracing::{debug, warn};

/// Pods whose log source is open, plus the ones that could not be started.
#[derive(Debug, Default)]
pub struct Started {
    pub pods: Vec<Pod>,
    pub failures: Vec<TailError>,
}

/// Open one log source per pod and attach it as the pod's stream.
///
/// Returns as soon as every stream handle is attached; nothing is read here.
/// Pods whose source fails to start are dropped from the result.
pub async fn start_streams<S: LogSource + ?Sized>(
    source: &S,
    pods: Vec<Pod>,
    since: Option<Duration>,
    max_concurrency: usize,
) -> Started {
    let opened: Vec<_> = stream::iter(pods)
        .map(|pod| async move {
            let result = source.open(&pod.context, &pod.name, since).await;
            (pod, result)
        })
        .buffered(max_concurrency.max(1))
        .collect()
        .await;

    let mut started = Started::default();
    for (mut pod, result) in opened {
        match result {
            Ok(stream) => {
                debug!("[{}] Attached log stream for pod {}", pod.context, pod.name);
                pod.stream = Some(stream);
                started.pods.push(pod);
            }
            Err(e) => {
                warn!("{}", e);
                started.failures.push(e);
            }
        }
    }
    started
}
