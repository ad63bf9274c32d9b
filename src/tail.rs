use crate::contexts::select_matching_contexts;
use crate::error::TailError;
use crate::output::print_raw;
use crate::pods::select_matching_pods;
use crate::providers::{ClusterQuery, ConfigProvider, LogSource};
use crate::supervisor::{Started, start_streams};
use crate::types::{Mode, TailOptions};
use crate::ui;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Lines buffered between the raw-mode readers and stdout.
const RAW_QUEUE_SIZE: usize = 1024;

/// Pick the contexts and pods matching `options` and open their log sources.
///
/// Only an unreadable configuration fails; query and spawn failures are
/// returned in `Started::failures` next to the pods that did start.
pub async fn select_and_start<P, Q, S>(
    config: &P,
    cluster: &Q,
    source: &S,
    options: &TailOptions,
) -> Result<Started, TailError>
where
    P: ConfigProvider + ?Sized,
    Q: ClusterQuery + ?Sized,
    S: LogSource + ?Sized,
{
    let contexts = select_matching_contexts(config, &options.context_patterns)?;
    info!("Selected {} contexts: {}", contexts.len(), contexts.join(", "));

    let selection = select_matching_pods(
        cluster,
        &contexts,
        &options.pod_patterns,
        options.max_concurrency,
    )
    .await;

    let mut started = start_streams(
        source,
        selection.pods,
        options.since,
        options.max_concurrency,
    )
    .await;
    let mut failures = selection.failures;
    failures.append(&mut started.failures);
    started.failures = failures;
    Ok(started)
}

/// Tail every matching pod until the streams end or the operator stops it.
pub async fn run<P, Q, S>(
    config: &P,
    cluster: &Q,
    source: &S,
    options: TailOptions,
) -> Result<(), TailError>
where
    P: ConfigProvider + ?Sized,
    Q: ClusterQuery + ?Sized,
    S: LogSource + ?Sized,
{
    let started = select_and_start(config, cluster, source, &options).await?;
    if !started.failures.is_empty() {
        warn!("{} pods or contexts were skipped", started.failures.len());
    }
    if started.pods.is_empty() {
        warn!("No pod to tail");
        return Ok(());
    }

    let cancel = CancellationToken::new();
    match options.mode {
        Mode::Raw => {
            let signal_cancel = cancel.clone();
            let signal = tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Interrupted, stopping readers");
                    signal_cancel.cancel();
                }
            });

            let mut stdout = std::io::stdout();
            let written = print_raw(
                started.pods,
                options.line_config,
                &mut stdout,
                cancel,
                RAW_QUEUE_SIZE,
            )
            .await;
            signal.abort();

            match written {
                Ok(count) => debug!("Wrote {} lines", count),
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                    debug!("Output closed: {}", e)
                }
                Err(e) => warn!("Failed to write output: {}", e),
            }
            Ok(())
        }
        Mode::Dashboard => ui::run_dashboard(started.pods, options.pane_capacity, cancel).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::fakes::{FakeCluster, FakeLogSource, StaticConfig};
    use std::time::Duration;

    fn options(contexts: &[&str], pods: &[&str]) -> TailOptions {
        TailOptions {
            context_patterns: contexts.iter().map(|s| s.to_string()).collect(),
            pod_patterns: pods.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_pipeline_selects_and_starts() {
        let config = StaticConfig::new(&["prod-eu", "prod-us", "staging"]);
        let cluster = FakeCluster::default()
            .with_pods("prod-eu", &["api-1", "db-1"])
            .with_pods("prod-us", &["api-1"])
            .with_pods("staging", &["api-1"]);
        let source = FakeLogSource::default();

        let started = select_and_start(&config, &cluster, &source, &options(&["prod"], &["api"]))
            .await
            .unwrap();

        let ids: Vec<String> = started.pods.iter().map(|p| p.id()).collect();
        assert_eq!(ids, vec!["prod-eu-api-1", "prod-us-api-1"]);
        assert!(started.pods.iter().all(|p| p.stream.is_some()));
        assert!(started.failures.is_empty());
    }

    #[tokio::test]
    async fn test_config_failure_is_fatal() {
        let config = StaticConfig::broken("permission denied");
        let cluster = FakeCluster::default();
        let source = FakeLogSource::default();

        let err = select_and_start(&config, &cluster, &source, &options(&[], &[]))
            .await
            .err()
            .unwrap();

        assert!(err.is_fatal());
        assert!(matches!(err, TailError::ConfigRead(_)));
    }

    #[tokio::test]
    async fn test_recoverable_failures_are_collected() {
        let config = StaticConfig::new(&["a", "b"]);
        let cluster = FakeCluster::default()
            .with_failure("a", "unreachable")
            .with_pods("b", &["web", "worker"]);
        let source = FakeLogSource::default().with_failure("b", "worker", "exec format error");

        let started = select_and_start(&config, &cluster, &source, &options(&[], &[]))
            .await
            .unwrap();

        assert_eq!(started.pods.len(), 1);
        assert_eq!(started.pods[0].name, "web");
        assert!(matches!(
            started.failures.as_slice(),
            [TailError::Query { .. }, TailError::StreamSpawn { .. }]
        ));
    }

    #[tokio::test]
    async fn test_since_reaches_log_source() {
        let config = StaticConfig::new(&["a"]);
        let cluster = FakeCluster::default().with_pods("a", &["web"]);
        let source = FakeLogSource::default();
        let mut opts = options(&[], &[]);
        opts.since = Some(Duration::from_secs(60));

        select_and_start(&config, &cluster, &source, &opts)
            .await
            .unwrap();

        let opened = source.opened.lock().unwrap();
        assert_eq!(
            *opened,
            vec![(
                "a".to_string(),
                "web".to_string(),
                Some(Duration::from_secs(60))
            )]
        );
    }

    #[tokio::test]
    async fn test_run_without_pods_returns() {
        let config = StaticConfig::new(&["a"]);
        let cluster = FakeCluster::default().with_pods("a", &["web"]);
        let source = FakeLogSource::default();
        let mut opts = options(&[], &["nothing-matches"]);
        opts.mode = Mode::Dashboard;

        run(&config, &cluster, &source, opts).await.unwrap();
    }
}
