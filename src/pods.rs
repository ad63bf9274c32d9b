use crate::error::TailError;
use crate::matcher::filter_matching;
use crate::providers::ClusterQuery;
use crate::types::{Context, Pod};
use futures::stream::{self, StreamExt};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Pods found across the queried contexts.
#[derive(Debug, Default)]
pub struct PodSelection {
    pub pods: Vec<Pod>,
    /// Contexts that could not be queried, and patterns that were skipped.
    pub failures: Vec<TailError>,
}

/// Query every context for its pods, at most `max_concurrency` at a time.
///
/// A context whose query fails is logged and contributes no pods. The result
/// is only assembled once every query has finished, sorted and deduplicated
/// on `(context, name)`.
pub async fn retrieve_all_pods<Q: ClusterQuery + ?Sized>(
    query: &Q,
    contexts: &[Context],
    max_concurrency: usize,
) -> PodSelection {
    let results: Vec<(&Context, Result<Vec<String>, TailError>)> = stream::iter(contexts)
        .map(|context| async move { (context, query.list_pods(context).await) })
        .buffer_unordered(max_concurrency.max(1))
        .collect()
        .await;

    let mut set = BTreeMap::new();
    let mut failures = Vec::new();
    for (context, result) in results {
        match result {
            Ok(names) => {
                debug!("[{}] Found {} pods", context, names.len());
                for name in names.into_iter().filter(|n| !n.is_empty()) {
                    set.entry((context.clone(), name.clone()))
                        .or_insert_with(|| Pod::new(context.clone(), name));
                }
            }
            Err(e) => {
                warn!("{}", e);
                failures.push(e);
            }
        }
    }

    PodSelection {
        pods: set.into_values().collect(),
        failures,
    }
}

/// Pods of `contexts` whose name matches at least one of `patterns`, or all
/// of them when no pattern is given.
pub async fn select_matching_pods<Q: ClusterQuery + ?Sized>(
    query: &Q,
    contexts: &[Context],
    patterns: &[String],
    max_concurrency: usize,
) -> PodSelection {
    let mut selection = retrieve_all_pods(query, contexts, max_concurrency).await;
    if !patterns.is_empty() {
        let matches = filter_matching(
            std::mem::take(&mut selection.pods),
            patterns,
            |pod| (pod.context.clone(), pod.name.clone()),
            |pod| pod.name.as_str(),
        );
        selection.pods = matches.selected;
        selection.failures.extend(matches.invalid);
    }
    info!(
        "Selected {} pods across {} contexts",
        selection.pods.len(),
        contexts.len()
    );
    selection
}
