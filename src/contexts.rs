use crate::error::TailError;
use crate::matcher::filter_names;
use crate::providers::ConfigProvider;
use crate::types::Context;
use tracing::debug;

/// Every context known to the configuration, in configuration order.
pub fn retrieve_all_contexts<P: ConfigProvider + ?Sized>(
    provider: &P,
) -> Result<Vec<Context>, TailError> {
    let contexts = provider.list_contexts()?;
    debug!("Found {} contexts in configuration", contexts.len());
    Ok(contexts)
}

/// Contexts matching at least one of `patterns`, or all of them when no
/// pattern is given.
pub fn select_matching_contexts<P: ConfigProvider + ?Sized>(
    provider: &P,
    patterns: &[String],
) -> Result<Vec<Context>, TailError> {
    let contexts = retrieve_all_contexts(provider)?;
    if patterns.is_empty() {
        return Ok(contexts);
    }
    Ok(filter_names(contexts, patterns).selected)
}
