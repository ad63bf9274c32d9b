use thiserror::Error;

/// Errors raised while selecting pods and tailing their logs.
///
/// Only `ConfigRead` and `RenderInit` abort a run. Everything else is
/// contained where it happens and reported to the diagnostic log.
#[derive(Debug, Error)]
pub enum TailError {
    #[error("failed to read cluster configuration: {0}")]
    ConfigRead(String),

    #[error("[{context}] failed to list pods: {message}")]
    Query { context: String, message: String },

    #[error("[{context}] failed to start log source for pod {pod}: {message}")]
    StreamSpawn {
        context: String,
        pod: String,
        message: String,
    },

    #[error("failed to read log stream of {pod}: {source}")]
    StreamRead {
        pod: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to initialize the dashboard: {0}")]
    RenderInit(#[source] std::io::Error),

    #[error("dashboard rendering failed: {0}")]
    Render(#[source] std::io::Error),

    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

impl TailError {
    /// Whether the whole run has to stop.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            TailError::ConfigRead(_) | TailError::RenderInit(_) | TailError::Render(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(TailError::ConfigRead("missing".into()).is_fatal());
        assert!(TailError::RenderInit(std::io::Error::other("no tty")).is_fatal());
        assert!(
            !TailError::Query {
                context: "c1".into(),
                message: "timeout".into()
            }
            .is_fatal()
        );
        assert!(
            !TailError::StreamSpawn {
                context: "c1".into(),
                pod: "p1".into(),
                message: "not found".into()
            }
            .is_fatal()
        );
    }

    #[test]
    fn test_messages_name_the_context() {
        let err = TailError::Query {
            context: "prod-eu".into(),
            message: "forbidden".into(),
        };
        assert_eq!(err.to_string(), "[prod-eu] failed to list pods: forbidden");
    }
}
