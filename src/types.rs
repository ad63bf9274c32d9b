use std::fmt;
use std::time::Duration;

/// Name of a kubeconfig context.
pub type Context = String;

/// Newline-delimited log records of one pod.
pub type LogStream = Box<dyn tokio::io::AsyncBufRead + Send + Unpin>;

pub struct Pod {
    pub context: Context,
    pub name: String,
    /// Set by the stream supervisor once the log source is open.
    pub stream: Option<LogStream>,
}

impl Pod {
    pub fn new(context: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            name: name.into(),
            stream: None,
        }
    }

    /// Unique key of the pod within a run.
    pub fn id(&self) -> String {
        format!("{}-{}", self.context, self.name)
    }
}

impl fmt::Debug for Pod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pod")
            .field("context", &self.context)
            .field("name", &self.name)
            .field("stream", &self.stream.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineConfig {
    pub show_context_name: bool,
    pub show_pod_name: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Raw,
    Dashboard,
}

/// Everything `tail::run` needs besides the providers.
#[derive(Debug, Clone)]
pub struct TailOptions {
    pub context_patterns: Vec<String>,
    pub pod_patterns: Vec<String>,
    pub mode: Mode,
    pub line_config: LineConfig,
    pub since: Option<Duration>,
    pub max_concurrency: usize,
    pub pane_capacity: usize,
}

impl Default for TailOptions {
    fn default() -> Self {
        Self {
            context_patterns: Vec::new(),
            pod_patterns: Vec::new(),
            mode: Mode::Raw,
            line_config: LineConfig::default(),
            since: None,
            max_concurrency: 16,
            pane_capacity: 1000,
        }
    }
}
