use crate::utils::parse_duration;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Follow logs through the Kubernetes API
    Api,
    /// Run `kubectl logs -f` for every pod
    Kubectl,
}

#[derive(Parser)]
#[command(name = "mkubetail")]
#[command(about = "Tail several pods on several contexts at the same time")]
pub struct Cli {
    /// Pod name regexes. All pods are tailed if none is given
    pub pods: Vec<String>,

    /// Context name or regex, repeatable. All contexts are used if not specified
    #[arg(short = 'c', long = "context")]
    pub contexts: Vec<String>,

    /// Only return logs newer than a relative duration like 5s, 2m or 4h
    #[arg(long, value_parser = parse_duration, default_value = "0")]
    pub since: Duration,

    /// Prefix each line with the pod's name
    #[arg(short = 'p', long)]
    pub pod_name: bool,

    /// Prefix each line with the pod's context name
    #[arg(short = 'C', long)]
    pub context_name: bool,

    /// Print merged lines instead of the split-pane dashboard
    #[arg(long)]
    pub raw: bool,

    /// How pod logs are followed
    #[arg(long, value_enum, default_value_t = Backend::Api)]
    pub backend: Backend,

    /// Namespace to look for pods in, instead of each context's default
    #[arg(short = 'n', long)]
    pub namespace: Option<String>,

    /// Path to the kubeconfig file
    #[arg(long)]
    pub kubeconfig: Option<PathBuf>,

    /// Maximum number of clusters queried or log sources opened at once
    #[arg(long, default_value_t = 16)]
    pub max_concurrency: usize,

    /// Lines kept per dashboard pane
    #[arg(long, default_value_t = 1000)]
    pub buffer_size: usize,

    /// Diagnostic log file used while the dashboard is shown
    #[arg(long, default_value = "/tmp/mkubetail.log")]
    pub log_file: PathBuf,

    /// Enable verbose logging
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

impl Cli {
    /// `--since 0` means the whole log.
    pub fn since(&self) -> Option<Duration> {
        (!self.since.is_zero()).then_some(self.since)
    }
}
