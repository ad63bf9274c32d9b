mod cli;
mod contexts;
mod error;
mod kubernetes;
mod matcher;
mod output;
mod pods;
mod providers;
mod supervisor;
mod tail;
mod types;
mod ui;
mod utils;

use clap::Parser;
use std::io::IsTerminal;
use tracing::{debug, error, warn};

use cli::{Backend, Cli};
use error::TailError;
use kubernetes::{KubeCluster, KubeconfigProvider, KubectlLogSource};
use types::{LineConfig, Mode, TailOptions};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Determine if we'll use TUI mode (needed to configure logging appropriately)
    let mode = if !cli.raw && std::io::stdout().is_terminal() {
        Mode::Dashboard
    } else {
        Mode::Raw
    };

    init_tracing(&cli, mode);

    let options = TailOptions {
        context_patterns: cli.contexts.clone(),
        pod_patterns: cli.pods.clone(),
        mode,
        line_config: LineConfig {
            show_context_name: cli.context_name,
            show_pod_name: cli.pod_name,
        },
        since: cli.since(),
        max_concurrency: cli.max_concurrency.max(1),
        pane_capacity: cli.buffer_size.max(1),
    };
    debug!("Running with {:?}", options);

    match run(&cli, options).await {
        Err(e) if e.is_fatal() => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
        Err(e) => warn!("{}", e),
        Ok(()) => {}
    }
    Ok(())
}

async fn run(cli: &Cli, options: TailOptions) -> Result<(), TailError> {
    let config = KubeconfigProvider::load(cli.kubeconfig.as_ref())?;
    let cluster = KubeCluster::new(config.kubeconfig().clone(), cli.namespace.clone());

    match cli.backend {
        Backend::Api => tail::run(&config, &cluster, &cluster, options).await,
        Backend::Kubectl => {
            let source = KubectlLogSource::new(cli.kubeconfig.clone(), cli.namespace.clone());
            tail::run(&config, &cluster, &source, options).await
        }
    }
}

fn init_tracing(cli: &Cli, mode: Mode) {
    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter))
    };

    match mode {
        Mode::Dashboard => {
            // In TUI mode: write logs to a file to avoid corrupting the display
            let log_file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&cli.log_file);

            match log_file {
                Ok(file) => tracing_subscriber::fmt()
                    .with_env_filter(env_filter())
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(std::sync::Mutex::new(file))
                    .init(),
                Err(e) => {
                    eprintln!(
                        "Warning: Could not open {} for logging: {}",
                        cli.log_file.display(),
                        e
                    );
                    tracing_subscriber::fmt()
                        .with_env_filter(env_filter())
                        .with_writer(std::io::sink)
                        .init();
                }
            }
        }
        Mode::Raw => {
            // Log lines own stdout, diagnostics go to stderr
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}
