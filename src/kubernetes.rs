use crate::error::TailError;
use crate::providers::{ClusterQuery, ConfigProvider, LogSource};
use crate::types::{Context, LogStream};
use k8s_openapi::api::core::v1::Pod;
use kube::api::{ListParams, LogParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Api, Client, Config, ResourceExt};
use std::collections::HashMap;
use std::path::PathBuf;
use std::pin::Pin;
use std::process::Stdio;
use std::task::{Context as TaskContext, Poll};
use std::time::Duration;
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, ReadBuf,
};
use tokio::process::{Child, ChildStdout, Command};
use tokio::sync::{Mutex, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Bytes buffered between the API forwarding task and the pod reader.
const PIPE_CAPACITY: usize = 64 * 1024;

fn read_kubeconfig(path: Option<&PathBuf>) -> Result<Kubeconfig, TailError> {
    let kubeconfig = match path {
        Some(path) => Kubeconfig::read_from(path),
        None => Kubeconfig::read(),
    };
    kubeconfig.map_err(|e| TailError::ConfigRead(e.to_string()))
}

/// Contexts listed in the kubeconfig (`$KUBECONFIG` or `~/.kube/config`).
pub struct KubeconfigProvider {
    kubeconfig: Kubeconfig,
}

impl KubeconfigProvider {
    pub fn load(path: Option<&PathBuf>) -> Result<Self, TailError> {
        Ok(Self {
            kubeconfig: read_kubeconfig(path)?,
        })
    }

    pub fn kubeconfig(&self) -> &Kubeconfig {
        &self.kubeconfig
    }
}

impl ConfigProvider for KubeconfigProvider {
    fn list_contexts(&self) -> Result<Vec<Context>, TailError> {
        Ok(self
            .kubeconfig
            .contexts
            .iter()
            .map(|c| c.name.clone())
            .collect())
    }
}

/// Kubernetes API access for every context of one kubeconfig.
///
/// Clients are created lazily, once per context, and reused for the pod
/// listing and the log streams.
pub struct KubeCluster {
    kubeconfig: Kubeconfig,
    namespace: Option<String>,
    clients: Mutex<HashMap<String, (Client, String)>>,
}

impl KubeCluster {
    pub fn new(kubeconfig: Kubeconfig, namespace: Option<String>) -> Self {
        Self {
            kubeconfig,
            namespace,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Client and namespace to use for `context`.
    async fn client_for(&self, context: &str) -> anyhow::Result<(Client, String)> {
        if let Some(entry) = self.clients.lock().await.get(context) {
            return Ok(entry.clone());
        }

        let config = Config::from_custom_kubeconfig(
            self.kubeconfig.clone(),
            &KubeConfigOptions {
                context: Some(context.to_string()),
                ..Default::default()
            },
        )
        .await
        .map_err(|e| anyhow::anyhow!("Context '{}' not usable: {}", context, e))?;
        let namespace = self
            .namespace
            .clone()
            .unwrap_or_else(|| config.default_namespace.clone());
        let client = Client::try_from(config)?;
        info!("[{}] Initialized client, namespace {}", context, namespace);

        let entry = (client, namespace);
        self.clients
            .lock()
            .await
            .insert(context.to_string(), entry.clone());
        Ok(entry)
    }
}

impl ClusterQuery for KubeCluster {
    async fn list_pods(&self, context: &str) -> Result<Vec<String>, TailError> {
        let query_error = |message: String| TailError::Query {
            context: context.to_string(),
            message,
        };

        let (client, namespace) = self
            .client_for(context)
            .await
            .map_err(|e| query_error(e.to_string()))?;
        let api: Api<Pod> = Api::namespaced(client, &namespace);
        let pods = api
            .list(&ListParams::default())
            .await
            .map_err(|e| query_error(e.to_string()))?;

        Ok(pods.items.iter().map(|pod| pod.name_any()).collect())
    }
}

impl LogSource for KubeCluster {
    async fn open(
        &self,
        context: &str,
        pod: &str,
        since: Option<Duration>,
    ) -> Result<LogStream, TailError> {
        let spawn_error = |message: String| TailError::StreamSpawn {
            context: context.to_string(),
            pod: pod.to_string(),
            message,
        };

        let (client, namespace) = self
            .client_for(context)
            .await
            .map_err(|e| spawn_error(e.to_string()))?;
        let api: Api<Pod> = Api::namespaced(client, &namespace);
        let params = LogParams {
            follow: true,
            since_seconds: since.map(since_seconds),
            ..Default::default()
        };

        let (ready_tx, ready_rx) = oneshot::channel();
        let (mut writer, reader) = tokio::io::duplex(PIPE_CAPACITY);
        let closed = CancellationToken::new();
        let reader_gone = closed.clone();
        let cluster = context.to_string();
        let pod_name = pod.to_string();

        tokio::spawn(async move {
            let logs = match api.log_stream(&pod_name, &params).await {
                Ok(logs) => {
                    let _ = ready_tx.send(Ok(()));
                    logs
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };

            match pump_logs(logs, &mut writer, &reader_gone).await {
                Ok(()) => debug!("[{}] Log stream of pod {} closed", cluster, pod_name),
                Err(e) => warn!(
                    "[{}] Error reading log stream of pod {}: {}",
                    cluster, pod_name, e
                ),
            }
        });

        match ready_rx.await {
            Ok(Ok(())) => Ok(Box::new(GuardedStream {
                inner: BufReader::new(reader),
                _guard: closed.drop_guard(),
            })),
            Ok(Err(e)) => Err(spawn_error(e.to_string())),
            Err(_) => Err(spawn_error("log task exited before starting".to_string())),
        }
    }
}

/// Follows logs by running `kubectl logs -f` for every pod.
pub struct KubectlLogSource {
    binary: String,
    kubeconfig: Option<PathBuf>,
    namespace: Option<String>,
}

impl KubectlLogSource {
    pub fn new(kubeconfig: Option<PathBuf>, namespace: Option<String>) -> Self {
        Self {
            binary: "kubectl".to_string(),
            kubeconfig,
            namespace,
        }
    }

    #[cfg(test)]
    fn with_binary(mut self, binary: &str) -> Self {
        self.binary = binary.to_string();
        self
    }

    fn command(&self, context: &str, pod: &str, since: Option<Duration>) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg(format!("--context={}", context));
        if let Some(path) = &self.kubeconfig {
            cmd.arg(format!("--kubeconfig={}", path.display()));
        }
        if let Some(namespace) = &self.namespace {
            cmd.arg(format!("--namespace={}", namespace));
        }
        cmd.args(["logs", "-f", pod]);
        if let Some(since) = since {
            cmd.arg(format!("--since={}s", since_seconds(since)));
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

impl LogSource for KubectlLogSource {
    async fn open(
        &self,
        context: &str,
        pod: &str,
        since: Option<Duration>,
    ) -> Result<LogStream, TailError> {
        let spawn_error = |message: String| TailError::StreamSpawn {
            context: context.to_string(),
            pod: pod.to_string(),
            message,
        };

        let mut child = self
            .command(context, pod, since)
            .spawn()
            .map_err(|e| spawn_error(e.to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| spawn_error("stdout not captured".to_string()))?;

        if let Some(stderr) = child.stderr.take() {
            let cluster = context.to_string();
            let pod_name = pod.to_string();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    warn!("[{}] kubectl logs {}: {}", cluster, pod_name, line);
                }
            });
        }

        Ok(Box::new(GuardedStream {
            inner: BufReader::new(stdout),
            _guard: child,
        }))
    }
}

/// Copy raw log bytes into `pipe`, one line per write, until the logs end,
/// the pipe's reader hangs up or `reader_gone` fires.
///
/// Only read errors are reported. Decoding is left to the pod reader.
async fn pump_logs<R, W>(
    mut logs: R,
    pipe: &mut W,
    reader_gone: &CancellationToken,
) -> std::io::Result<()>
where
    R: futures::AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut line = Vec::new();
    loop {
        line.clear();
        let read = tokio::select! {
            _ = reader_gone.cancelled() => return Ok(()),
            read = futures::AsyncBufReadExt::read_until(&mut logs, b'\n', &mut line) => read?,
        };
        if read == 0 {
            return Ok(());
        }

        tokio::select! {
            _ = reader_gone.cancelled() => return Ok(()),
            written = pipe.write_all(&line) => {
                if written.is_err() {
                    return Ok(());
                }
            }
        }
    }
}

/// Log reader that owns whatever keeps its source alive: the `kubectl`
/// process, or the guard stopping the API forwarding task on drop.
struct GuardedStream<R, G> {
    inner: R,
    _guard: G,
}

impl<R: AsyncRead + Unpin, G: Unpin> AsyncRead for GuardedStream<R, G> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut TaskContext<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_read(cx, buf)
    }
}

impl<R: AsyncBufRead + Unpin, G: Unpin> AsyncBufRead for GuardedStream<R, G> {
    fn poll_fill_buf(
        self: Pin<&mut Self>,
        cx: &mut TaskContext<'_>,
    ) -> Poll<std::io::Result<&[u8]>> {
        Pin::new(&mut self.get_mut().inner).poll_fill_buf(cx)
    }

    fn consume(self: Pin<&mut Self>, amt: usize) {
        Pin::new(&mut self.get_mut().inner).consume(amt)
    }
}

/// Seconds for `--since`, rounded up and never below one.
fn since_seconds(since: Duration) -> i64 {
    let secs = since
        .as_secs()
        .saturating_add(u64::from(since.subsec_nanos() > 0))
        .max(1);
    i64::try_from(secs).unwrap_or(i64::MAX)
}
