//! Collaborators the tailer depends on.
//!
//! The selection and streaming code only talks to these traits, so the
//! kubeconfig, the cluster API and the log processes can be swapped for
//! in-memory fakes.

use crate::error::TailError;
use crate::types::{Context, LogStream};
use std::future::Future;
use std::time::Duration;

/// Source of the known contexts.
pub trait ConfigProvider: Send + Sync {
    /// Context names in configuration order.
    fn list_contexts(&self) -> Result<Vec<Context>, TailError>;
}

pub trait ClusterQuery: Send + Sync {
    /// Names of the pods visible in `context`.
    fn list_pods(
        &self,
        context: &str,
    ) -> impl Future<Output = Result<Vec<String>, TailError>> + Send;
}

pub trait LogSource: Send + Sync {
    /// Start following the logs of `pod`, optionally limited to the last `since`.
    fn open(
        &self,
        context: &str,
        pod: &str,
        since: Option<Duration>,
    ) -> impl Future<Output = Result<LogStream, TailError>> + Send;
}

#[cfg(test)]
pub mod fakes {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tokio::io::{BufReader, DuplexStream};

    pub struct StaticConfig {
        pub contexts: Result<Vec<String>, String>,
    }

    impl StaticConfig {
        pub fn new(contexts: &[&str]) -> Self {
            Self {
                contexts: Ok(contexts.iter().map(|c| c.to_string()).collect()),
            }
        }

        pub fn broken(message: &str) -> Self {
            Self {
                contexts: Err(message.to_string()),
            }
        }
    }

    impl ConfigProvider for StaticConfig {
        fn list_contexts(&self) -> Result<Vec<Context>, TailError> {
            self.contexts.clone().map_err(TailError::ConfigRead)
        }
    }

    /// Cluster answering from a fixed table; unknown contexts fail.
    #[derive(Default)]
    pub struct FakeCluster {
        pods: HashMap<String, Result<Vec<String>, String>>,
    }

    impl FakeCluster {
        pub fn with_pods(mut self, context: &str, pods: &[&str]) -> Self {
            self.pods.insert(
                context.to_string(),
                Ok(pods.iter().map(|p| p.to_string()).collect()),
            );
            self
        }

        pub fn with_failure(mut self, context: &str, message: &str) -> Self {
            self.pods
                .insert(context.to_string(), Err(message.to_string()));
            self
        }
    }

    impl ClusterQuery for FakeCluster {
        async fn list_pods(&self, context: &str) -> Result<Vec<String>, TailError> {
            tokio::task::yield_now().await;
            match self.pods.get(context) {
                Some(Ok(pods)) => Ok(pods.clone()),
                Some(Err(message)) => Err(TailError::Query {
                    context: context.to_string(),
                    message: message.clone(),
                }),
                None => Err(TailError::Query {
                    context: context.to_string(),
                    message: "unknown context".to_string(),
                }),
            }
        }
    }

    enum Script {
        Lines(Vec<String>),
        Endless,
        Fail(String),
    }

    /// Log source replaying canned output per `(context, pod)`.
    #[derive(Default)]
    pub struct FakeLogSource {
        scripts: HashMap<(String, String), Script>,
        /// Writer halves of endless streams, kept so they never hit EOF.
        held: Mutex<Vec<DuplexStream>>,
        pub opened: Mutex<Vec<(String, String, Option<Duration>)>>,
    }

    impl FakeLogSource {
        pub fn with_lines(mut self, context: &str, pod: &str, lines: &[&str]) -> Self {
            self.scripts.insert(
                (context.to_string(), pod.to_string()),
                Script::Lines(lines.iter().map(|l| l.to_string()).collect()),
            );
            self
        }

        pub fn with_generated(mut self, context: &str, pod: &str, count: usize) -> Self {
            let lines = (0..count).map(|i| format!("{} line {}", pod, i)).collect();
            self.scripts.insert(
                (context.to_string(), pod.to_string()),
                Script::Lines(lines),
            );
            self
        }

        pub fn with_endless(mut self, context: &str, pod: &str) -> Self {
            self.scripts
                .insert((context.to_string(), pod.to_string()), Script::Endless);
            self
        }

        pub fn with_failure(mut self, context: &str, pod: &str, message: &str) -> Self {
            self.scripts.insert(
                (context.to_string(), pod.to_string()),
                Script::Fail(message.to_string()),
            );
            self
        }
    }

    impl LogSource for FakeLogSource {
        async fn open(
            &self,
            context: &str,
            pod: &str,
            since: Option<Duration>,
        ) -> Result<LogStream, TailError> {
            self.opened
                .lock()
                .unwrap()
                .push((context.to_string(), pod.to_string(), since));

            match self.scripts.get(&(context.to_string(), pod.to_string())) {
                Some(Script::Lines(lines)) => {
                    let mut body = String::new();
                    for line in lines {
                        body.push_str(line);
                        body.push('\n');
                    }
                    Ok(Box::new(std::io::Cursor::new(body.into_bytes())))
                }
                Some(Script::Endless) => {
                    let (writer, reader) = tokio::io::duplex(64);
                    self.held.lock().unwrap().push(writer);
                    Ok(Box::new(BufReader::new(reader)))
                }
                Some(Script::Fail(message)) => Err(TailError::StreamSpawn {
                    context: context.to_string(),
                    pod: pod.to_string(),
                    message: message.clone(),
                }),
                None => Ok(Box::new(std::io::Cursor::new(Vec::new()))),
            }
        }
    }
}
