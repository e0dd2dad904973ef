//! Spawns plugin executables and exchanges JSON over their standard streams.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{info, warn};

use kakoi_types::RiskCategory;

pub const MODE_GET_INFO: &str = "-get-info";
pub const MODE_GENERATE_RISKS: &str = "-generate-risks";
pub const MODE_EXPLAIN_RISK: &str = "-explain-risk";

#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    #[error("plugin {path:?} is not accessible: {source}")]
    NotAccessible {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("plugin {path:?} is not a regular file")]
    NotRegularFile { path: PathBuf },
    #[error("failed to spawn plugin {path:?}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write plugin stdin for {path:?}: {source}")]
    Stdin {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("plugin {path:?} failed ({status}): {stderr}")]
    Failed {
        path: PathBuf,
        status: String,
        stderr: String,
    },
    #[error("plugin {path:?} timed out after {seconds}s")]
    Timeout { path: PathBuf, seconds: u64 },
    #[error("failed to encode plugin input: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("failed to decode plugin output: {0}")]
    Decode(#[source] serde_json::Error),
}

/// One runner per plugin executable. Each protocol call spawns a fresh
/// process and blocks on its full lifecycle; calls never overlap.
#[derive(Debug, Clone)]
pub struct PluginRunner {
    path: PathBuf,
    timeout: Option<Duration>,
}

impl PluginRunner {
    /// Validates that the path exists and is a regular file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PluginError> {
        let path = path.as_ref().to_path_buf();
        let metadata = std::fs::metadata(&path).map_err(|source| PluginError::NotAccessible {
            path: path.clone(),
            source,
        })?;
        if !metadata.is_file() {
            return Err(PluginError::NotRegularFile { path });
        }
        Ok(Self {
            path,
            timeout: None,
        })
    }

    /// Hardening addition over the fire-and-block original: bound the wait on
    /// the child process. Disabled by default.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// One protocol exchange: spawn with the given arguments (the first being
    /// the mode flag), write the JSON input (literal `null` when there is
    /// none) to stdin, close it, capture both output streams, wait. A
    /// non-zero exit surfaces the captured stderr verbatim; on success stdout
    /// is decoded as JSON into the requested output type.
    pub async fn run<I, O>(&self, input: Option<&I>, args: &[&str]) -> Result<O, PluginError>
    where
        I: Serialize + ?Sized,
        O: DeserializeOwned,
    {
        let payload = match input {
            Some(value) => serde_json::to_vec(value).map_err(PluginError::Encode)?,
            None => b"null".to_vec(),
        };

        let mut child = Command::new(&self.path)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| PluginError::Spawn {
                path: self.path.clone(),
                source,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            // a plugin may exit without ever reading its input
            if let Err(source) = stdin.write_all(&payload).await {
                if source.kind() != std::io::ErrorKind::BrokenPipe {
                    return Err(PluginError::Stdin {
                        path: self.path.clone(),
                        source,
                    });
                }
            }
            // closes the stream so the child sees EOF
            drop(stdin);
        }

        let wait = child.wait_with_output();
        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, wait)
                .await
                .map_err(|_| PluginError::Timeout {
                    path: self.path.clone(),
                    seconds: limit.as_secs(),
                })?,
            None => wait.await,
        }
        .map_err(|source| PluginError::Spawn {
            path: self.path.clone(),
            source,
        })?;

        if !output.status.success() {
            return Err(PluginError::Failed {
                path: self.path.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        serde_json::from_slice(&output.stdout).map_err(PluginError::Decode)
    }
}

/// What a plugin reports about itself on `-get-info`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PluginInfo {
    pub id: String,
    #[serde(default)]
    pub category: RiskCategory,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A discovered custom rule: its self-reported info plus the runner to
/// invoke it with later.
#[derive(Debug, Clone)]
pub struct CustomRuleSpec {
    pub id: String,
    pub category: RiskCategory,
    pub tags: Vec<String>,
    pub runner: PluginRunner,
}

/// Loads custom rules by asking each executable for its info. Failures are
/// logged as warnings and the offending plugin is skipped; a broken plugin
/// never aborts the run.
pub async fn load_custom_rules(
    plugin_paths: &[PathBuf],
    timeout: Option<Duration>,
) -> Vec<CustomRuleSpec> {
    let mut rules = Vec::new();
    for path in plugin_paths {
        let runner = match PluginRunner::load(path) {
            Ok(runner) => match timeout {
                Some(limit) => runner.with_timeout(limit),
                None => runner,
            },
            Err(error) => {
                warn!(plugin = %path.display(), %error, "custom risk rule not loaded");
                continue;
            }
        };
        let info: PluginInfo = match runner.run::<(), _>(None, &[MODE_GET_INFO]).await {
            Ok(info) => info,
            Err(error) => {
                warn!(plugin = %path.display(), %error, "failed to get info for custom risk rule");
                continue;
            }
        };
        info!(plugin = %path.display(), id = %info.id, "custom risk rule loaded");
        rules.push(CustomRuleSpec {
            id: info.id,
            category: info.category,
            tags: info.tags,
            runner,
        });
    }
    rules
}
