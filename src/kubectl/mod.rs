//! Thin wrapper over the `kubectl` CLI: the cluster secret holding the
//! NetBox token and the batch Job running the device-type importer.

mod credentials;

pub use credentials::{decode_token, provider_from_config, CredentialProvider, KubectlSecret, StaticToken};

use anyhow::Result;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Captured result of one kubectl invocation
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// How waiting for a Job ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobWait {
    Completed,
    TimedOut(String),
    Failed(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobLogs {
    pub stdout: String,
    pub stderr: String,
}

/// Runs a declarative batch Job and reports on it
#[async_trait]
pub trait JobRunner: Send + Sync {
    /// Submit the Job manifest
    async fn apply(&self, manifest: &str) -> Result<()>;

    async fn wait_for_completion(&self, namespace: &str, job: &str, timeout: Duration) -> JobWait;

    /// Human-readable description, used to diagnose a failed Job
    async fn describe(&self, namespace: &str, job: &str) -> Option<String>;

    async fn logs(&self, namespace: &str, job: &str) -> JobLogs;
}

#[derive(Debug, Clone)]
pub struct Kubectl {
    binary: String,
}

impl Kubectl {
    pub fn new(binary: impl Into<String>) -> Self {
        Self { binary: binary.into() }
    }

    /// Run kubectl with `args`, feeding `stdin` when given
    pub async fn run(&self, args: &[&str], stdin: Option<&str>) -> Result<CommandOutput> {
        tracing::debug!("Running {} {}", self.binary, args.join(" "));
        let mut child = Command::new(&self.binary)
            .args(args)
            .stdin(if stdin.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| anyhow::anyhow!("Failed to run {}: {}", self.binary, e))?;

        if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
            pipe.write_all(input.as_bytes()).await?;
        }

        let output = child.wait_with_output().await?;
        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[async_trait]
impl JobRunner for Kubectl {
    async fn apply(&self, manifest: &str) -> Result<()> {
        let out = self.run(&["apply", "-f", "-"], Some(manifest)).await?;
        if !out.success {
            anyhow::bail!("{}", out.stderr.trim());
        }
        tracing::info!("{}", out.stdout.trim());
        Ok(())
    }

    async fn wait_for_completion(&self, namespace: &str, job: &str, timeout: Duration) -> JobWait {
        let target = format!("job/{}", job);
        let timeout_arg = format!("--timeout={}s", timeout.as_secs());
        let args = ["wait", "--for=condition=complete", target.as_str(), "-n", namespace, timeout_arg.as_str()];

        match self.run(&args, None).await {
            Ok(out) if out.success => JobWait::Completed,
            Ok(out) if out.stderr.contains("timed out") => JobWait::TimedOut(out.stderr.trim().to_string()),
            Ok(out) => JobWait::Failed(out.stderr.trim().to_string()),
            Err(e) => JobWait::Failed(e.to_string()),
        }
    }

    async fn describe(&self, namespace: &str, job: &str) -> Option<String> {
        let target = format!("job/{}", job);
        match self.run(&["describe", target.as_str(), "-n", namespace], None).await {
            Ok(out) if !out.stdout.trim().is_empty() => Some(out.stdout),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("Failed to describe {}: {}", target, e);
                None
            }
        }
    }

    async fn logs(&self, namespace: &str, job: &str) -> JobLogs {
        let target = format!("job/{}", job);
        match self.run(&["logs", target.as_str(), "-n", namespace], None).await {
            Ok(out) => JobLogs {
                stdout: out.stdout,
                stderr: out.stderr,
            },
            Err(e) => {
                tracing::warn!("Failed to fetch logs for {}: {}", target, e);
                JobLogs::default()
            }
        }
    }
}
