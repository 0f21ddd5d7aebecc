//! Device-type library import, run in-cluster as a one-shot batch Job.

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tera::{Context, Tera};

use crate::config::Config;
use crate::error::RunError;
use crate::kubectl::{JobRunner, JobWait, Kubectl};
use crate::netbox::NetBoxClient;
use crate::utils::{indent, split_list};

pub const DEFAULT_VENDORS: &str = "nokia";
pub const DEFAULT_LIBRARY_URL: &str = "https://github.com/netbox-community/devicetype-library.git";
pub const DEFAULT_LIBRARY_BRANCH: &str = "master";
pub const DEFAULT_NAMESPACE: &str = "netbox";
pub const DEFAULT_CLUSTER_NETBOX_URL: &str = "http://netbox-server.netbox.svc.cluster.local";
pub const DEFAULT_IMAGE: &str = "ghcr.io/minitriga/netbox-device-type-library-import:latest";
pub const DEFAULT_TIMEOUT_SECS: u64 = 900;
pub const DEFAULT_READY_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_READY_ATTEMPTS: u32 = 30;

const JOB_TTL_SECS: u64 = 600;

const JOB_TEMPLATE: &str = r#"apiVersion: batch/v1
kind: Job
metadata:
  name: {{ job_name }}
  namespace: {{ namespace }}
spec:
  ttlSecondsAfterFinished: {{ ttl }}
  template:
    spec:
      restartPolicy: Never
      containers:
        - name: importer
          image: {{ image | json_encode() }}
          env:
            - name: NETBOX_URL
              value: {{ netbox_url | json_encode() }}
            - name: VENDORS
              value: {{ vendors | join(sep=",") | json_encode() }}
            - name: REPO_URL
              value: {{ library_url | json_encode() }}
            - name: REPO_BRANCH
              value: {{ library_branch | json_encode() }}
            - name: NETBOX_TOKEN
              valueFrom:
                secretKeyRef:
                  name: {{ secret_name }}
                  key: {{ secret_key }}
"#;

#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub vendors: Vec<String>,
    pub library_url: String,
    pub library_branch: String,
    pub namespace: String,
    /// NetBox URL as seen from inside the cluster
    pub cluster_netbox_url: String,
    pub image: String,
    pub secret_name: String,
    pub secret_key: String,
    pub timeout: Duration,
    pub ready_interval: Duration,
    pub ready_attempts: u32,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            vendors: vec![DEFAULT_VENDORS.to_string()],
            library_url: DEFAULT_LIBRARY_URL.to_string(),
            library_branch: DEFAULT_LIBRARY_BRANCH.to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            cluster_netbox_url: DEFAULT_CLUSTER_NETBOX_URL.to_string(),
            image: DEFAULT_IMAGE.to_string(),
            secret_name: "netbox-server-superuser".to_string(),
            secret_key: "api_token".to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            ready_interval: Duration::from_secs(DEFAULT_READY_INTERVAL_SECS),
            ready_attempts: DEFAULT_READY_ATTEMPTS,
        }
    }
}

impl ImportOptions {
    /// Point the Job at `netbox_url` when no in-cluster URL was given
    pub fn with_cluster_url_fallback(mut self, netbox_url: &str) -> Self {
        if self.cluster_netbox_url.trim().is_empty() {
            self.cluster_netbox_url = netbox_url.to_string();
        }
        self
    }
}

/// Parse the `--vendors` list; at least one vendor is required
pub fn parse_vendors(raw: &str) -> Result<Vec<String>, RunError> {
    let vendors = split_list(raw);
    if vendors.is_empty() {
        return Err(RunError::InvalidInput("--vendors must name at least one vendor".to_string()));
    }
    Ok(vendors)
}

pub fn job_name(now: DateTime<Utc>) -> String {
    format!("netbox-dtl-import-{}", now.timestamp())
}

pub fn render_job_manifest(opts: &ImportOptions, job_name: &str) -> Result<String> {
    let mut tera = Tera::default();
    tera.add_raw_template("job", JOB_TEMPLATE)
        .map_err(|e| anyhow::anyhow!("Invalid job template: {}", e))?;

    let mut context = Context::new();
    context.insert("job_name", job_name);
    context.insert("namespace", &opts.namespace);
    context.insert("ttl", &JOB_TTL_SECS);
    context.insert("image", &opts.image);
    context.insert("netbox_url", opts.cluster_netbox_url.trim_end_matches('/'));
    context.insert("vendors", &opts.vendors);
    context.insert("library_url", &opts.library_url);
    context.insert("library_branch", &opts.library_branch);
    context.insert("secret_name", &opts.secret_name);
    context.insert("secret_key", &opts.secret_key);

    tera.render("job", &context)
        .map_err(|e| anyhow::anyhow!("Job manifest rendering failed: {}", e))
}

/// Submit the Job, wait for it, and print its logs whatever the result
pub async fn run_job(runner: &dyn JobRunner, opts: &ImportOptions, job_name: &str) -> Result<(), RunError> {
    let manifest = render_job_manifest(opts, job_name).map_err(|e| RunError::JobFailed {
        job: job_name.to_string(),
        detail: e.to_string(),
    })?;

    tracing::info!("Creating importer job {} in namespace {}...", job_name, opts.namespace);
    runner.apply(&manifest).await.map_err(|e| RunError::JobFailed {
        job: job_name.to_string(),
        detail: format!("could not create job: {}", e),
    })?;

    tracing::info!("Waiting up to {}s for {} to complete...", opts.timeout.as_secs(), job_name);
    let wait = runner.wait_for_completion(&opts.namespace, job_name, opts.timeout).await;

    let logs = runner.logs(&opts.namespace, job_name).await;
    if !logs.stdout.trim().is_empty() {
        tracing::info!("Importer output:\n{}", indent(logs.stdout.trim_end(), "    "));
    }
    if !logs.stderr.trim().is_empty() {
        tracing::warn!("Importer errors:\n{}", indent(logs.stderr.trim_end(), "    "));
    }

    match wait {
        JobWait::Completed => {
            tracing::info!("Device-type import completed");
            Ok(())
        }
        JobWait::TimedOut(_) => Err(RunError::JobTimedOut {
            job: job_name.to_string(),
            timeout: opts.timeout,
        }),
        JobWait::Failed(reason) => {
            let detail = match runner.describe(&opts.namespace, job_name).await {
                Some(description) => format!("{}\n{}", reason, indent(description.trim_end(), "    ")),
                None => reason,
            };
            Err(RunError::JobFailed {
                job: job_name.to_string(),
                detail,
            })
        }
    }
}

/// The `import-device-types` command
pub async fn run(cfg: &Config, opts: &ImportOptions) -> Result<()> {
    let netbox_url = cfg.read_netbox_url()?;
    tracing::info!("NetBox URL: {}", netbox_url);
    tracing::info!("Vendors: {}", opts.vendors.join(", "));

    // The readiness probe is unauthenticated and never verifies certificates
    let nb = NetBoxClient::anonymous(netbox_url.clone(), cfg.http_timeout(), true)?;
    if !nb.wait_until_ready(opts.ready_attempts, opts.ready_interval).await {
        return Err(RunError::RemoteUnavailable {
            url: netbox_url,
            attempts: opts.ready_attempts,
        }
        .into());
    }

    let opts = opts.clone().with_cluster_url_fallback(&netbox_url);
    let kubectl = Kubectl::new(cfg.kubectl.clone());
    run_job(&kubectl, &opts, &job_name(Utc::now())).await?;
    Ok(())
}
