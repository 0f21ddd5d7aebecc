use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::RunError;

/// File holding the externally reachable NetBox URL
pub const NETBOX_URL_FILE: &str = ".netbox_url";
/// File holding the EDA API address the webhook points at
pub const EDA_API_FILE: &str = ".eda_api_address";

/// Config holds all application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub state_dir: PathBuf,
    /// Token override; when unset the token is read from the cluster secret
    pub netbox_token: Option<String>,
    pub namespace: String,
    pub secret_name: String,
    pub secret_key: String,
    pub kubectl: String,
    pub tenant_name: String,
    pub http_timeout_secs: u64,
    pub ready_retries: u32,
    pub ready_interval_secs: u64,
    pub accept_invalid_certs: bool,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn load() -> Self {
        Self {
            state_dir: PathBuf::from(get_env("EDA_NETBOX_STATE_DIR", ".")),
            netbox_token: env::var("NETBOX_TOKEN").ok().filter(|t| !t.trim().is_empty()),
            namespace: get_env("NETBOX_NAMESPACE", "netbox"),
            secret_name: get_env("NETBOX_SECRET_NAME", "netbox-server-superuser"),
            secret_key: get_env("NETBOX_SECRET_KEY", "api_token"),
            kubectl: get_env("KUBECTL", "kubectl"),
            tenant_name: get_env("EDA_TENANT", "eda"),
            http_timeout_secs: get_env("NETBOX_HTTP_TIMEOUT", "30").parse().unwrap_or(30),
            ready_retries: get_env("NETBOX_READY_RETRIES", "30").parse().unwrap_or(30),
            ready_interval_secs: get_env("NETBOX_READY_INTERVAL", "10").parse().unwrap_or(10),
            accept_invalid_certs: matches!(
                get_env("NETBOX_INSECURE", "false").to_lowercase().as_str(),
                "1" | "true" | "yes"
            ),
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn ready_interval(&self) -> Duration {
        Duration::from_secs(self.ready_interval_secs)
    }

    pub fn read_netbox_url(&self) -> Result<String, RunError> {
        read_state_file(&self.state_dir, NETBOX_URL_FILE)
    }

    pub fn read_eda_api_address(&self) -> Result<String, RunError> {
        read_state_file(&self.state_dir, EDA_API_FILE)
    }
}

fn get_env(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read a trimmed, non-empty value written by the deployment step
fn read_state_file(dir: &Path, name: &str) -> Result<String, RunError> {
    let path = dir.join(name);
    let value = std::fs::read_to_string(&path).map_err(|e| {
        RunError::PreconditionMissing(format!(
            "{} could not be read ({}). Deploy NetBox with init.sh first.",
            path.display(),
            e
        ))
    })?;
    let value = value.trim();
    if value.is_empty() {
        return Err(RunError::PreconditionMissing(format!("{} is empty", path.display())));
    }
    Ok(value.to_string())
}
