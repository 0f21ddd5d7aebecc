//! Command-line interface.

use clap::{Args, Parser, Subcommand};
use std::time::Duration;

use crate::config::Config;
use crate::error::RunError;
use crate::services::import::{self, ImportOptions};

/// Prepare a NetBox instance for the EDA NetBox integration
#[derive(Parser, Debug)]
#[command(name = "eda-netbox", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create or update the webhook, event rule, tags, pools and ranges EDA needs
    Configure,

    /// Delete everything configure created
    Cleanup {
        /// Skip the confirmation prompt
        #[arg(short, long, default_value_t = false)]
        yes: bool,
    },

    /// Import device types from the community library via an in-cluster Job
    ImportDeviceTypes(ImportArgs),
}

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Comma-separated vendor list
    #[arg(long, default_value = import::DEFAULT_VENDORS)]
    pub vendors: String,

    /// Git URL of the device-type library
    #[arg(long, default_value = import::DEFAULT_LIBRARY_URL)]
    pub library_url: String,

    #[arg(long, default_value = import::DEFAULT_LIBRARY_BRANCH)]
    pub library_branch: String,

    /// Namespace the importer Job runs in
    #[arg(long = "k8s-namespace", default_value = import::DEFAULT_NAMESPACE)]
    pub namespace: String,

    /// NetBox URL reachable from inside the cluster
    #[arg(long, default_value = import::DEFAULT_CLUSTER_NETBOX_URL)]
    pub cluster_netbox_url: String,

    #[arg(long, default_value = import::DEFAULT_IMAGE)]
    pub importer_image: String,

    /// Seconds to wait for the Job to complete
    #[arg(long, default_value_t = import::DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Seconds between NetBox readiness probes
    #[arg(long, env = "IMPORT_READY_INTERVAL", default_value_t = import::DEFAULT_READY_INTERVAL_SECS)]
    pub ready_interval: u64,

    #[arg(long, env = "IMPORT_READY_RETRIES", default_value_t = import::DEFAULT_READY_ATTEMPTS)]
    pub ready_attempts: u32,
}

impl ImportArgs {
    pub fn into_options(self, cfg: &Config) -> Result<ImportOptions, RunError> {
        Ok(ImportOptions {
            vendors: import::parse_vendors(&self.vendors)?,
            library_url: self.library_url,
            library_branch: self.library_branch,
            namespace: self.namespace,
            cluster_netbox_url: self.cluster_netbox_url,
            image: self.importer_image,
            secret_name: cfg.secret_name.clone(),
            secret_key: cfg.secret_key.clone(),
            timeout: Duration::from_secs(self.timeout),
            ready_interval: Duration::from_secs(self.ready_interval),
            ready_attempts: self.ready_attempts,
        })
    }
}
