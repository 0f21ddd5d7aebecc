mod cli;
mod config;
mod error;
mod kubectl;
mod models;
mod netbox;
mod services;
mod utils;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Command};
use config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "eda_netbox=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let cfg = Config::load();
    tracing::debug!("State dir: {}", cfg.state_dir.display());

    match cli.command {
        Command::Configure => {
            let credentials = kubectl::provider_from_config(&cfg);
            let report = services::configure::run(&cfg, credentials.as_ref()).await?;
            if report.failed() > 0 {
                tracing::warn!("{} object(s) could not be reconciled; see the log above", report.failed());
            }
        }
        Command::Cleanup { yes } => {
            let credentials = kubectl::provider_from_config(&cfg);
            if let Some(report) = services::cleanup::run(&cfg, credentials.as_ref(), yes).await? {
                if report.failed() > 0 {
                    tracing::warn!("{} object(s) could not be deleted; see the log above", report.failed());
                }
            }
        }
        Command::ImportDeviceTypes(args) => {
            let opts = args.into_options(&cfg)?;
            services::import::run(&cfg, &opts).await?;
        }
    }

    Ok(())
}
