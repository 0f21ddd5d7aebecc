use anyhow::Result;

use crate::config::Config;
use crate::error::RunError;
use crate::kubectl::CredentialProvider;
use crate::models::ResourceKind;
use crate::netbox::{NetBoxClient, Reconciler};

use super::{catalog, Report};

/// Identifiers of objects the EDA instance created, looked up once per run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunContext {
    pub tenant_id: Option<i64>,
    pub site_id: Option<i64>,
}

impl RunContext {
    /// Find the EDA tenant by name and the first site it owns
    pub async fn discover(rec: &Reconciler<'_>, tenant: &str) -> Self {
        let tenant_id = lookup_id(rec, ResourceKind::Tenant, "name", tenant).await;
        let site_id = lookup_id(rec, ResourceKind::Site, "tenant", tenant).await;
        Self { tenant_id, site_id }
    }
}

async fn lookup_id(rec: &Reconciler<'_>, kind: ResourceKind, field: &str, value: &str) -> Option<i64> {
    match rec.find_first(kind, field, value).await {
        Ok(Some(obj)) => {
            tracing::info!("Using {} '{}' (id {})", kind, obj.label(), obj.id);
            Some(obj.id)
        }
        Ok(None) => {
            tracing::warn!("No {} found for {}='{}'; prefixes will not reference one", kind, field, value);
            None
        }
        Err(e) => {
            tracing::warn!("Failed to look up {} {}='{}': {}", kind, field, value, e);
            None
        }
    }
}

/// Converge NetBox on the EDA catalogue.
///
/// Order matters: tags before anything tagged, the RIR before its ASN
/// ranges, and the webhook before the event rule that targets it.
pub async fn apply(rec: &Reconciler<'_>, ctx: &RunContext, eda_api: &str) -> Report {
    let mut report = Report::default();

    tracing::info!("Creating tags...");
    for tag in catalog::tags() {
        report.reconcile(rec, tag.into()).await;
    }

    tracing::info!("Creating RIR...");
    let rir = report.reconcile(rec, catalog::rir().into()).await;

    tracing::info!("Creating ASN ranges...");
    match rir.id() {
        Some(rir_id) => {
            for range in catalog::asn_ranges(rir_id) {
                report.reconcile(rec, range.into()).await;
            }
        }
        None => tracing::warn!("Skipping ASN ranges: RIR '{}' is unavailable", catalog::RIR_SLUG),
    }

    tracing::info!("Creating VLAN groups...");
    for group in catalog::vlan_groups() {
        report.reconcile(rec, group.into()).await;
    }

    tracing::info!("Creating prefixes...");
    for prefix in catalog::prefixes(ctx) {
        report.reconcile(rec, prefix.into()).await;
    }

    tracing::info!("Creating webhook...");
    let webhook = report.reconcile(rec, catalog::webhook(eda_api).into()).await;

    tracing::info!("Creating event rule...");
    match webhook.id() {
        Some(webhook_id) => {
            report.reconcile(rec, catalog::event_rule(webhook_id).into()).await;
        }
        None => tracing::warn!("Skipping event rule: webhook '{}' is unavailable", catalog::WEBHOOK_NAME),
    }

    report
}

/// The `configure` command
pub async fn run(cfg: &Config, credentials: &dyn CredentialProvider) -> Result<Report> {
    let netbox_url = cfg.read_netbox_url()?;
    let eda_api = cfg.read_eda_api_address()?;
    let token = credentials.api_token().await?;

    tracing::info!("NetBox URL: {}", netbox_url);
    tracing::info!("EDA API: {}", eda_api);

    let nb = NetBoxClient::new(netbox_url.clone(), token, cfg.http_timeout(), cfg.accept_invalid_certs)?;
    if !nb.wait_until_ready(cfg.ready_retries, cfg.ready_interval()).await {
        return Err(RunError::RemoteUnavailable {
            url: netbox_url,
            attempts: cfg.ready_retries,
        }
        .into());
    }

    let rec = Reconciler::new(&nb);
    let ctx = RunContext::discover(&rec, &cfg.tenant_name).await;
    let report = apply(&rec, &ctx, &eda_api).await;

    tracing::info!("NetBox configuration completed: {}", report.summary());
    tracing::info!("You can now access NetBox at: {}", netbox_url);
    Ok(report)
}
