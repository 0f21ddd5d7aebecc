use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::config::Config;
use crate::kubectl::CredentialProvider;
use crate::models::ResourceKind;
use crate::netbox::{NetBoxClient, Reconciler};

use super::configure::RunContext;
use super::{catalog, Report};

/// Remove everything the configure command creates, dependents first.
///
/// Also removes the sites owned by the EDA tenant and every custom field,
/// both of which the EDA instance itself creates.
pub async fn apply(rec: &Reconciler<'_>, tenant: &str) -> Report {
    let mut report = Report::default();

    tracing::info!("Deleting event rules...");
    report.delete(rec, ResourceKind::EventRule, catalog::EVENT_RULE_NAME).await;

    tracing::info!("Deleting webhooks...");
    report.delete(rec, ResourceKind::Webhook, catalog::WEBHOOK_NAME).await;

    tracing::info!("Deleting prefixes...");
    for prefix in catalog::prefixes(&RunContext::default()) {
        report.delete(rec, ResourceKind::Prefix, &prefix.prefix).await;
    }

    tracing::info!("Deleting sites of tenant '{}'...", tenant);
    let sites = rec
        .delete_all_matching(ResourceKind::Site, &[("tenant", tenant.to_string())])
        .await;
    report.swept.push((ResourceKind::Site, sites));

    tracing::info!("Deleting VLAN groups...");
    for group in catalog::vlan_groups() {
        report.delete(rec, ResourceKind::VlanGroup, &group.name).await;
    }

    tracing::info!("Deleting ASN ranges...");
    for range in catalog::asn_ranges(0) {
        report.delete(rec, ResourceKind::AsnRange, &range.slug).await;
    }

    tracing::info!("Deleting RIRs...");
    report.delete(rec, ResourceKind::Rir, &catalog::rir().slug).await;

    tracing::info!("Deleting tags...");
    for tag in catalog::tags() {
        report.delete(rec, ResourceKind::Tag, &tag.name).await;
    }

    tracing::info!("Deleting custom fields...");
    let fields = rec.delete_all_matching(ResourceKind::CustomField, &[]).await;
    report.swept.push((ResourceKind::CustomField, fields));

    report
}

fn is_confirmed(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("yes")
}

async fn confirm(prompt: &str) -> std::io::Result<bool> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(prompt.as_bytes()).await?;
    stdout.flush().await?;

    let mut answer = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut answer).await?;
    Ok(is_confirmed(&answer))
}

/// The `cleanup` command. Returns `None` when the operator declined.
pub async fn run(cfg: &Config, credentials: &dyn CredentialProvider, assume_yes: bool) -> Result<Option<Report>> {
    let netbox_url = cfg.read_netbox_url()?;
    let token = credentials.api_token().await?;
    tracing::info!("NetBox URL: {}", netbox_url);

    if !assume_yes {
        let prompt = "\nThis will delete EDA-related objects (webhook, tags, prefixes, etc.)\nContinue? (yes/no): ";
        if !confirm(prompt).await? {
            tracing::info!("Aborted.");
            return Ok(None);
        }
    }

    let nb = NetBoxClient::new(netbox_url, token, cfg.http_timeout(), cfg.accept_invalid_certs)?;
    let rec = Reconciler::new(&nb);
    let report = apply(&rec, &cfg.tenant_name).await;

    tracing::info!("Cleanup completed: {}", report.summary());
    Ok(Some(report))
}
