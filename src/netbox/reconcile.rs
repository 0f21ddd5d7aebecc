use serde_json::Value;
use std::fmt;

use crate::models::{Descriptor, ResourceKind};

use super::client::{ApiError, NetBoxClient};
use super::diff::diff;
use super::types::RemoteObject;

/// Page size used when sweeping a whole collection
const PAGE_SIZE: usize = 100;

/// Result of reconciling or deleting one descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Created { id: i64 },
    Unchanged { id: i64 },
    Patched { id: i64, fields: Vec<String> },
    MigratedFromLegacy { id: i64, legacy_key: String },
    Deleted { id: i64 },
    NotFound,
    Failed(String),
}

impl Outcome {
    /// Identifier of the object the outcome refers to, if it exists remotely
    pub fn id(&self) -> Option<i64> {
        match self {
            Self::Created { id }
            | Self::Unchanged { id }
            | Self::Patched { id, .. }
            | Self::MigratedFromLegacy { id, .. } => Some(*id),
            Self::Deleted { .. } | Self::NotFound | Self::Failed(_) => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created { id } => write!(f, "created (id {})", id),
            Self::Unchanged { .. } => write!(f, "already exists"),
            Self::Patched { fields, .. } => write!(f, "updated {}", fields.join(", ")),
            Self::MigratedFromLegacy { legacy_key, .. } => write!(f, "migrated from legacy '{}'", legacy_key),
            Self::Deleted { .. } => write!(f, "deleted"),
            Self::NotFound => write!(f, "not found"),
            Self::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Converges NetBox objects on their descriptors, and removes them again.
///
/// Calls are issued one at a time. Every API failure is folded into the
/// outcome of the descriptor it belongs to; nothing here aborts a sequence.
pub struct Reconciler<'a> {
    nb: &'a NetBoxClient,
}

impl<'a> Reconciler<'a> {
    pub fn new(nb: &'a NetBoxClient) -> Self {
        Self { nb }
    }

    /// Create the object if absent, otherwise patch its differing managed fields
    pub async fn reconcile(&self, descriptor: &Descriptor) -> Outcome {
        let outcome = match descriptor.validate() {
            Ok(()) => self
                .try_reconcile(descriptor)
                .await
                .unwrap_or_else(|e| Outcome::Failed(e.to_string())),
            Err(reason) => Outcome::Failed(reason),
        };
        log_outcome(descriptor.kind(), descriptor.key(), &outcome);
        outcome
    }

    async fn try_reconcile(&self, descriptor: &Descriptor) -> Result<Outcome, ApiError> {
        let kind = descriptor.kind();
        let field = kind.lookup_field();

        if let Some(existing) = self.find_first(kind, field, descriptor.key()).await? {
            let patch = diff(&descriptor.managed_fields(), &existing);
            if patch.is_empty() {
                return Ok(Outcome::Unchanged { id: existing.id });
            }
            let fields: Vec<String> = patch.keys().cloned().collect();
            tracing::debug!("Patching {} '{}' fields: {:?}", kind, descriptor.key(), fields);
            self.nb
                .patch(kind.collection(), existing.id, &Value::Object(patch))
                .await?;
            return Ok(Outcome::Patched { id: existing.id, fields });
        }

        if let Some(legacy_key) = descriptor.legacy_key() {
            if let Some(legacy) = self.find_first(kind, field, legacy_key).await? {
                self.nb
                    .patch(kind.collection(), legacy.id, &descriptor.create_payload())
                    .await?;
                return Ok(Outcome::MigratedFromLegacy {
                    id: legacy.id,
                    legacy_key: legacy_key.to_string(),
                });
            }
        }

        let created = self
            .nb
            .create(kind.collection(), &descriptor.create_payload())
            .await?;
        Ok(Outcome::Created { id: created.id })
    }

    /// Exact-match lookup; the first result is canonical
    pub async fn find_first(&self, kind: ResourceKind, field: &str, value: &str) -> Result<Option<RemoteObject>, ApiError> {
        let page = self
            .nb
            .list(kind.collection(), &[(field, value.to_string())])
            .await?;
        if page.matches() > 1 {
            tracing::warn!(
                "{} {}='{}' matched {} objects; using the first (id {})",
                kind,
                field,
                value,
                page.matches(),
                page.results.first().map_or(0, |o| o.id)
            );
        }
        Ok(page.results.into_iter().next())
    }

    /// Delete the canonical object for `key`; an absent key is `NotFound`
    pub async fn delete(&self, kind: ResourceKind, key: &str) -> Outcome {
        let outcome = match self.try_delete(kind, key).await {
            Ok(o) => o,
            Err(e) => Outcome::Failed(e.to_string()),
        };
        log_outcome(kind, key, &outcome);
        outcome
    }

    async fn try_delete(&self, kind: ResourceKind, key: &str) -> Result<Outcome, ApiError> {
        match self.find_first(kind, kind.lookup_field(), key).await? {
            Some(existing) => {
                self.nb.delete(kind.collection(), existing.id).await?;
                Ok(Outcome::Deleted { id: existing.id })
            }
            None => Ok(Outcome::NotFound),
        }
    }

    /// Delete every object matching `filter` (an empty filter sweeps the
    /// whole collection) and return how many were deleted.
    ///
    /// Pages are re-read from the start since deletions shift the result set;
    /// the offset only moves past objects that refused to be deleted.
    pub async fn delete_all_matching(&self, kind: ResourceKind, filter: &[(&str, String)]) -> usize {
        let mut deleted = 0;
        let mut offset = 0;

        loop {
            let mut query = filter.to_vec();
            query.push(("limit", PAGE_SIZE.to_string()));
            query.push(("offset", offset.to_string()));

            let page = match self.nb.list(kind.collection(), &query).await {
                Ok(page) => page,
                Err(e) => {
                    tracing::warn!("Failed to list {}s: {}", kind, e);
                    break;
                }
            };
            if page.results.is_empty() {
                break;
            }

            for obj in &page.results {
                match self.nb.delete(kind.collection(), obj.id).await {
                    Ok(()) => {
                        tracing::info!("Deleted {} '{}'", kind, obj.label());
                        deleted += 1;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to delete {} '{}': {}", kind, obj.label(), e);
                        offset += 1;
                    }
                }
            }
        }

        deleted
    }
}

fn log_outcome(kind: ResourceKind, key: &str, outcome: &Outcome) {
    match outcome {
        Outcome::Failed(_) => tracing::warn!("{} '{}': {}", kind, key, outcome),
        _ => tracing::info!("{} '{}': {}", kind, key, outcome),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::*;
    use crate::netbox::fake::FakeNetBox;
    use serde_json::json;

    fn tag(name: &str) -> Descriptor {
        Tag::new(name, "0066cc").into()
    }

    fn system_prefix(tenant: Option<i64>) -> Descriptor {
        Prefix {
            prefix: "192.168.10.0/24".into(),
            status: prefix_status::ACTIVE.into(),
            description: "System IP pool for spine/leaf".into(),
            tags: vec!["eda-systemip-v4".into()],
            tenant,
            site: None,
        }
        .into()
    }

    fn asn_range() -> Descriptor {
        AsnRange {
            name: "eda-asns".into(),
            slug: "eda-asns".into(),
            legacy_slug: Some("eda-ans".into()),
            start: 65000,
            end: 65100,
            description: "EDA managed private ASNs".into(),
            rir: 1,
            tags: vec!["eda-asns".into()],
        }
        .into()
    }

    #[tokio::test]
    async fn test_reconcile_is_idempotent() {
        let (_server, fake, nb) = FakeNetBox::start().await;
        let rec = Reconciler::new(&nb);

        let first = rec.reconcile(&tag("eda-vlans")).await;
        let second = rec.reconcile(&tag("eda-vlans")).await;

        let id = match first {
            Outcome::Created { id } => id,
            other => panic!("expected created, got {other:?}"),
        };
        assert_eq!(second, Outcome::Unchanged { id });
        assert_eq!(fake.objects("extras/tags").len(), 1);
    }

    #[tokio::test]
    async fn test_stale_field_converges() {
        let (_server, fake, nb) = FakeNetBox::start().await;
        let id = fake.seed("ipam/rirs", json!({"name": "EDA old", "slug": "eda", "is_private": true}));
        let rec = Reconciler::new(&nb);
        let rir: Descriptor = Rir {
            name: "eda".into(),
            slug: "eda".into(),
            is_private: false,
            description: "For EDA managed resources".into(),
        }
        .into();

        assert_eq!(
            rec.reconcile(&rir).await,
            Outcome::Patched { id, fields: vec!["name".into()] }
        );
        assert_eq!(rec.reconcile(&rir).await, Outcome::Unchanged { id });
        // is_private is create-only
        assert_eq!(fake.objects("ipam/rirs")[0]["is_private"], true);
    }

    #[tokio::test]
    async fn test_patch_leaves_unmanaged_fields_alone() {
        let (_server, fake, nb) = FakeNetBox::start().await;
        let id = fake.seed(
            "ipam/prefixes",
            json!({
                "prefix": "192.168.10.0/24",
                "status": {"value": "reserved", "label": "Reserved"},
                "description": "set by another actor",
                "tenant": null,
                "tags": [{"id": 1, "name": "eda-systemip-v4"}]
            }),
        );
        let rec = Reconciler::new(&nb);

        let outcome = rec.reconcile(&system_prefix(Some(7))).await;

        assert_eq!(outcome, Outcome::Patched { id, fields: vec!["tenant".into()] });
        assert_eq!(fake.last_body("PATCH"), Some(json!({"tenant": 7})));
        let stored = &fake.objects("ipam/prefixes")[0];
        assert_eq!(stored["description"], "set by another actor");
        assert_eq!(stored["status"]["value"], "reserved");
    }

    #[tokio::test]
    async fn test_legacy_migration_happens_once() {
        let (_server, fake, nb) = FakeNetBox::start().await;
        let legacy_id = fake.seed(
            "ipam/asn-ranges",
            json!({"name": "eda-ans", "slug": "eda-ans", "start": 65000, "end": 65100, "rir": {"id": 1}}),
        );
        let rec = Reconciler::new(&nb);

        assert_eq!(
            rec.reconcile(&asn_range()).await,
            Outcome::MigratedFromLegacy { id: legacy_id, legacy_key: "eda-ans".into() }
        );
        assert_eq!(rec.reconcile(&asn_range()).await, Outcome::Unchanged { id: legacy_id });

        let ranges = fake.objects("ipam/asn-ranges");
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0]["slug"], "eda-asns");
    }

    #[tokio::test]
    async fn test_asn_range_without_legacy_is_created() {
        let (_server, fake, nb) = FakeNetBox::start().await;
        let rec = Reconciler::new(&nb);

        assert!(matches!(rec.reconcile(&asn_range()).await, Outcome::Created { .. }));
        assert_eq!(fake.objects("ipam/asn-ranges")[0]["slug"], "eda-asns");
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (_server, _fake, nb) = FakeNetBox::start().await;
        let rec = Reconciler::new(&nb);

        assert_eq!(rec.delete(ResourceKind::Webhook, "eda").await, Outcome::NotFound);
        assert_eq!(rec.delete(ResourceKind::Webhook, "eda").await, Outcome::NotFound);
    }

    #[tokio::test]
    async fn test_prefix_lifecycle() {
        let (_server, fake, nb) = FakeNetBox::start().await;
        let rec = Reconciler::new(&nb);

        let id = rec.reconcile(&system_prefix(None)).await.id().unwrap();
        assert_eq!(
            rec.reconcile(&system_prefix(Some(3))).await,
            Outcome::Patched { id, fields: vec!["tenant".into()] }
        );
        assert_eq!(fake.last_body("PATCH"), Some(json!({"tenant": 3})));

        assert_eq!(rec.delete(ResourceKind::Prefix, "192.168.10.0/24").await, Outcome::Deleted { id });
        assert_eq!(rec.delete(ResourceKind::Prefix, "192.168.10.0/24").await, Outcome::NotFound);
    }

    #[tokio::test]
    async fn test_rejected_create_is_reported_not_fatal() {
        let (_server, fake, nb) = FakeNetBox::start().await;
        fake.reject("POST", "extras/tags", 400, r#"{"color":["invalid"]}"#);
        let rec = Reconciler::new(&nb);

        match rec.reconcile(&tag("eda-isl-v4")).await {
            Outcome::Failed(reason) => {
                assert!(reason.contains("400"), "{reason}");
                assert!(reason.contains("invalid"), "{reason}");
            }
            other => panic!("expected failure, got {other:?}"),
        }

        let vlan: Descriptor = VlanGroup {
            name: "eda-vlans".into(),
            slug: "eda-vlans".into(),
            description: String::new(),
            vid_ranges: vec![(1, 300)],
            tags: vec![],
        }
        .into();
        assert!(matches!(rec.reconcile(&vlan).await, Outcome::Created { .. }));
    }

    #[tokio::test]
    async fn test_rejected_patch_is_failed() {
        let (_server, fake, nb) = FakeNetBox::start().await;
        fake.seed("extras/tags", json!({"name": "eda-mgmt-v4", "slug": "eda-mgmt-v4", "color": "000000"}));
        fake.reject("PATCH", "extras/tags", 400, "nope");
        let rec = Reconciler::new(&nb);

        assert_eq!(
            rec.reconcile(&tag("eda-mgmt-v4")).await,
            Outcome::Failed("NetBox API error 400: nope".into())
        );
        assert_eq!(fake.objects("extras/tags")[0]["color"], "000000");
    }

    #[tokio::test]
    async fn test_rejected_delete_is_failed() {
        let (_server, fake, nb) = FakeNetBox::start().await;
        fake.seed("extras/webhooks", json!({"name": "eda"}));
        fake.reject("DELETE", "extras/webhooks", 409, "protected");
        let rec = Reconciler::new(&nb);

        assert_eq!(
            rec.delete(ResourceKind::Webhook, "eda").await,
            Outcome::Failed("NetBox API error 409: protected".into())
        );
        assert_eq!(fake.objects("extras/webhooks").len(), 1);
    }

    #[tokio::test]
    async fn test_rejected_legacy_migration_is_failed() {
        let (_server, fake, nb) = FakeNetBox::start().await;
        fake.seed(
            "ipam/asn-ranges",
            json!({"name": "eda-ans", "slug": "eda-ans", "start": 65000, "end": 65100, "rir": {"id": 1}}),
        );
        fake.reject("PATCH", "ipam/asn-ranges", 400, "slug taken");
        let rec = Reconciler::new(&nb);

        match rec.reconcile(&asn_range()).await {
            Outcome::Failed(reason) => assert!(reason.contains("slug taken"), "{reason}"),
            other => panic!("expected failure, got {other:?}"),
        }
        let ranges = fake.objects("ipam/asn-ranges");
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0]["slug"], "eda-ans");
        assert!(fake.paths("POST").is_empty());
    }

    #[tokio::test]
    async fn test_invalid_descriptor_sends_nothing() {
        let (_server, fake, nb) = FakeNetBox::start().await;
        let rec = Reconciler::new(&nb);
        let bad: Descriptor = Prefix {
            prefix: "192.168.10.0".into(),
            status: prefix_status::ACTIVE.into(),
            description: String::new(),
            tags: vec![],
            tenant: None,
            site: None,
        }
        .into();

        assert!(rec.reconcile(&bad).await.is_failed());
        assert_eq!(fake.request_count(), 0);
    }

    #[tokio::test]
    async fn test_duplicates_use_first_match() {
        let (_server, fake, nb) = FakeNetBox::start().await;
        let first = fake.seed("extras/tags", json!({"name": "eda-asns", "slug": "eda-asns", "color": "0066cc"}));
        fake.seed("extras/tags", json!({"name": "eda-asns", "slug": "eda-asns-2", "color": "000000"}));
        let rec = Reconciler::new(&nb);

        assert_eq!(rec.reconcile(&tag("eda-asns")).await, Outcome::Unchanged { id: first });
        assert_eq!(rec.delete(ResourceKind::Tag, "eda-asns").await, Outcome::Deleted { id: first });
        assert_eq!(fake.objects("extras/tags").len(), 1);
    }

    #[tokio::test]
    async fn test_event_rule_union_keeps_foreign_types() {
        let (_server, fake, nb) = FakeNetBox::start().await;
        let id = fake.seed(
            "extras/event-rules",
            json!({"name": "eda", "object_types": ["dcim.site", "tenancy.tenant"], "enabled": false, "action_object_id": 4}),
        );
        let rec = Reconciler::new(&nb);
        let rule: Descriptor = EventRule {
            name: "eda".into(),
            object_types: vec!["dcim.site".into(), "dcim.device".into()],
            event_types: vec![event_type::CREATED.into()],
            enabled: true,
            webhook_id: 9,
        }
        .into();

        assert!(matches!(rec.reconcile(&rule).await, Outcome::Patched { id: p, .. } if p == id));
        assert_eq!(
            fake.last_body("PATCH"),
            Some(json!({
                "object_types": ["dcim.device", "dcim.site", "tenancy.tenant"],
                "action_object_id": 9,
                "enabled": true
            }))
        );
        assert_eq!(rec.reconcile(&rule).await, Outcome::Unchanged { id });
    }

    #[tokio::test]
    async fn test_delete_all_matching_pages_through() {
        let (_server, fake, nb) = FakeNetBox::start().await;
        for i in 0..230 {
            fake.seed("extras/custom-fields", json!({"name": format!("cf_{i}")}));
        }
        let rec = Reconciler::new(&nb);

        assert_eq!(rec.delete_all_matching(ResourceKind::CustomField, &[]).await, 230);
        assert!(fake.objects("extras/custom-fields").is_empty());
        assert_eq!(rec.delete_all_matching(ResourceKind::CustomField, &[]).await, 0);
    }

    #[tokio::test]
    async fn test_delete_all_matching_skips_undeletable() {
        let (_server, fake, nb) = FakeNetBox::start().await;
        fake.seed("dcim/sites", json!({"name": "eda-site", "slug": "eda-site", "tenant": {"id": 1, "slug": "eda"}}));
        fake.seed("dcim/sites", json!({"name": "other", "slug": "other", "tenant": {"id": 2, "slug": "other"}}));
        fake.reject("DELETE", "dcim/sites", 409, "protected");
        let rec = Reconciler::new(&nb);

        assert_eq!(
            rec.delete_all_matching(ResourceKind::Site, &[("tenant", "eda".to_string())]).await,
            0
        );
        assert_eq!(fake.objects("dcim/sites").len(), 2);
    }
}
