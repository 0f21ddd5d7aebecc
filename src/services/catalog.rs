//! Desired NetBox state for EDA. The cleanup command derives the keys it
//! removes from these same definitions.

use crate::models::*;

use super::configure::RunContext;

pub const WEBHOOK_NAME: &str = "eda";
pub const WEBHOOK_SECRET: &str = "eda-netbox-webhook-secret";
pub const EVENT_RULE_NAME: &str = "eda";
pub const RIR_SLUG: &str = "eda";
pub const ASN_RANGE_SLUG: &str = "eda-asns";
/// Misspelled slug an earlier release created the ASN range under
pub const LEGACY_ASN_RANGE_SLUG: &str = "eda-ans";
pub const VLAN_GROUP_NAME: &str = "eda-vlans";

/// Object types whose changes are pushed to EDA
pub const EVENT_OBJECT_TYPES: &[&str] = &[
    "dcim.site",
    "dcim.device",
    "dcim.cable",
    "dcim.devicetype",
    "ipam.ipaddress",
    "ipam.prefix",
    "ipam.vlangroup",
    "ipam.vlan",
    "ipam.asn",
    "ipam.asnrange",
];

pub fn tags() -> Vec<Tag> {
    vec![
        Tag::new("eda-systemip-v4", "0066cc"),
        Tag::new("eda-systemip-v6", "0066cc"),
        Tag::new("eda-isl-v4", "00cc66"),
        Tag::new("eda-isl-v6", "00cc66"),
        Tag::new("eda-mgmt-v4", "cc6600"),
        Tag::new("eda-vlans", "ff5722"),
        Tag::new("eda-asns", "9e9e9e"),
    ]
}

pub fn rir() -> Rir {
    Rir {
        name: "eda".to_string(),
        slug: RIR_SLUG.to_string(),
        is_private: false,
        description: "For EDA managed resources".to_string(),
    }
}

pub fn asn_ranges(rir_id: i64) -> Vec<AsnRange> {
    vec![AsnRange {
        name: ASN_RANGE_SLUG.to_string(),
        slug: ASN_RANGE_SLUG.to_string(),
        legacy_slug: Some(LEGACY_ASN_RANGE_SLUG.to_string()),
        start: 65000,
        end: 65100,
        description: "EDA managed private ASNs".to_string(),
        rir: rir_id,
        tags: vec!["eda-asns".to_string()],
    }]
}

pub fn vlan_groups() -> Vec<VlanGroup> {
    vec![VlanGroup {
        name: VLAN_GROUP_NAME.to_string(),
        slug: VLAN_GROUP_NAME.to_string(),
        description: "EDA managed VLAN IDs".to_string(),
        vid_ranges: vec![(1, 300)],
        tags: vec!["eda-vlans".to_string()],
    }]
}

/// Allocation pools, attached to the EDA tenant and site when those exist
pub fn prefixes(ctx: &RunContext) -> Vec<Prefix> {
    [
        ("192.168.10.0/24", prefix_status::ACTIVE, "System IP pool for spine/leaf", "eda-systemip-v4"),
        ("10.0.0.0/16", prefix_status::CONTAINER, "ISL subnet pool", "eda-isl-v4"),
        ("2001:db8::/32", prefix_status::ACTIVE, "IPv6 System IP pool", "eda-systemip-v6"),
        ("2005::/64", prefix_status::CONTAINER, "IPv6 ISL subnet pool", "eda-isl-v6"),
        ("172.16.0.0/16", prefix_status::ACTIVE, "Management IP pool", "eda-mgmt-v4"),
    ]
    .into_iter()
    .map(|(prefix, status, description, tag)| Prefix {
        prefix: prefix.to_string(),
        status: status.to_string(),
        description: description.to_string(),
        tags: vec![tag.to_string()],
        tenant: ctx.tenant_id,
        site: ctx.site_id,
    })
    .collect()
}

/// Webhook delivering NetBox events to the EDA HTTP proxy
pub fn webhook(eda_api: &str) -> Webhook {
    Webhook {
        name: WEBHOOK_NAME.to_string(),
        payload_url: format!(
            "https://{}/core/httpproxy/v1/netbox/webhook/eda-netbox/netbox",
            eda_api.trim_end_matches('/')
        ),
        enabled: true,
        http_method: "POST".to_string(),
        http_content_type: "application/json".to_string(),
        secret: WEBHOOK_SECRET.to_string(),
        ssl_verification: false,
    }
}

pub fn event_rule(webhook_id: i64) -> EventRule {
    EventRule {
        name: EVENT_RULE_NAME.to_string(),
        object_types: EVENT_OBJECT_TYPES.iter().map(|t| t.to_string()).collect(),
        event_types: vec![
            event_type::CREATED.to_string(),
            event_type::UPDATED.to_string(),
            event_type::DELETED.to_string(),
        ],
        enabled: true,
        webhook_id,
    }
}
