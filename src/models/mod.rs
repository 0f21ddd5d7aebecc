mod extras;
mod ipam;

pub use extras::*;
pub use ipam::*;

use serde_json::Value;
use std::fmt;

use crate::netbox::diff::ManagedField;

/// NetBox object kinds this tool creates, patches or deletes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Tag,
    Webhook,
    EventRule,
    CustomField,
    Prefix,
    VlanGroup,
    AsnRange,
    Rir,
    Site,
    Tenant,
}

impl ResourceKind {
    /// API collection path below `/api/`
    pub const fn collection(self) -> &'static str {
        match self {
            Self::Tag => "extras/tags",
            Self::Webhook => "extras/webhooks",
            Self::EventRule => "extras/event-rules",
            Self::CustomField => "extras/custom-fields",
            Self::Prefix => "ipam/prefixes",
            Self::VlanGroup => "ipam/vlan-groups",
            Self::AsnRange => "ipam/asn-ranges",
            Self::Rir => "ipam/rirs",
            Self::Site => "dcim/sites",
            Self::Tenant => "tenancy/tenants",
        }
    }

    /// Exact-match filter used to find an object by its key
    pub const fn lookup_field(self) -> &'static str {
        match self {
            Self::Prefix => "prefix",
            Self::AsnRange | Self::Rir | Self::Site => "slug",
            _ => "name",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Tag => "tag",
            Self::Webhook => "webhook",
            Self::EventRule => "event rule",
            Self::CustomField => "custom field",
            Self::Prefix => "prefix",
            Self::VlanGroup => "VLAN group",
            Self::AsnRange => "ASN range",
            Self::Rir => "RIR",
            Self::Site => "site",
            Self::Tenant => "tenant",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Desired state of one kind of NetBox object
pub trait Resource {
    fn kind(&self) -> ResourceKind;

    /// Value of the kind's lookup field
    fn key(&self) -> &str;

    /// Historical key the object may still be stored under
    fn legacy_key(&self) -> Option<&str> {
        None
    }

    /// Kind-specific checks on top of the non-empty key
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }

    /// Full body sent when the object does not exist yet
    fn create_payload(&self) -> Value;

    /// Fields converged on an existing object
    fn managed_fields(&self) -> Vec<ManagedField>;
}

/// Desired-state input to reconciliation, one variant per creatable kind
#[derive(Debug, Clone, PartialEq)]
pub enum Descriptor {
    Tag(Tag),
    Webhook(Webhook),
    EventRule(EventRule),
    Prefix(Prefix),
    VlanGroup(VlanGroup),
    AsnRange(AsnRange),
    Rir(Rir),
}

impl Descriptor {
    fn resource(&self) -> &dyn Resource {
        match self {
            Self::Tag(r) => r,
            Self::Webhook(r) => r,
            Self::EventRule(r) => r,
            Self::Prefix(r) => r,
            Self::VlanGroup(r) => r,
            Self::AsnRange(r) => r,
            Self::Rir(r) => r,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.resource().kind()
    }

    pub fn key(&self) -> &str {
        self.resource().key()
    }

    pub fn legacy_key(&self) -> Option<&str> {
        self.resource().legacy_key()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.key().trim().is_empty() {
            return Err(format!("{} lookup key must not be empty", self.kind()));
        }
        self.resource().validate()
    }

    pub fn create_payload(&self) -> Value {
        self.resource().create_payload()
    }

    pub fn managed_fields(&self) -> Vec<ManagedField> {
        self.resource().managed_fields()
    }
}

macro_rules! impl_from_resource {
    ($($variant:ident),+) => {
        $(impl From<$variant> for Descriptor {
            fn from(r: $variant) -> Self {
                Self::$variant(r)
            }
        })+
    };
}

impl_from_resource!(Tag, Webhook, EventRule, Prefix, VlanGroup, AsnRange, Rir);
