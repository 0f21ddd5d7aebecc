use serde_json::{json, Value};

use super::{Resource, ResourceKind};
use crate::netbox::diff::{tag_refs, ManagedField};

/// Prefix status values
pub mod prefix_status {
    pub const ACTIVE: &str = "active";
    pub const CONTAINER: &str = "container";
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prefix {
    pub prefix: String,
    pub status: String,
    pub description: String,
    pub tags: Vec<String>,
    pub tenant: Option<i64>,
    pub site: Option<i64>,
}

impl Resource for Prefix {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Prefix
    }

    fn key(&self) -> &str {
        &self.prefix
    }

    fn validate(&self) -> Result<(), String> {
        if crate::utils::is_valid_cidr(&self.prefix) {
            Ok(())
        } else {
            Err(format!("'{}' is not a valid CIDR prefix", self.prefix))
        }
    }

    fn create_payload(&self) -> Value {
        let mut body = json!({
            "prefix": self.prefix,
            "status": self.status,
            "description": self.description,
            "tags": tag_refs(self.tags.iter().map(String::as_str)),
        });
        if let Some(tenant) = self.tenant {
            body["tenant"] = json!(tenant);
        }
        if let Some(site) = self.site {
            body["site"] = json!(site);
        }
        body
    }

    // Status and description belong to whoever edits the prefix after creation
    fn managed_fields(&self) -> Vec<ManagedField> {
        vec![
            ManagedField::fill_if_missing("tenant", self.tenant),
            ManagedField::fill_if_missing("site", self.site),
            ManagedField::tags(&self.tags),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VlanGroup {
    pub name: String,
    pub slug: String,
    pub description: String,
    /// Inclusive VLAN id ranges
    pub vid_ranges: Vec<(u16, u16)>,
    pub tags: Vec<String>,
}

impl VlanGroup {
    fn vid_ranges_value(&self) -> Value {
        Value::Array(self.vid_ranges.iter().map(|(lo, hi)| json!([lo, hi])).collect())
    }
}

impl Resource for VlanGroup {
    fn kind(&self) -> ResourceKind {
        ResourceKind::VlanGroup
    }

    fn key(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> Result<(), String> {
        match self.vid_ranges.iter().find(|(lo, hi)| *lo == 0 || lo > hi || *hi > 4094) {
            Some((lo, hi)) => Err(format!("invalid VLAN id range {}-{}", lo, hi)),
            None => Ok(()),
        }
    }

    fn create_payload(&self) -> Value {
        json!({
            "name": self.name,
            "slug": self.slug,
            "description": self.description,
            "vid_ranges": self.vid_ranges_value(),
            "tags": tag_refs(self.tags.iter().map(String::as_str)),
        })
    }

    fn managed_fields(&self) -> Vec<ManagedField> {
        vec![
            ManagedField::enforce("slug", self.slug.as_str()),
            ManagedField::enforce("vid_ranges", self.vid_ranges_value()),
            ManagedField::tags(&self.tags),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AsnRange {
    pub name: String,
    pub slug: String,
    /// Slug an earlier release created this range under
    pub legacy_slug: Option<String>,
    pub start: u32,
    pub end: u32,
    pub description: String,
    pub rir: i64,
    pub tags: Vec<String>,
}

impl Resource for AsnRange {
    fn kind(&self) -> ResourceKind {
        ResourceKind::AsnRange
    }

    fn key(&self) -> &str {
        &self.slug
    }

    fn legacy_key(&self) -> Option<&str> {
        self.legacy_slug.as_deref()
    }

    fn validate(&self) -> Result<(), String> {
        if self.start > self.end {
            return Err(format!("ASN range start {} is above end {}", self.start, self.end));
        }
        Ok(())
    }

    fn create_payload(&self) -> Value {
        json!({
            "name": self.name,
            "slug": self.slug,
            "start": self.start,
            "end": self.end,
            "description": self.description,
            "rir": self.rir,
            "tags": tag_refs(self.tags.iter().map(String::as_str)),
        })
    }

    fn managed_fields(&self) -> Vec<ManagedField> {
        vec![
            ManagedField::enforce("name", self.name.as_str()),
            ManagedField::enforce("start", self.start),
            ManagedField::enforce("end", self.end),
            ManagedField::enforce("description", self.description.as_str()),
            ManagedField::enforce("rir", self.rir),
            ManagedField::tags(&self.tags),
        ]
    }
}

/// Regional Internet Registry owning the EDA ASN ranges
#[derive(Debug, Clone, PartialEq)]
pub struct Rir {
    pub name: String,
    pub slug: String,
    pub is_private: bool,
    pub description: String,
}

impl Resource for Rir {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Rir
    }

    fn key(&self) -> &str {
        &self.slug
    }

    fn create_payload(&self) -> Value {
        json!({
            "name": self.name,
            "slug": self.slug,
            "is_private": self.is_private,
            "description": self.description,
        })
    }

    fn managed_fields(&self) -> Vec<ManagedField> {
        vec![ManagedField::enforce("name", self.name.as_str())]
    }
}
