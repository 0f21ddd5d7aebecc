use serde_json::{json, Value};

use super::{Resource, ResourceKind};
use crate::netbox::diff::ManagedField;

/// Event-rule trigger values
pub mod event_type {
    pub const CREATED: &str = "object_created";
    pub const UPDATED: &str = "object_updated";
    pub const DELETED: &str = "object_deleted";
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    pub name: String,
    pub slug: String,
    pub color: String,
}

impl Tag {
    /// Tag whose slug equals its name
    pub fn new(name: &str, color: &str) -> Self {
        Self {
            name: name.to_string(),
            slug: name.to_string(),
            color: color.to_string(),
        }
    }
}

impl Resource for Tag {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Tag
    }

    fn key(&self) -> &str {
        &self.name
    }

    fn create_payload(&self) -> Value {
        json!({ "name": self.name, "slug": self.slug, "color": self.color })
    }

    fn managed_fields(&self) -> Vec<ManagedField> {
        vec![ManagedField::enforce("color", self.color.as_str())]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Webhook {
    pub name: String,
    pub payload_url: String,
    pub enabled: bool,
    pub http_method: String,
    pub http_content_type: String,
    /// Write-only from our side: sent on create, never compared
    pub secret: String,
    pub ssl_verification: bool,
}

impl Resource for Webhook {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Webhook
    }

    fn key(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> Result<(), String> {
        if crate::utils::is_valid_http_url(&self.payload_url) {
            Ok(())
        } else {
            Err(format!("webhook payload URL '{}' is not an absolute http(s) URL", self.payload_url))
        }
    }

    fn create_payload(&self) -> Value {
        json!({
            "name": self.name,
            "payload_url": self.payload_url,
            "enabled": self.enabled,
            "http_method": self.http_method,
            "http_content_type": self.http_content_type,
            "secret": self.secret,
            "ssl_verification": self.ssl_verification,
        })
    }

    fn managed_fields(&self) -> Vec<ManagedField> {
        vec![
            ManagedField::enforce("payload_url", self.payload_url.as_str()),
            ManagedField::enforce("enabled", self.enabled),
            ManagedField::enforce("http_method", self.http_method.as_str()),
            ManagedField::enforce("http_content_type", self.http_content_type.as_str()),
            ManagedField::enforce("ssl_verification", self.ssl_verification),
        ]
    }
}

/// Event rule firing a webhook for changes on the listed object types
#[derive(Debug, Clone, PartialEq)]
pub struct EventRule {
    pub name: String,
    pub object_types: Vec<String>,
    pub event_types: Vec<String>,
    pub enabled: bool,
    /// Identifier of the webhook the rule triggers
    pub webhook_id: i64,
}

impl Resource for EventRule {
    fn kind(&self) -> ResourceKind {
        ResourceKind::EventRule
    }

    fn key(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> Result<(), String> {
        if self.object_types.is_empty() {
            return Err("event rule needs at least one object type".to_string());
        }
        Ok(())
    }

    fn create_payload(&self) -> Value {
        json!({
            "name": self.name,
            "object_types": self.object_types,
            "enabled": self.enabled,
            "event_types": self.event_types,
            "action_type": "webhook",
            "action_object_type": "extras.webhook",
            "action_object_id": self.webhook_id,
        })
    }

    fn managed_fields(&self) -> Vec<ManagedField> {
        vec![
            ManagedField::union("object_types", self.object_types.clone()),
            ManagedField::enforce("action_object_id", self.webhook_id),
            ManagedField::enforce("enabled", self.enabled),
        ]
    }
}
