//! Managed-field comparison between a desired payload and a remote object.
//!
//! Only the fields a descriptor manages are ever compared or patched; every
//! other field of the remote object is left as another actor set it.

use serde_json::{Map, Value};
use std::collections::BTreeSet;

use super::types::RemoteObject;

/// How a managed field converges once the object exists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    /// Patch whenever the remote value differs
    Enforce,
    /// Patch only when the remote value is null, absent or empty
    FillIfMissing,
    /// List of strings; patch with the sorted union when an entry is missing
    Union,
    /// List of tag references; patch with existing tags plus the missing names
    TagUnion,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ManagedField {
    pub name: &'static str,
    pub desired: Value,
    pub rule: FieldRule,
}

impl ManagedField {
    pub fn enforce(name: &'static str, desired: impl Into<Value>) -> Self {
        Self { name, desired: desired.into(), rule: FieldRule::Enforce }
    }

    pub fn fill_if_missing(name: &'static str, desired: impl Into<Value>) -> Self {
        Self { name, desired: desired.into(), rule: FieldRule::FillIfMissing }
    }

    pub fn union(name: &'static str, desired: impl Into<Value>) -> Self {
        Self { name, desired: desired.into(), rule: FieldRule::Union }
    }

    pub fn tags(desired: &[String]) -> Self {
        Self { name: "tags", desired: tag_refs(desired.iter().map(String::as_str)), rule: FieldRule::TagUnion }
    }

    /// The value to send for this field, or None when it already converged
    fn patch_value(&self, remote: Option<&Value>) -> Option<Value> {
        if self.desired.is_null() {
            return None;
        }
        match self.rule {
            FieldRule::Enforce => (!values_match(&self.desired, remote)).then(|| self.desired.clone()),
            FieldRule::FillIfMissing => is_empty(remote).then(|| self.desired.clone()),
            FieldRule::Union => {
                let existing = string_set(remote);
                let wanted = string_set(Some(&self.desired));
                if wanted.is_subset(&existing) {
                    return None;
                }
                Some(Value::from(existing.union(&wanted).cloned().collect::<Vec<_>>()))
            }
            FieldRule::TagUnion => {
                let mut names = tag_names(remote);
                let missing: Vec<String> = tag_names(Some(&self.desired))
                    .into_iter()
                    .filter(|n| !names.contains(n))
                    .collect();
                if missing.is_empty() {
                    return None;
                }
                names.extend(missing);
                Some(tag_refs(names.iter().map(String::as_str)))
            }
        }
    }
}

/// Compute the minimal patch converging `remote` on the managed fields
pub fn diff(fields: &[ManagedField], remote: &RemoteObject) -> Map<String, Value> {
    fields
        .iter()
        .filter_map(|f| f.patch_value(remote.field(f.name)).map(|v| (f.name.to_string(), v)))
        .collect()
}

/// `[{"name": ...}, ...]`, the form NetBox accepts for tag assignment
pub fn tag_refs<'a>(names: impl IntoIterator<Item = &'a str>) -> Value {
    Value::Array(
        names
            .into_iter()
            .map(|n| serde_json::json!({ "name": n }))
            .collect(),
    )
}

/// Compare a desired value with its remote counterpart.
///
/// NetBox renders foreign keys as nested objects and choice fields as
/// `{"value", "label"}`; a desired id or choice value matches those forms.
pub fn values_match(desired: &Value, remote: Option<&Value>) -> bool {
    let Some(remote) = remote else {
        return desired.is_null();
    };
    match (desired, remote) {
        (Value::Number(_), Value::Object(obj)) => obj.get("id") == Some(desired),
        (Value::String(_), Value::Object(obj)) if obj.contains_key("value") => obj.get("value") == Some(desired),
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => desired == remote,
    }
}

fn is_empty(remote: Option<&Value>) -> bool {
    match remote {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(a)) => a.is_empty(),
        Some(Value::Object(o)) => o.is_empty(),
        Some(_) => false,
    }
}

fn string_set(value: Option<&Value>) -> BTreeSet<String> {
    value
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default()
}

/// Tag names in remote order; accepts both nested tag objects and bare strings
fn tag_names(value: Option<&Value>) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for item in value.and_then(Value::as_array).into_iter().flatten() {
        let name = match item {
            Value::String(s) => Some(s.as_str()),
            Value::Object(obj) => obj.get("name").and_then(Value::as_str),
            _ => None,
        };
        if let Some(n) = name {
            if !names.iter().any(|existing| existing == n) {
                names.push(n.to_string());
            }
        }
    }
    names
}
