use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// --- NetBox API types ---

#[derive(Debug, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    #[serde(default)]
    pub count: i64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

impl<T> PaginatedResponse<T> {
    /// Number of matches reported by NetBox, never less than what came back in this page
    pub fn matches(&self) -> i64 {
        self.count.max(self.results.len() as i64)
    }
}

/// A NetBox object as currently stored remotely: its identifier plus every
/// other field exactly as the API returned it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteObject {
    pub id: i64,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl RemoteObject {
    /// Field value, treating an explicit JSON null the same as an absent field
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name).filter(|v| !v.is_null())
    }

    /// Best human-readable label for log lines
    pub fn label(&self) -> String {
        ["name", "prefix", "slug", "display"]
            .iter()
            .find_map(|k| self.field(k).and_then(Value::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| format!("#{}", self.id))
    }
}
