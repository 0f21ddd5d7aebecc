//! In-memory NetBox for tests, served through a wiremock server.
//!
//! Supports exact-match list filters (including nested `tenant=<slug>`),
//! limit/offset paging, create, patch, delete, and injected rejections.

use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::any;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use super::client::NetBoxClient;

const DEFAULT_LIMIT: usize = 50;

struct Rejection {
    method: String,
    collection: String,
    status: u16,
    body: String,
}

#[derive(Default)]
struct State {
    collections: HashMap<String, Vec<Value>>,
    next_id: i64,
    rejections: Vec<Rejection>,
    requests: Vec<(String, String, Option<Value>)>,
}

impl State {
    fn insert(&mut self, collection: &str, mut obj: Value) -> Value {
        self.next_id += 1;
        obj["id"] = json!(self.next_id);
        self.collections
            .entry(collection.to_string())
            .or_default()
            .push(obj.clone());
        obj
    }
}

#[derive(Clone, Default)]
pub struct FakeNetBox {
    state: Arc<Mutex<State>>,
}

impl FakeNetBox {
    /// Start a server backed by an empty fake and a client pointed at it
    pub async fn start() -> (MockServer, Self, NetBoxClient) {
        let server = MockServer::start().await;
        let fake = Self::default();
        Mock::given(any())
            .respond_with(fake.clone())
            .mount(&server)
            .await;
        let nb = NetBoxClient::new(server.uri(), "test-token".into(), Duration::from_secs(5), false).unwrap();
        (server, fake, nb)
    }

    /// Store an object directly, returning its id
    pub fn seed(&self, collection: &str, obj: Value) -> i64 {
        let stored = self.state.lock().unwrap().insert(collection, obj);
        stored["id"].as_i64().unwrap()
    }

    pub fn objects(&self, collection: &str) -> Vec<Value> {
        self.state
            .lock()
            .unwrap()
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Answer every `method` request on `collection` with `status` and `body`
    pub fn reject(&self, method: &str, collection: &str, status: u16, body: &str) {
        self.state.lock().unwrap().rejections.push(Rejection {
            method: method.to_string(),
            collection: collection.to_string(),
            status,
            body: body.to_string(),
        });
    }

    /// Body of the most recent request with this method
    pub fn last_body(&self, method: &str) -> Option<Value> {
        self.state
            .lock()
            .unwrap()
            .requests
            .iter()
            .rev()
            .find(|(m, _, _)| m == method)
            .and_then(|(_, _, body)| body.clone())
    }

    /// Paths of every request with this method, in order
    pub fn paths(&self, method: &str) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .requests
            .iter()
            .filter(|(m, _, _)| m == method)
            .map(|(_, p, _)| p.clone())
            .collect()
    }

    pub fn request_count(&self) -> usize {
        self.state.lock().unwrap().requests.len()
    }
}

/// "/api/ipam/prefixes/12/" -> ("ipam/prefixes", Some(12))
fn parse_path(path: &str) -> Option<(String, Option<i64>)> {
    let rest = path.strip_prefix("/api/")?.trim_end_matches('/');
    let parts: Vec<&str> = rest.split('/').collect();
    match parts.as_slice() {
        [app, model] => Some((format!("{}/{}", app, model), None)),
        [app, model, id] => Some((format!("{}/{}", app, model), Some(id.parse().ok()?))),
        _ => None,
    }
}

fn field_matches(obj: &Value, key: &str, wanted: &str) -> bool {
    let same = |v: &Value| match v {
        Value::String(s) => s == wanted,
        Value::Number(n) => n.to_string() == wanted,
        _ => false,
    };
    match obj.get(key) {
        Some(Value::Object(nested)) => ["slug", "name", "id"]
            .iter()
            .any(|k| nested.get(*k).is_some_and(|v| same(v))),
        Some(v) => same(v),
        None => false,
    }
}

impl Respond for FakeNetBox {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let mut state = self.state.lock().unwrap();
        let method = request.method.as_str().to_string();
        let path = request.url.path().to_string();
        let body: Option<Value> = serde_json::from_slice(&request.body).ok();
        state.requests.push((method.clone(), path.clone(), body.clone()));

        if path == "/api/" {
            return ResponseTemplate::new(200).set_body_json(json!({"status": "ok"}));
        }
        let Some((collection, id)) = parse_path(&path) else {
            return ResponseTemplate::new(404);
        };
        if let Some(r) = state
            .rejections
            .iter()
            .find(|r| r.method == method && r.collection == collection)
        {
            return ResponseTemplate::new(r.status).set_body_string(r.body.clone());
        }

        match (method.as_str(), id) {
            ("GET", None) => {
                let mut limit = DEFAULT_LIMIT;
                let mut offset = 0;
                let mut filters = Vec::new();
                for (k, v) in request.url.query_pairs() {
                    match k.as_ref() {
                        "limit" => limit = v.parse().unwrap_or(DEFAULT_LIMIT),
                        "offset" => offset = v.parse().unwrap_or(0),
                        _ => filters.push((k.into_owned(), v.into_owned())),
                    }
                }
                let matching: Vec<Value> = state
                    .collections
                    .get(&collection)
                    .into_iter()
                    .flatten()
                    .filter(|obj| filters.iter().all(|(k, v)| field_matches(obj, k, v)))
                    .cloned()
                    .collect();
                let results: Vec<Value> = matching.iter().skip(offset).take(limit).cloned().collect();
                ResponseTemplate::new(200).set_body_json(json!({
                    "count": matching.len(),
                    "next": null,
                    "previous": null,
                    "results": results,
                }))
            }
            ("POST", None) => match body {
                Some(obj @ Value::Object(_)) => {
                    let stored = state.insert(&collection, obj);
                    ResponseTemplate::new(201).set_body_json(stored)
                }
                _ => ResponseTemplate::new(400).set_body_string("expected a JSON object"),
            },
            ("PATCH", Some(id)) => {
                let objects = state.collections.entry(collection).or_default();
                let Some(obj) = objects.iter_mut().find(|o| o["id"] == id) else {
                    return ResponseTemplate::new(404).set_body_string("not found");
                };
                if let (Some(target), Some(Value::Object(changes))) = (obj.as_object_mut(), body) {
                    target.extend(changes);
                }
                ResponseTemplate::new(200).set_body_json(obj.clone())
            }
            ("DELETE", Some(id)) => {
                let objects = state.collections.entry(collection).or_default();
                let before = objects.len();
                objects.retain(|o| o["id"] != id);
                if objects.len() < before {
                    ResponseTemplate::new(204)
                } else {
                    ResponseTemplate::new(404).set_body_string("not found")
                }
            }
            _ => ResponseTemplate::new(405),
        }
    }
}
