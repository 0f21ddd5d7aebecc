use reqwest::{Client, Method, RequestBuilder, Response};
use serde_json::Value;
use std::time::Duration;

use super::types::*;

/// Errors returned by the NetBox API client
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// NetBox answered with a non-2xx status
    #[error("NetBox API error {status}: {body}")]
    Rejected { status: u16, body: String },

    /// Connection, timeout or response decoding failure
    #[error("NetBox request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// NetBox API client
pub struct NetBoxClient {
    base_url: String,
    token: Option<String>,
    client: Client,
}

impl NetBoxClient {
    pub fn new(url: String, token: String, timeout: Duration, accept_invalid_certs: bool) -> Result<Self, ApiError> {
        Self::build(url, Some(token), timeout, accept_invalid_certs)
    }

    /// Client without credentials, enough for probing the API root
    pub fn anonymous(url: String, timeout: Duration, accept_invalid_certs: bool) -> Result<Self, ApiError> {
        Self::build(url, None, timeout, accept_invalid_certs)
    }

    fn build(url: String, token: Option<String>, timeout: Duration, accept_invalid_certs: bool) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()?;

        Ok(Self {
            base_url: url.trim_end_matches('/').to_string(),
            token,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/api/{}/", self.base_url, collection)
    }

    fn object_url(&self, collection: &str, id: i64) -> String {
        format!("{}/api/{}/{}/", self.base_url, collection, id)
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        let req = self.client.request(method, url).header("Accept", "application/json");
        match &self.token {
            Some(token) => req.header("Authorization", format!("Token {}", token)),
            None => req,
        }
    }

    /// Turn a non-2xx response into `ApiError::Rejected`, keeping status and body
    async fn check(resp: Response) -> Result<Response, ApiError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(ApiError::Rejected {
            status: status.as_u16(),
            body,
        })
    }

    /// GET a collection with exact-match filters (and optionally limit/offset)
    pub async fn list(&self, collection: &str, query: &[(&str, String)]) -> Result<PaginatedResponse<RemoteObject>, ApiError> {
        let resp = self
            .request(Method::GET, self.collection_url(collection))
            .query(query)
            .send()
            .await?;

        Ok(Self::check(resp).await?.json().await?)
    }

    /// POST a new object to a collection
    pub async fn create(&self, collection: &str, body: &Value) -> Result<RemoteObject, ApiError> {
        let resp = self
            .request(Method::POST, self.collection_url(collection))
            .json(body)
            .send()
            .await?;

        Ok(Self::check(resp).await?.json().await?)
    }

    /// PATCH only the given fields of an existing object
    pub async fn patch(&self, collection: &str, id: i64, body: &Value) -> Result<RemoteObject, ApiError> {
        let resp = self
            .request(Method::PATCH, self.object_url(collection, id))
            .json(body)
            .send()
            .await?;

        Ok(Self::check(resp).await?.json().await?)
    }

    /// DELETE an object; NetBox answers 204 (or 200) with an empty body
    pub async fn delete(&self, collection: &str, id: i64) -> Result<(), ApiError> {
        let resp = self
            .request(Method::DELETE, self.object_url(collection, id))
            .send()
            .await?;

        Self::check(resp).await?;
        Ok(())
    }

    /// Test whether the API root answers 200
    pub async fn is_ready(&self) -> bool {
        match self
            .request(Method::GET, format!("{}/api/", self.base_url))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    /// Poll the API root every `interval` until it answers, up to `max_attempts` times
    pub async fn wait_until_ready(&self, max_attempts: u32, interval: Duration) -> bool {
        tracing::info!("Waiting for NetBox at {} to be ready...", self.base_url);
        for attempt in 1..=max_attempts {
            if self.is_ready().await {
                tracing::info!("NetBox is ready");
                return true;
            }
            tracing::info!("Waiting... ({}/{})", attempt, max_attempts);
            if attempt < max_attempts {
                tokio::time::sleep(interval).await;
            }
        }
        false
    }
}
