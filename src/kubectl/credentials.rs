use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};

use super::Kubectl;
use crate::config::Config;
use crate::error::RunError;

/// Supplies the NetBox API token
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn api_token(&self) -> Result<String, RunError>;
}

/// Token given directly (NETBOX_TOKEN)
pub struct StaticToken(pub String);

#[async_trait]
impl CredentialProvider for StaticToken {
    async fn api_token(&self) -> Result<String, RunError> {
        Ok(self.0.clone())
    }
}

/// Token stored base64-encoded in a Kubernetes secret
pub struct KubectlSecret {
    kubectl: Kubectl,
    namespace: String,
    name: String,
    key: String,
}

impl KubectlSecret {
    pub fn new(kubectl: Kubectl, namespace: &str, name: &str, key: &str) -> Self {
        Self {
            kubectl,
            namespace: namespace.to_string(),
            name: name.to_string(),
            key: key.to_string(),
        }
    }
}

#[async_trait]
impl CredentialProvider for KubectlSecret {
    async fn api_token(&self) -> Result<String, RunError> {
        let jsonpath = format!("jsonpath={{.data.{}}}", self.key);
        let args = ["-n", self.namespace.as_str(), "get", "secret", self.name.as_str(), "-o", jsonpath.as_str()];

        let out = self
            .kubectl
            .run(&args, None)
            .await
            .map_err(|e| RunError::PreconditionMissing(format!("Error getting API token: {}", e)))?;
        if !out.success {
            return Err(RunError::PreconditionMissing(format!(
                "Error getting API token: {}",
                out.stderr.trim()
            )));
        }
        decode_token(&out.stdout)
    }
}

/// Decode a base64 secret value into the token string
pub fn decode_token(raw: &str) -> Result<String, RunError> {
    let bytes = STANDARD
        .decode(raw.trim())
        .map_err(|e| RunError::PreconditionMissing(format!("API token is not valid base64: {}", e)))?;
    let token = String::from_utf8(bytes)
        .map_err(|_| RunError::PreconditionMissing("API token is not valid UTF-8".to_string()))?;
    let token = token.trim();
    if token.is_empty() {
        return Err(RunError::PreconditionMissing("API token is empty".to_string()));
    }
    Ok(token.to_string())
}

/// NETBOX_TOKEN wins over the cluster secret
pub fn provider_from_config(cfg: &Config) -> Box<dyn CredentialProvider> {
    match &cfg.netbox_token {
        Some(token) => Box::new(StaticToken(token.clone())),
        None => Box::new(KubectlSecret::new(
            Kubectl::new(cfg.kubectl.clone()),
            &cfg.namespace,
            &cfg.secret_name,
            &cfg.secret_key,
        )),
    }
}
