//! Bearer token credentials for Azure-hosted agent platforms.
//!
//! [`CredentialChain::from_env`] mirrors the usual Azure resolution order:
//! an explicit access token, then a service principal secret, then the
//! managed identity endpoint injected by Container Apps and App Service.
//! Tokens are cached and refreshed shortly before they expire.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use gateway_core::{GatewayError, GatewayResult};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// OAuth scope for the Azure AI data plane
pub const AI_SCOPE: &str = "https://ai.azure.com/.default";

/// Default Microsoft Entra authority
pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

/// Tokens expiring within this window are refreshed before use
const REFRESH_MARGIN_SECS: i64 = 300;

/// API version of the App Service / Container Apps identity endpoint
const IDENTITY_API_VERSION: &str = "2019-08-01";

/// A bearer token with its expiry
#[derive(Debug, Clone)]
pub struct AccessToken {
    /// Token value
    pub token: SecretString,
    /// Expiry time
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// Create a token
    pub fn new(token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            token: SecretString::new(token.into()),
            expires_at,
        }
    }

    /// Whether the token expires within the refresh margin
    #[must_use]
    pub fn needs_refresh(&self) -> bool {
        self.expires_at - Utc::now() <= ChronoDuration::seconds(REFRESH_MARGIN_SECS)
    }
}

/// Source of bearer tokens
#[async_trait]
pub trait TokenCredential: Send + Sync {
    /// Credential name for logs and error messages
    fn name(&self) -> &'static str;

    /// Acquire a token for the given scope
    async fn get_token(&self, scope: &str) -> GatewayResult<AccessToken>;
}

/// Fixed token supplied through `AZURE_AI_ACCESS_TOKEN`
pub struct StaticTokenCredential {
    token: SecretString,
}

impl StaticTokenCredential {
    /// Wrap a pre-issued token
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: SecretString::new(token.into()),
        }
    }
}

#[async_trait]
impl TokenCredential for StaticTokenCredential {
    fn name(&self) -> &'static str {
        "static-token"
    }

    async fn get_token(&self, _scope: &str) -> GatewayResult<AccessToken> {
        // No expiry is known; treat it as valid for a day.
        Ok(AccessToken::new(
            self.token.expose_secret().clone(),
            Utc::now() + ChronoDuration::hours(24),
        ))
    }
}

/// Service principal authenticating with a client secret
pub struct ClientSecretCredential {
    tenant_id: String,
    client_id: String,
    client_secret: SecretString,
    authority_host: String,
    http: Client,
}

impl ClientSecretCredential {
    /// Create a client secret credential against the default authority
    pub fn new(
        http: Client,
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            client_secret: SecretString::new(client_secret.into()),
            authority_host: DEFAULT_AUTHORITY_HOST.to_string(),
            http,
        }
    }

    /// Use a different authority (sovereign clouds, tests)
    #[must_use]
    pub fn with_authority_host(mut self, host: impl Into<String>) -> Self {
        self.authority_host = host.into().trim_end_matches('/').to_string();
        self
    }

    fn token_url(&self) -> String {
        format!("{}/{}/oauth2/v2.0/token", self.authority_host, self.tenant_id)
    }
}

#[derive(Debug, Deserialize)]
struct ClientCredentialsResponse {
    access_token: String,
    expires_in: i64,
}

#[async_trait]
impl TokenCredential for ClientSecretCredential {
    fn name(&self) -> &'static str {
        "client-secret"
    }

    async fn get_token(&self, scope: &str) -> GatewayResult<AccessToken> {
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.expose_secret().as_str()),
            ("scope", scope),
        ];

        let response = self
            .http
            .post(self.token_url())
            .form(&form)
            .send()
            .await
            .map_err(|e| GatewayError::authentication(format!("token request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::authentication(format!(
                "token endpoint returned {status}: {body}"
            )));
        }

        let body: ClientCredentialsResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::authentication(format!("invalid token response: {e}")))?;

        Ok(AccessToken::new(
            body.access_token,
            Utc::now() + ChronoDuration::seconds(body.expires_in),
        ))
    }
}

/// Managed identity exposed through `IDENTITY_ENDPOINT` and `IDENTITY_HEADER`
pub struct ManagedIdentityCredential {
    endpoint: String,
    header: SecretString,
    client_id: Option<String>,
    http: Client,
}

impl ManagedIdentityCredential {
    /// Create a managed identity credential
    pub fn new(http: Client, endpoint: impl Into<String>, header: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            header: SecretString::new(header.into()),
            client_id: None,
            http,
        }
    }

    /// Select a user-assigned identity
    #[must_use]
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }
}

#[derive(Debug, Deserialize)]
struct ManagedIdentityResponse {
    access_token: String,
    expires_on: serde_json::Value,
}

fn parse_expires_on(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    let secs = match value {
        serde_json::Value::Number(n) => n.as_i64()?,
        serde_json::Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    DateTime::from_timestamp(secs, 0)
}

#[async_trait]
impl TokenCredential for ManagedIdentityCredential {
    fn name(&self) -> &'static str {
        "managed-identity"
    }

    async fn get_token(&self, scope: &str) -> GatewayResult<AccessToken> {
        let resource = scope.trim_end_matches("/.default");
        let mut query = vec![("api-version", IDENTITY_API_VERSION), ("resource", resource)];
        if let Some(client_id) = &self.client_id {
            query.push(("client_id", client_id.as_str()));
        }

        let response = self
            .http
            .get(&self.endpoint)
            .header("X-IDENTITY-HEADER", self.header.expose_secret().as_str())
            .query(&query)
            .send()
            .await
            .map_err(|e| {
                GatewayError::authentication(format!("identity endpoint unreachable: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::authentication(format!(
                "identity endpoint returned {status}: {body}"
            )));
        }

        let body: ManagedIdentityResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::authentication(format!("invalid identity response: {e}")))?;
        let expires_at = parse_expires_on(&body.expires_on).ok_or_else(|| {
            GatewayError::authentication(format!("invalid expires_on: {}", body.expires_on))
        })?;

        Ok(AccessToken::new(body.access_token, expires_at))
    }
}

/// Ordered list of credentials with a shared token cache
pub struct CredentialChain {
    sources: Vec<Arc<dyn TokenCredential>>,
    cache: Mutex<HashMap<String, AccessToken>>,
}

impl CredentialChain {
    /// Build a chain from explicit sources
    pub fn new(sources: Vec<Arc<dyn TokenCredential>>) -> Self {
        Self {
            sources,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Build a chain from the process environment.
    ///
    /// # Errors
    /// Returns an authentication error if no credential source is configured.
    pub fn from_env(http: Client) -> GatewayResult<Self> {
        Self::from_vars(http, &std::env::vars().collect())
    }

    /// Build a chain from a set of environment variables.
    ///
    /// # Errors
    /// Returns an authentication error if no credential source is configured.
    pub fn from_vars(http: Client, vars: &HashMap<String, String>) -> GatewayResult<Self> {
        let get = |key: &str| vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());
        let mut sources: Vec<Arc<dyn TokenCredential>> = Vec::new();

        if let Some(token) = get("AZURE_AI_ACCESS_TOKEN") {
            sources.push(Arc::new(StaticTokenCredential::new(token)));
        }

        if let (Some(tenant), Some(client), Some(secret)) = (
            get("AZURE_TENANT_ID"),
            get("AZURE_CLIENT_ID"),
            get("AZURE_CLIENT_SECRET"),
        ) {
            let mut credential = ClientSecretCredential::new(http.clone(), tenant, client, secret);
            if let Some(host) = get("AZURE_AUTHORITY_HOST") {
                credential = credential.with_authority_host(host);
            }
            sources.push(Arc::new(credential));
        }

        if let (Some(endpoint), Some(header)) = (get("IDENTITY_ENDPOINT"), get("IDENTITY_HEADER")) {
            let mut credential = ManagedIdentityCredential::new(http, endpoint, header);
            if let Some(client_id) = get("AZURE_CLIENT_ID") {
                credential = credential.with_client_id(client_id);
            }
            sources.push(Arc::new(credential));
        }

        if sources.is_empty() {
            return Err(GatewayError::authentication(
                "no credential source configured: set AZURE_AI_ACCESS_TOKEN, \
                 AZURE_TENANT_ID/AZURE_CLIENT_ID/AZURE_CLIENT_SECRET, \
                 or run with a managed identity",
            ));
        }

        let names: Vec<&str> = sources.iter().map(|s| s.name()).collect();
        info!(sources = ?names, "Credential chain configured");

        Ok(Self::new(sources))
    }

    /// Names of the configured sources, in order
    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }
}

#[async_trait]
impl TokenCredential for CredentialChain {
    fn name(&self) -> &'static str {
        "chain"
    }

    async fn get_token(&self, scope: &str) -> GatewayResult<AccessToken> {
        let mut cache = self.cache.lock().await;
        if let Some(token) = cache.get(scope).filter(|t| !t.needs_refresh()) {
            return Ok(token.clone());
        }

        let mut failures = Vec::new();
        for source in &self.sources {
            match source.get_token(scope).await {
                Ok(token) => {
                    debug!(
                        source = source.name(),
                        expires_at = %token.expires_at,
                        "Acquired token"
                    );
                    cache.insert(scope.to_string(), token.clone());
                    return Ok(token);
                }
                Err(e) => {
                    warn!(source = source.name(), error = %e, "Credential source failed");
                    failures.push(format!("{}: {e}", source.name()));
                }
            }
        }

        Err(GatewayError::authentication(format!(
            "all credential sources failed ({})",
            failures.join("; ")
        )))
    }
}
