//! Token acquisition on top of [`TokenCache`]

use base64::{engine::general_purpose, Engine as _};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::configuration::{AuthEndpointConfig, Configuration, GrantType};
use crate::endpoints::{CONTENT_TYPE_JSON, HEADER_ACCEPT};
use crate::error::AuthError;
use crate::token_cache::{TokenCache, Ttl};
use crate::transport::{ApiRequest, HttpMethod, HttpTransport};

/// Fetches tokens from configured endpoints and keeps them in a shared cache
pub struct AuthenticationManager {
    cache: Arc<TokenCache>,
    auth: HashMap<String, AuthEndpointConfig>,
    transport: Arc<dyn HttpTransport>,
}

impl AuthenticationManager {
    pub fn new(
        cache: Arc<TokenCache>,
        auth: HashMap<String, AuthEndpointConfig>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self { cache, auth, transport }
    }

    pub fn from_configuration(
        cache: Arc<TokenCache>,
        config: &Configuration,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self::new(cache, config.auth.clone(), transport)
    }

    pub fn cache(&self) -> &Arc<TokenCache> {
        &self.cache
    }

    /// Cached token for `key`, acquiring a new one when absent or expired
    pub async fn token(&self, key: &str) -> Result<String, AuthError> {
        match self.cache.fetch(key) {
            Some(token) if !token.is_empty() => Ok(token),
            _ => self.refresh_token(key).await,
        }
    }

    /// Request a fresh token for `key` and store it in the cache
    pub async fn refresh_token(&self, key: &str) -> Result<String, AuthError> {
        log::info!("Refreshing token for key: {}", key);

        let config = self
            .auth
            .get(key)
            .ok_or_else(|| AuthError::NotConfigured(key.to_string()))?;

        if config.endpoint.trim().is_empty() {
            log::error!("Token endpoint not configured for key: {}", key);
            return Err(AuthError::MissingEndpoint(key.to_string()));
        }

        let request = Self::token_request(key, config)?;
        let response = self.transport.send(request).await?;

        if !response.is_success() {
            log::error!("Failed to refresh token for key: {}", key);
            return Err(AuthError::RequestFailed {
                status: response.status_code,
                body: response.text(),
            });
        }

        let body: Value = response
            .json()
            .map_err(|e| AuthError::InvalidResponse(format!("Failed to parse token response: {}", e)))?;

        let (token, expires_in) = match config.grant {
            GrantType::Credentials => (body.get("token").and_then(Value::as_str), None),
            GrantType::ClientCredentials => (
                body.get("access_token").and_then(Value::as_str),
                body.get("expires_in").and_then(Value::as_i64),
            ),
        };

        let token = match token {
            Some(token) if !token.is_empty() => token.to_string(),
            _ => {
                log::error!("Failed to refresh token for key: {}", key);
                return Err(AuthError::InvalidResponse(format!(
                    "No token in response for key {}: {}",
                    key, body
                )));
            }
        };

        let ttl = Ttl::from(expires_in.or(config.ttl_secs).unwrap_or(-1));
        self.cache.store(key, token.clone(), ttl);
        log::info!("Token refreshed successfully for key: {}", key);

        Ok(token)
    }

    fn token_request(key: &str, config: &AuthEndpointConfig) -> Result<ApiRequest, AuthError> {
        let request = ApiRequest::new(HttpMethod::POST, config.endpoint.clone()).header(HEADER_ACCEPT, CONTENT_TYPE_JSON);

        match config.grant {
            GrantType::Credentials => {
                let (username, password) = credentials(key, config)?;
                Ok(request.json_body(&json!({ "username": username, "password": password })))
            }
            GrantType::ClientCredentials => {
                let (client_id, client_secret) = match (&config.client_id, &config.client_secret) {
                    (Some(id), Some(secret)) if !id.is_empty() => (id.as_str(), secret.as_str()),
                    _ => return Err(AuthError::MissingCredentials(key.to_string())),
                };

                let mut form = vec![
                    ("grant_type", "client_credentials"),
                    ("client_id", client_id),
                    ("client_secret", client_secret),
                ];
                if let Some(scope) = config.scope.as_deref().filter(|s| !s.is_empty()) {
                    form.push(("scope", scope));
                }

                request.form_body(&form).map_err(AuthError::from)
            }
        }
    }

    /// `Authorization` value for the token under `key`
    pub async fn bearer_header(&self, key: &str) -> Result<String, AuthError> {
        let token = self.token(key).await?;
        if token.starts_with("Bearer ") {
            Ok(token)
        } else {
            Ok(format!("Bearer {}", token))
        }
    }

    pub fn basic_auth_header(&self, username: &str, password: &str) -> String {
        log::debug!("Generating Basic Auth header for user: {}", username);
        basic_auth_value(username, password)
    }

    pub fn basic_auth_header_from_config(&self, key: &str) -> Result<String, AuthError> {
        let config = self
            .auth
            .get(key)
            .ok_or_else(|| AuthError::NotConfigured(key.to_string()))?;

        let (username, password) = credentials(key, config).map_err(|e| {
            log::error!("Basic auth credentials not found for key: {}", key);
            e
        })?;
        Ok(basic_auth_value(username, password))
    }

    pub fn clear_token(&self, key: &str) {
        self.cache.remove(key);
        log::info!("Cleared token cache for key: {}", key);
    }

    pub fn clear_all_tokens(&self) {
        self.cache.clear_all();
        log::info!("Cleared all token caches");
    }
}

fn credentials<'a>(key: &str, config: &'a AuthEndpointConfig) -> Result<(&'a str, &'a str), AuthError> {
    match (config.username.as_deref(), config.password.as_deref()) {
        (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
            Ok((username, password))
        }
        _ => Err(AuthError::MissingCredentials(key.to_string())),
    }
}

fn basic_auth_value(username: &str, password: &str) -> String {
    let encoded = general_purpose::STANDARD.encode(format!("{}:{}", username, password));
    format!("Basic {}", encoded)
}
