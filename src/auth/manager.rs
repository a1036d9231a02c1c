use anyhow::Context;
use reqwest::Client;
use serde_json::Value;

use super::refresh;
use super::token_store::TokenStore;
use super::types::{LoginRequest, LoginResponse, RefreshOutcome, RegisterRequest};
use crate::error::{ClientError, Result};

/// Authentication manager
/// Owns the login/logout/refresh side of the session lifecycle
#[derive(Clone)]
pub struct AuthManager {
    /// Persisted session credential
    store: TokenStore,

    /// HTTP client for unauthenticated and refresh calls
    client: Client,

    /// API base URL, e.g. `http://localhost:8080/api`
    base_url: String,
}

impl AuthManager {
    pub fn new(store: TokenStore, client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            store,
            client,
            base_url,
        }
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Exchange email and password for a session token and store it
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        tracing::info!("Logging in as {}", email);

        let request = LoginRequest {
            username: email.to_string(),
            password: password.to_string(),
        };

        let response = self
            .client
            .post(format!("{}/auth/login", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| ClientError::network(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = read_body(response).await;
            tracing::warn!(status = status.as_u16(), "Login rejected");
            return Err(ClientError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let data: LoginResponse = response
            .json()
            .await
            .context("Failed to parse login response")?;

        if data.jwt.trim().is_empty() {
            return Err(ClientError::Internal(anyhow::anyhow!(
                "Login response does not contain a token"
            )));
        }

        self.store.set(Some(&data.jwt))?;
        tracing::info!("Login successful");

        Ok(data)
    }

    /// Create an account (self-service, no session required)
    pub async fn register(&self, request: &RegisterRequest) -> Result<Value> {
        tracing::info!("Registering account {}", request.email);

        let response = self
            .client
            .post(format!("{}/auth/register", self.base_url))
            .json(request)
            .send()
            .await
            .map_err(|e| ClientError::network(&e))?;

        let status = response.status();
        let body = read_body(response).await;
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Registration rejected");
            return Err(ClientError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }

    /// Drop the local session
    pub fn logout(&self) -> Result<()> {
        self.store.clear()?;
        tracing::info!("Logged out");
        Ok(())
    }

    /// Refresh step of a pending request: authenticate with `current`,
    /// store the new credential, or clear the session on any failure.
    pub async fn refresh(&self, current: &str) -> Result<RefreshOutcome> {
        match refresh::refresh_token(&self.client, &self.base_url, current).await {
            Ok(token) => {
                self.store.set(Some(&token))?;
                Ok(RefreshOutcome::Refreshed(token))
            }
            Err(e) => {
                tracing::error!("Token refresh failed: {:#}", e);
                self.store.clear()?;
                Err(ClientError::RefreshFailed(format!("{:#}", e)))
            }
        }
    }
}

/// Read a response body as JSON, falling back to a JSON string for plain text
pub(crate) async fn read_body(response: reqwest::Response) -> Value {
    let text = response.text().await.unwrap_or_default();
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}
