use anyhow::{Context, Result as AnyResult};
use reqwest::{header::AUTHORIZATION, Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::auth::{read_body, AuthManager, RefreshOutcome, TokenStore};
use crate::error::{ClientError, Result};

/// Build the shared HTTP client with connection pooling
pub fn build_http_client(connect_timeout: u64, request_timeout: u64) -> AnyResult<Client> {
    Client::builder()
        .connect_timeout(Duration::from_secs(connect_timeout))
        .timeout(Duration::from_secs(request_timeout))
        .build()
        .context("Failed to create HTTP client")
}

/// An API call awaiting its outcome.
///
/// The retry marker is one-shot: `into_retry` yields the reissued request and
/// a request that already carries the marker is never retried again.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Value>,
    retried: bool,
}

impl PendingRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn is_retried(&self) -> bool {
        self.retried
    }

    /// The same call, marked as already retried
    fn into_retry(self) -> Self {
        Self {
            retried: true,
            ..self
        }
    }
}

/// Successful response from the remote API
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

/// Outcome of one send
enum Attempt {
    Completed(ApiResponse),
    Unauthorized,
}

/// HTTP client for the ParkEase API with bearer attachment and refresh-once retry
#[derive(Clone)]
pub struct AuthenticatedClient {
    /// Shared HTTP client with connection pooling
    client: Client,

    /// Session owner, used for the refresh step
    auth: AuthManager,
}

impl AuthenticatedClient {
    pub fn new(client: Client, auth: AuthManager) -> Self {
        Self { client, auth }
    }

    pub fn auth(&self) -> &AuthManager {
        &self.auth
    }

    pub fn store(&self) -> &TokenStore {
        self.auth.store()
    }

    /// Execute an authenticated request.
    ///
    /// - no stored token: `NoCredential`, nothing is sent
    /// - 401: refresh once, reissue once; a second 401 is `AuthExhausted`
    /// - other non-2xx: `Api` with the response body
    pub async fn send(&self, request: PendingRequest) -> Result<ApiResponse> {
        let mut request = request;
        let mut token = self.store().get()?.ok_or(ClientError::NoCredential)?;

        loop {
            match self.execute(&request, &token).await? {
                Attempt::Completed(response) => return Ok(response),
                Attempt::Unauthorized if request.is_retried() => {
                    tracing::warn!(
                        method = %request.method,
                        path = %request.path,
                        "Session still rejected after refresh"
                    );
                    self.store().clear()?;
                    return Err(ClientError::AuthExhausted);
                }
                Attempt::Unauthorized => {
                    tracing::warn!(
                        method = %request.method,
                        path = %request.path,
                        "Received 401, refreshing token and retrying..."
                    );
                    let RefreshOutcome::Refreshed(new_token) = self.auth.refresh(&token).await?;
                    token = new_token;
                    request = request.into_retry();
                }
            }
        }
    }

    /// Execute a request and decode the success body
    pub async fn send_json<T: DeserializeOwned>(&self, request: PendingRequest) -> Result<T> {
        let path = request.path.clone();
        let response = self.send(request).await?;
        let data = serde_json::from_value(response.body)
            .with_context(|| format!("Failed to parse response from {}", path))?;
        Ok(data)
    }

    pub async fn get(&self, path: &str) -> Result<ApiResponse> {
        self.send(PendingRequest::get(path)).await
    }

    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<ApiResponse> {
        self.send(PendingRequest::new(Method::POST, path).with_body(to_value(body)?))
            .await
    }

    pub async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<ApiResponse> {
        self.send(PendingRequest::new(Method::PUT, path).with_body(to_value(body)?))
            .await
    }

    pub async fn patch<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<ApiResponse> {
        self.send(PendingRequest::new(Method::PATCH, path).with_body(to_value(body)?))
            .await
    }

    pub async fn delete(&self, path: &str) -> Result<ApiResponse> {
        self.send(PendingRequest::new(Method::DELETE, path)).await
    }

    /// Single send with `token` attached
    async fn execute(&self, request: &PendingRequest, token: &str) -> Result<Attempt> {
        let url = format!("{}{}", self.auth.base_url(), request.path);

        tracing::debug!(
            method = %request.method,
            url = %url,
            retried = request.retried,
            "Sending HTTP request"
        );

        let mut builder = self
            .client
            .request(request.method.clone(), &url)
            .header(AUTHORIZATION, token);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                let err = ClientError::network(&e);
                tracing::warn!(url = %url, error = %e, "HTTP request error");
                return Err(err);
            }
        };

        let status = response.status();
        tracing::debug!(status = %status, "Received HTTP response");

        if status == StatusCode::UNAUTHORIZED {
            return Ok(Attempt::Unauthorized);
        }

        let body = read_body(response).await;
        if status.is_success() {
            return Ok(Attempt::Completed(ApiResponse {
                status: status.as_u16(),
                body,
            }));
        }

        tracing::error!(
            status = status.as_u16(),
            url = %url,
            response_body = %body,
            "HTTP request failed with error response"
        );
        Err(ClientError::Api {
            status: status.as_u16(),
            body,
        })
    }
}

fn to_value<B: Serialize + ?Sized>(body: &B) -> Result<Value> {
    let value = serde_json::to_value(body).context("Failed to serialize request body")?;
    Ok(value)
}
