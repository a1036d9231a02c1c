// Authentication wire types

use serde::{Deserialize, Serialize};

/// Login request; the console's email field is sent as `username`
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub jwt: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Account registration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegisterRequest {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub password: String,
}

/// Refresh response.
/// The backend has answered with each of these field names over time.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshResponse {
    #[serde(alias = "token", alias = "accessToken", alias = "access_token")]
    pub jwt: String,
}

/// `GET /auth/check-admin`
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdminCheck {
    pub is_admin: bool,
}

/// Result of the refresh step of a pending request
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// New normalized credential, already written to the token store
    Refreshed(String),
}
