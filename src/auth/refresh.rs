// Token refresh logic

use anyhow::{Context, Result};
use reqwest::Client;

use super::token_store::normalize_bearer;
use super::types::RefreshResponse;

/// Refresh endpoint, relative to the API base URL
pub const REFRESH_PATH: &str = "/auth/refresh";

/// Exchange the current (possibly stale) credential for a new one.
/// Returns the new credential normalized with a `Bearer ` prefix.
pub async fn refresh_token(client: &Client, base_url: &str, current: &str) -> Result<String> {
    tracing::info!("Refreshing session token...");

    let url = format!("{}{}", base_url, REFRESH_PATH);

    let response = client
        .post(&url)
        .header("Authorization", current)
        .send()
        .await
        .context("Failed to send refresh request")?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        tracing::warn!(
            status = status.as_u16(),
            body = %error_text,
            "Refresh endpoint rejected the session token"
        );
        anyhow::bail!("Refresh rejected: {} - {}", status, error_text);
    }

    let data: RefreshResponse = response
        .json()
        .await
        .context("Failed to parse refresh response")?;

    let token = normalize_bearer(&data.jwt)
        .context("Refresh response does not contain a token")?;

    tracing::info!("Session token refreshed");
    Ok(token)
}
