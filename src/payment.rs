// Card tokenization against the payment processor

use anyhow::Context;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;

use crate::auth::read_body;
use crate::error::{ClientError, Result};
use crate::models::CardDetails;
use crate::validation;

#[derive(Deserialize)]
struct PaymentMethodResponse {
    id: String,
}

/// Exchanges raw card details for a payment-method id using the publishable key.
/// Card data goes straight to the processor; the ParkEase API only sees the id.
#[derive(Clone)]
pub struct PaymentProcessor {
    client: Client,
    api_base: String,
    publishable_key: String,
}

impl PaymentProcessor {
    pub fn new(client: Client, api_base: impl Into<String>, publishable_key: impl Into<String>) -> Self {
        Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            publishable_key: publishable_key.into(),
        }
    }

    /// Validate the card, then create a payment method for it
    pub async fn create_payment_method(&self, card: &CardDetails, today: NaiveDate) -> Result<String> {
        let number = validation::validate_card_number(&card.number)?;
        let expiration = validation::validate_expiration(&card.expiration, today)?;
        validation::validate_cvv(&card.cvv)?;

        tracing::info!("Creating payment method for card {:?}", card);

        let exp_month = expiration.month.to_string();
        let exp_year = expiration.year.to_string();
        let form = [
            ("type", "card"),
            ("card[number]", number.as_str()),
            ("card[exp_month]", exp_month.as_str()),
            ("card[exp_year]", exp_year.as_str()),
            ("card[cvc]", card.cvv.trim()),
        ];

        let response = self
            .client
            .post(format!("{}/v1/payment_methods", self.api_base))
            .bearer_auth(&self.publishable_key)
            .form(&form)
            .send()
            .await
            .map_err(|e| ClientError::network(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = read_body(response).await;
            tracing::warn!(status = status.as_u16(), "Payment processor rejected the card");
            return Err(ClientError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let data: PaymentMethodResponse = response
            .json()
            .await
            .context("Failed to parse payment method response")?;

        tracing::info!("Payment method created: {}", data.id);
        Ok(data.id)
    }
}
