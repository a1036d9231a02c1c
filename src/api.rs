// Typed calls for every ParkEase API route

use chrono::NaiveDate;
use serde_json::Value;

use crate::auth::{AdminCheck, RegisterRequest};
use crate::error::Result;
use crate::http_client::{ApiResponse, AuthenticatedClient, PendingRequest};
use crate::models::{ManagedUser, ParkingSpace, PaymentRequest, SpaceStatus, SpaceStatusUpdate};
use crate::validation;

/// Endpoint calls used by the console screens
#[derive(Clone)]
pub struct ApiService {
    client: AuthenticatedClient,
}

impl ApiService {
    pub fn new(client: AuthenticatedClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &AuthenticatedClient {
        &self.client
    }

    // === Users ===

    pub async fn check_admin(&self) -> Result<bool> {
        let check: AdminCheck = self
            .client
            .send_json(PendingRequest::get("/auth/check-admin"))
            .await?;
        Ok(check.is_admin)
    }

    pub async fn search_user(&self, email: &str) -> Result<Value> {
        validation::require_field("email", email)?;
        let response = self
            .client
            .send(PendingRequest::get("/users/search").with_query("email", email))
            .await?;
        Ok(response.body)
    }

    /// Register a plain account while logged in (admin variant of registration)
    pub async fn register_user(&self, request: &RegisterRequest) -> Result<Value> {
        validation::require_field("email", &request.email)?;
        validation::require_field("password", &request.password)?;
        Ok(self.client.post("/auth/register", request).await?.body)
    }

    /// Register a user together with payment details; card fields are checked first
    pub async fn register_user_with_payment(&self, user: &ManagedUser, today: NaiveDate) -> Result<Value> {
        validate_managed_user(user, today)?;
        validation::require_field("password", &user.password)?;
        Ok(self.client.post("/auth/register", user).await?.body)
    }

    pub async fn update_user(&self, id: i64, user: &ManagedUser, today: NaiveDate) -> Result<Value> {
        validate_managed_user(user, today)?;
        Ok(self
            .client
            .put(&format!("/auth/update/{}", id), user)
            .await?
            .body)
    }

    pub async fn delete_user(&self, id: i64) -> Result<ApiResponse> {
        self.client.delete(&format!("/auth/delete/{}", id)).await
    }

    // === Parking lot ===

    pub async fn list_spaces(&self) -> Result<Vec<ParkingSpace>> {
        self.client
            .send_json(PendingRequest::get("/parkinglots/spaces"))
            .await
    }

    /// Addressed by space number, not record id
    pub async fn update_space_status(&self, space_number: i64, status: SpaceStatus) -> Result<Value> {
        tracing::info!("Setting space {} to {}", space_number, status);
        let body = SpaceStatusUpdate { status };
        Ok(self
            .client
            .patch(&format!("/parkinglots/spaces/{}", space_number), &body)
            .await?
            .body)
    }

    /// Charge a tokenized card for a booking
    pub async fn charge(&self, payment: &PaymentRequest) -> Result<Value> {
        tracing::info!(
            space = payment.space_number,
            amount = payment.amount,
            "Submitting payment"
        );
        Ok(self.client.post("/payment", payment).await?.body)
    }

    // === Garage ===

    pub async fn list_vehicles(&self) -> Result<Vec<Value>> {
        self.client.send_json(PendingRequest::get("/vehicles")).await
    }

    pub async fn get_vehicle(&self, id: &str) -> Result<Value> {
        Ok(self.client.get(&format!("/vehicles/{}", id)).await?.body)
    }

    /// Create a vehicle record; a `vin` field, when present, must be well formed
    pub async fn create_vehicle(&self, vehicle: &Value) -> Result<Value> {
        let vehicle = normalize_vin_field(vehicle)?;
        Ok(self.client.post("/vehicles", &vehicle).await?.body)
    }

    pub async fn update_vehicle(&self, id: &str, patch: &Value) -> Result<Value> {
        let patch = normalize_vin_field(patch)?;
        Ok(self
            .client
            .patch(&format!("/vehicles/{}", id), &patch)
            .await?
            .body)
    }

    pub async fn list_transactions(&self) -> Result<Vec<Value>> {
        self.client
            .send_json(PendingRequest::get("/transactions"))
            .await
    }

    pub async fn create_transaction(&self, transaction: &Value) -> Result<Value> {
        Ok(self.client.post("/transactions", transaction).await?.body)
    }
}

fn validate_managed_user(user: &ManagedUser, today: NaiveDate) -> Result<()> {
    validation::require_field("email", &user.email)?;
    validation::validate_card_number(&user.card_number)?;
    validation::validate_expiration(&user.expiration_date, today)?;
    validation::validate_cvv(&user.cvv)?;
    Ok(())
}

/// Check and uppercase the `vin` field of an opaque vehicle record
fn normalize_vin_field(record: &Value) -> Result<Value> {
    let mut record = record.clone();
    if let Some(vin) = record.get("vin").and_then(|v| v.as_str()) {
        let vin = validation::validate_vin(vin)?;
        record["vin"] = Value::String(vin);
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use serde_json::json;

    #[test]
    fn test_normalize_vin_field() {
        let record = normalize_vin_field(&json!({"vin": "1hgcm82633a004352", "make": "Honda"})).unwrap();
        assert_eq!(record["vin"], "1HGCM82633A004352");
        assert_eq!(record["make"], "Honda");

        // Records without a VIN pass through
        let record = normalize_vin_field(&json!({"plateNumber": "ABC123"})).unwrap();
        assert_eq!(record, json!({"plateNumber": "ABC123"}));

        let err = normalize_vin_field(&json!({"vin": "short"})).unwrap_err();
        assert!(matches!(err, ClientError::Validation { field: "vin", .. }));
    }

    #[test]
    fn test_validate_managed_user() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let mut user = ManagedUser {
            email: "a@b.c".to_string(),
            card_number: "4242424242424242".to_string(),
            expiration_date: "11/27".to_string(),
            cvv: "321".to_string(),
            ..Default::default()
        };
        assert!(validate_managed_user(&user, today).is_ok());

        user.cvv = "1".to_string();
        assert!(matches!(
            validate_managed_user(&user, today).unwrap_err(),
            ClientError::Validation { field: "cvv", .. }
        ));
    }
}
