use serde::{Deserialize, Serialize};

/// Price of one booking, in cents ($10.00)
pub const BOOKING_AMOUNT_CENTS: u64 = 1000;

/// Customer details collected while booking a space
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub address: String,
    pub email: String,
}

/// Raw card fields as typed by the operator
#[derive(Clone, Default, PartialEq)]
pub struct CardDetails {
    pub number: String,
    /// `MM/YY`
    pub expiration: String,
    pub cvv: String,
}

impl std::fmt::Debug for CardDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let digits: String = self.number.chars().filter(|c| c.is_ascii_digit()).collect();
        let last4 = digits.get(digits.len().saturating_sub(4)..).unwrap_or("");
        f.debug_struct("CardDetails")
            .field("number", &format!("****{}", last4))
            .field("expiration", &self.expiration)
            .field("cvv", &"***")
            .finish()
    }
}

/// `POST /payment`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub payment_method_id: String,
    pub space_number: i64,
    pub user_info: CustomerInfo,
    pub amount: u64,
}

impl PaymentRequest {
    pub fn booking(payment_method_id: String, space_number: i64, user_info: CustomerInfo) -> Self {
        Self {
            payment_method_id,
            space_number,
            user_info,
            amount: BOOKING_AMOUNT_CENTS,
        }
    }
}
