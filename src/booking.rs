// Space booking wizard: terms, customer details, payment

use chrono::NaiveDate;
use serde_json::Value;

use crate::api::ApiService;
use crate::error::{ClientError, Result};
use crate::models::{CardDetails, CustomerInfo, ParkingSpace, PaymentRequest, SpaceStatus};
use crate::payment::PaymentProcessor;
use crate::validation;

/// Wizard position; `space` is always the space number, not the record id
#[derive(Debug, Clone, PartialEq)]
pub enum BookingStep {
    SelectSpace,
    Terms { space: i64 },
    CustomerDetails { space: i64 },
    Payment { space: i64, customer: CustomerInfo },
    /// Card charged but the space is not yet marked booked
    Charged { space: i64, receipt: Value },
    Booked { space: i64, receipt: Value },
}

/// One booking on behalf of a customer
#[derive(Debug, Clone)]
pub struct BookingFlow {
    step: BookingStep,
}

impl Default for BookingFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl BookingFlow {
    pub fn new() -> Self {
        Self {
            step: BookingStep::SelectSpace,
        }
    }

    pub fn step(&self) -> &BookingStep {
        &self.step
    }

    fn out_of_order(&self, action: &str) -> ClientError {
        ClientError::validation(
            "booking",
            format!("cannot {} at step {:?}", action, self.step),
        )
    }

    /// Pick a space; only available spaces can be booked
    pub fn select_space(&mut self, space: &ParkingSpace) -> Result<()> {
        if matches!(
            self.step,
            BookingStep::Payment { .. } | BookingStep::Charged { .. }
        ) {
            return Err(self.out_of_order("change space"));
        }
        if !space.status.is_available() {
            return Err(ClientError::validation(
                "space",
                format!("space {} is {}", space.number(), space.status),
            ));
        }
        self.step = BookingStep::Terms {
            space: space.number(),
        };
        Ok(())
    }

    pub fn accept_terms(&mut self, accepted: bool) -> Result<()> {
        let BookingStep::Terms { space } = self.step else {
            return Err(self.out_of_order("accept terms"));
        };
        validation::require_terms_accepted(accepted)?;
        self.step = BookingStep::CustomerDetails { space };
        Ok(())
    }

    /// Declining the terms abandons the selection
    pub fn decline_terms(&mut self) {
        if matches!(self.step, BookingStep::Terms { .. }) {
            self.step = BookingStep::SelectSpace;
        }
    }

    pub fn submit_customer(&mut self, customer: CustomerInfo) -> Result<()> {
        let BookingStep::CustomerDetails { space } = self.step else {
            return Err(self.out_of_order("enter customer details"));
        };
        validation::require_field("first name", &customer.first_name)?;
        validation::require_field("last name", &customer.last_name)?;
        validation::require_field("phone number", &customer.phone_number)?;
        validation::require_field("address", &customer.address)?;
        validation::require_field("email", &customer.email)?;

        self.step = BookingStep::Payment { space, customer };
        Ok(())
    }

    /// Tokenize the card, charge the booking, then mark the space booked.
    /// Card validation failures return before any network call. When the
    /// charge went through but the status update failed, calling again only
    /// repeats the status update.
    pub async fn pay(
        &mut self,
        api: &ApiService,
        processor: &PaymentProcessor,
        card: &CardDetails,
        today: NaiveDate,
    ) -> Result<Value> {
        if let BookingStep::Payment { space, ref customer } = self.step {
            let payment_method_id = processor.create_payment_method(card, today).await?;
            let payment = PaymentRequest::booking(payment_method_id, space, customer.clone());
            let receipt = api.charge(&payment).await?;
            tracing::info!("Payment accepted for space {}", space);
            self.step = BookingStep::Charged { space, receipt };
        }

        let BookingStep::Charged { space, ref receipt } = self.step else {
            return Err(self.out_of_order("pay"));
        };
        let receipt = receipt.clone();

        api.update_space_status(space, SpaceStatus::Booked).await?;

        tracing::info!("Space {} booked", space);
        self.step = BookingStep::Booked {
            space,
            receipt: receipt.clone(),
        };

        Ok(receipt)
    }
}
