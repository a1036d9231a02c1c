// Data models for the ParkEase API
// Vehicle and transaction records stay opaque JSON

pub mod garage;
pub mod parking;
pub mod payment;
pub mod user;

pub use garage::GarageSummary;
pub use parking::{LotSummary, ParkingSpace, SpaceStatus, SpaceStatusUpdate};
pub use payment::{CardDetails, CustomerInfo, PaymentRequest, BOOKING_AMOUNT_CENTS};
pub use user::{ManagedUser, VehicleEntry};
