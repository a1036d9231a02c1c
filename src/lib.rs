// ParkEase console - library root

pub mod api;
pub mod auth;
pub mod booking;
pub mod config;
pub mod error;
pub mod http_client;
pub mod inventory;
pub mod models;
pub mod payment;
mod storage;
pub mod validation;

pub use api::ApiService;
pub use auth::{AuthManager, TokenStore};
pub use error::ClientError;
pub use http_client::{ApiResponse, AuthenticatedClient, PendingRequest};
