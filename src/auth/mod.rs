// Authentication module
// Session token storage, login and refresh

mod manager;
mod refresh;
mod token_store;
mod types;

pub use manager::AuthManager;
pub(crate) use manager::read_body;
pub use refresh::REFRESH_PATH;
pub use token_store::{normalize_bearer, TokenStore};
pub use types::{AdminCheck, LoginRequest, LoginResponse, RefreshOutcome, RegisterRequest};
