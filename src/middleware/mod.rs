mod auth;
mod error_handler;

pub use auth::{auth_middleware, optional_auth_middleware, require_admin};
pub use error_handler::log_errors;
