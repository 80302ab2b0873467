pub mod handler;
pub mod model;

pub use handler::{dashboard_admin, dashboard_usuario};
