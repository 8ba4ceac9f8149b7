pub mod config;
pub mod handlers;

pub use config::ServiceConfig;
pub use handlers::{AppState, DEFAULT_MAX_TEXT_BYTES, router};
