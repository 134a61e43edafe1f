pub mod dto;
pub mod gateway;
pub mod middleware;
pub mod routes;
pub mod ws;

// Re-export for convenience
pub use crate::infrastructure::app_state::AppState;
