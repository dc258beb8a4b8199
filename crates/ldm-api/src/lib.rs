//! HTTP surface of the modeling assistant.
//!
//! Exposes the chat endpoint, history retrieval and reset, and a health
//! check, with CORS, request tracing, compression and a global rate limit.

pub mod error;
pub mod handlers;
pub mod rate_limit;
pub mod routes;
pub mod state;
pub mod user;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
pub use user::UserId;
