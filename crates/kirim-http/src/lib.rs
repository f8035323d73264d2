//! HTTP gateway (axum) in front of the kirim dispatch core.

mod auth;
mod error;
mod routes;
mod server;

pub use auth::API_KEY_HEADER;
pub use error::ApiError;
pub use routes::{
    router, GatewayState, GroupSendRequest, HealthResponse, PersonalSendRequest,
};
pub use server::run_http;
