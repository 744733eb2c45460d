//! # API Route Handlers
//!
//! This module organizes all the Axum route handlers for the `fletia-server`.
//! The handlers are split into logical sub-modules based on the part of the
//! marketplace they serve.

pub mod admin_handlers;
pub mod auth_handlers;
pub mod callable_handlers;
pub mod carrier_handlers;
pub mod chat_handlers;
pub mod dashboard_handlers;
pub mod general;
pub mod request_handlers;

// Re-export all handlers so the router can reach them under `handlers::`.
pub use admin_handlers::*;
pub use auth_handlers::*;
pub use callable_handlers::*;
pub use carrier_handlers::*;
pub use chat_handlers::*;
pub use dashboard_handlers::*;
pub use general::*;
pub use request_handlers::*;

// Shared items used by multiple handler modules.
pub use super::types::{ApiResponse, DebugParams};
use axum::{extract::Query, Json};
use serde_json::Value;

/// A shared helper function to wrap a successful result in the standard `ApiResponse`
/// format, optionally including debug information if requested.
pub(crate) fn wrap_response<T>(
    result: T,
    debug_params: Query<DebugParams>,
    debug_info: Option<Value>,
) -> Json<ApiResponse<T>> {
    let debug = if debug_params.debug.unwrap_or(false) {
        debug_info
    } else {
        None
    };
    Json(ApiResponse { debug, result })
}
