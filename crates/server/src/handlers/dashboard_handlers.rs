//! # Dashboard Route Handlers

use crate::{
    auth::middleware::AuthenticatedUser,
    errors::AppError,
    handlers::{wrap_response, ApiResponse, DebugParams},
    state::AppState,
};
use axum::{
    extract::{Query, State},
    Json,
};
use fletia::dashboard::{self, Resumen};

/// Returns the summary for the caller's role.
pub async fn dashboard_summary_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    debug_params: Query<DebugParams>,
) -> Result<Json<ApiResponse<Resumen>>, AppError> {
    let resumen = dashboard::resumen_for(&app_state.sqlite_provider, &user.0).await?;
    Ok(wrap_response(resumen, debug_params, None))
}
