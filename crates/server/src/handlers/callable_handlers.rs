//! # Callable Function Handlers
//!
//! `POST /callable/{name}` endpoints that speak the callable-function
//! protocol: the payload arrives as `{"data": {...}}` and the answer goes
//! back as `{"result": {...}}`. Authentication, role and argument problems
//! are HTTP errors; a failure inside the workflow is a `200` with
//! `success: false`.

use crate::{
    auth::middleware::AuthenticatedUser,
    errors::AppError,
    handlers::{wrap_response, ApiResponse, DebugParams},
    state::AppState,
    types::{AprobarData, CallableRequest, CallableResult, RechazarData},
};
use axum::{
    extract::{Query, State},
    Json,
};
use fletia::{approve_carrier, constants::MSG_ID_REQUIRED, reject_carrier};
use serde_json::json;
use tracing::{info, warn};

fn require_id(raw: Option<String>) -> Result<String, AppError> {
    raw.map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::BadRequest(MSG_ID_REQUIRED.to_string()))
}

/// `aprobarTransportista`: approves a carrier, creates or reuses their
/// account and emails the credentials.
pub async fn aprobar_transportista_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    debug_params: Query<DebugParams>,
    Json(payload): Json<CallableRequest<AprobarData>>,
) -> Result<Json<ApiResponse<CallableResult>>, AppError> {
    let admin = user.require_admin()?;
    let id = require_id(payload.data.transportista_id)?;

    let (result, debug_info) =
        match approve_carrier(&app_state.sqlite_provider, app_state.mailer.as_ref(), &id).await {
            Ok(aprobacion) => {
                info!(id = %id, by = %admin.uid, "aprobarTransportista succeeded");
                let debug_info = json!({ "email_sent": aprobacion.email_sent });
                (
                    CallableResult::ok(aprobacion.message, Some(aprobacion.uid)),
                    Some(debug_info),
                )
            }
            Err(e) => {
                warn!(id = %id, "aprobarTransportista failed: {}", e);
                (CallableResult::failed(e.to_string()), None)
            }
        };
    Ok(wrap_response(result, debug_params, debug_info))
}

/// `rechazarTransportista`: marks a carrier application as rejected.
pub async fn rechazar_transportista_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    debug_params: Query<DebugParams>,
    Json(payload): Json<CallableRequest<RechazarData>>,
) -> Result<Json<ApiResponse<CallableResult>>, AppError> {
    let admin = user.require_admin()?;
    let id = require_id(payload.data.transportista_id)?;

    let result = match reject_carrier(
        &app_state.sqlite_provider,
        &id,
        payload.data.motivo.as_deref(),
    )
    .await
    {
        Ok(message) => {
            info!(id = %id, by = %admin.uid, "rechazarTransportista succeeded");
            CallableResult::ok(message, None)
        }
        Err(e) => {
            warn!(id = %id, "rechazarTransportista failed: {}", e);
            CallableResult::failed(e.to_string())
        }
    };
    Ok(wrap_response(result, debug_params, None))
}
