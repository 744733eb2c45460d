//! # Admin Route Handlers
//!
//! This module contains handlers for endpoints that require the
//! `administrador` role: account management and the carrier approval queue.

use crate::{
    auth::middleware::AuthenticatedUser,
    errors::AppError,
    handlers::{wrap_response, ApiResponse, DebugParams},
    state::AppState,
    types::{ActivoRequest, EstadoQuery, MessageResponse, RechazoRequest},
};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use fletia::{
    access,
    carriers::{self, EstadoVerificacion, Transportista},
    approve_carrier, reject_carrier, Aprobacion, Usuario,
};
use serde_json::json;
use tracing::info;

/// Handler for retrieving a list of all accounts, newest first.
pub async fn list_users_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    debug_params: Query<DebugParams>,
) -> Result<Json<ApiResponse<Vec<Usuario>>>, AppError> {
    let admin = user.require_admin()?;
    info!(uid = %admin.uid, "Listing all accounts.");

    let usuarios = access::list_usuarios(&app_state.sqlite_provider.db).await?;

    let debug_info = json!({ "requesting_user_id": admin.uid, "user_count": usuarios.len() });
    Ok(wrap_response(usuarios, debug_params, Some(debug_info)))
}

/// Enables or disables an account. Disabled accounts cannot sign in and
/// their existing tokens stop working.
pub async fn set_user_active_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(uid): Path<String>,
    debug_params: Query<DebugParams>,
    Json(payload): Json<ActivoRequest>,
) -> Result<Json<ApiResponse<Usuario>>, AppError> {
    let admin = user.require_admin()?;
    if admin.uid == uid && !payload.activo {
        return Err(AppError::BadRequest(
            "No puedes desactivar tu propia cuenta.".to_string(),
        ));
    }
    let usuario = access::set_activo(&app_state.sqlite_provider.db, &uid, payload.activo).await?;
    Ok(wrap_response(usuario, debug_params, None))
}

/// Lists carrier profiles, optionally filtered by verification state
/// (`pendiente`, `aprobado`, `rechazado`).
pub async fn list_carriers_admin_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<EstadoQuery>,
    debug_params: Query<DebugParams>,
) -> Result<Json<ApiResponse<Vec<Transportista>>>, AppError> {
    user.require_admin()?;
    let estado = match query.estado.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(raw.parse::<EstadoVerificacion>()?),
    };
    let transportistas = carriers::list(&app_state.sqlite_provider, estado).await?;
    let debug_info = json!({ "estado": estado, "count": transportistas.len() });
    Ok(wrap_response(transportistas, debug_params, Some(debug_info)))
}

pub async fn approve_carrier_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    debug_params: Query<DebugParams>,
) -> Result<Json<ApiResponse<Aprobacion>>, AppError> {
    let admin = user.require_admin()?;
    let aprobacion =
        approve_carrier(&app_state.sqlite_provider, app_state.mailer.as_ref(), &id).await?;
    info!(id = %id, by = %admin.uid, email_sent = aprobacion.email_sent, "Carrier approved");
    Ok(wrap_response(aprobacion, debug_params, None))
}

pub async fn reject_carrier_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    debug_params: Query<DebugParams>,
    Json(payload): Json<RechazoRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, AppError> {
    let admin = user.require_admin()?;
    let message =
        reject_carrier(&app_state.sqlite_provider, &id, payload.motivo.as_deref()).await?;
    info!(id = %id, by = %admin.uid, "Carrier rejected");
    Ok(wrap_response(MessageResponse { message }, debug_params, None))
}
