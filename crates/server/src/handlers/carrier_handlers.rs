//! # Carrier Route Handlers
//!
//! Public carrier applications and search, plus the carrier's own profile.

use crate::{
    auth::middleware::AuthenticatedUser,
    errors::AppError,
    handlers::{wrap_response, ApiResponse, DebugParams},
    state::AppState,
    types::DisponibleRequest,
};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use fletia::{
    carriers::{self, ActualizacionPerfil, FiltroBusqueda, RegistroTransportista, Transportista},
    constants::MSG_CARRIER_NOT_FOUND,
    MarketError, Rol,
};
use serde_json::json;
use tracing::info;

/// Handler for the public carrier application form.
pub async fn apply_handler(
    State(app_state): State<AppState>,
    debug_params: Query<DebugParams>,
    Json(payload): Json<RegistroTransportista>,
) -> Result<Json<ApiResponse<Transportista>>, AppError> {
    let transportista = carriers::submit_application(&app_state.sqlite_provider, payload).await?;
    info!(id = %transportista.id, "Received carrier application");
    Ok(wrap_response(transportista, debug_params, None))
}

/// Searches verified carriers. Filters come from the query string.
pub async fn search_carriers_handler(
    State(app_state): State<AppState>,
    Query(filtro): Query<FiltroBusqueda>,
    debug_params: Query<DebugParams>,
) -> Result<Json<ApiResponse<Vec<Transportista>>>, AppError> {
    let results = carriers::search(&app_state.sqlite_provider, &filtro).await?;
    let debug_info = json!({
        "texto": filtro.texto,
        "zona": filtro.zona,
        "tipo_vehiculo": filtro.tipo_vehiculo,
        "result_count": results.len(),
    });
    Ok(wrap_response(results, debug_params, Some(debug_info)))
}

/// Lists the zones served by verified carriers.
pub async fn zonas_handler(
    State(app_state): State<AppState>,
    debug_params: Query<DebugParams>,
) -> Result<Json<ApiResponse<Vec<String>>>, AppError> {
    let zonas = carriers::zonas(&app_state.sqlite_provider).await?;
    Ok(wrap_response(zonas, debug_params, None))
}

pub async fn get_my_carrier_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    debug_params: Query<DebugParams>,
) -> Result<Json<ApiResponse<Transportista>>, AppError> {
    let usuario = user.require_rol(Rol::Transportista)?;
    let transportista = carriers::require_by_usuario(&app_state.sqlite_provider, &usuario.uid).await?;
    Ok(wrap_response(transportista, debug_params, None))
}

pub async fn update_my_carrier_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    debug_params: Query<DebugParams>,
    Json(payload): Json<ActualizacionPerfil>,
) -> Result<Json<ApiResponse<Transportista>>, AppError> {
    let usuario = user.require_rol(Rol::Transportista)?;
    let transportista =
        carriers::update_profile(&app_state.sqlite_provider, &usuario.uid, payload).await?;
    Ok(wrap_response(transportista, debug_params, None))
}

pub async fn set_disponible_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    debug_params: Query<DebugParams>,
    Json(payload): Json<DisponibleRequest>,
) -> Result<Json<ApiResponse<Transportista>>, AppError> {
    let usuario = user.require_rol(Rol::Transportista)?;
    let transportista =
        carriers::set_disponible(&app_state.sqlite_provider, &usuario.uid, payload.disponible)
            .await?;
    Ok(wrap_response(transportista, debug_params, None))
}

/// Returns one carrier profile.
///
/// Unverified profiles are only visible to administrators and to the carrier
/// who owns them; everyone else gets `404`.
pub async fn get_carrier_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    debug_params: Query<DebugParams>,
) -> Result<Json<ApiResponse<Transportista>>, AppError> {
    let transportista = carriers::require(&app_state.sqlite_provider, &id).await?;
    let is_owner = transportista.usuario_id.as_deref() == Some(user.0.uid.as_str());
    if !transportista.verificado && !is_owner && user.0.rol != Rol::Administrador {
        return Err(MarketError::not_found(MSG_CARRIER_NOT_FOUND).into());
    }
    Ok(wrap_response(transportista, debug_params, None))
}
