//! # Shipment Request Route Handlers

use crate::{
    auth::middleware::AuthenticatedUser,
    errors::AppError,
    handlers::{wrap_response, ApiResponse, DebugParams},
    state::AppState,
    types::{CalificarRequest, EstadoQuery},
};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use fletia::{
    requests::{self, Accion, FiltroSolicitudes, NuevaSolicitud, Solicitud},
    Rol,
};
use serde_json::json;
use tracing::info;

/// Handler for a client posting a new request to a carrier.
pub async fn create_request_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    debug_params: Query<DebugParams>,
    Json(payload): Json<NuevaSolicitud>,
) -> Result<Json<ApiResponse<Solicitud>>, AppError> {
    let solicitud = requests::create(&app_state.sqlite_provider, &user.0, payload).await?;
    info!(id = %solicitud.id, cliente = %user.0.uid, "Created shipment request");
    let debug_info = json!({ "distancia_km": solicitud.distancia_km });
    Ok(wrap_response(solicitud, debug_params, Some(debug_info)))
}

/// Lists the caller's requests.
///
/// Clients see the requests they posted, carriers the ones addressed to
/// them, and administrators every request. `estado` accepts a state name,
/// `activas` or `todas`.
pub async fn list_requests_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<EstadoQuery>,
    debug_params: Query<DebugParams>,
) -> Result<Json<ApiResponse<Vec<Solicitud>>>, AppError> {
    let db = &app_state.sqlite_provider;
    let filtro: FiltroSolicitudes = query.estado.as_deref().unwrap_or("").trim().parse()?;

    let solicitudes = match user.0.rol {
        Rol::Cliente => requests::list_for_cliente(db, &user.0.uid, filtro).await?,
        Rol::Transportista => {
            let estado = match filtro {
                FiltroSolicitudes::Estado(e) => Some(e),
                _ => None,
            };
            requests::list_for_transportista(db, &user.0.uid, estado)
                .await?
                .into_iter()
                .filter(|s| filtro.accepts(s.estado))
                .collect()
        }
        Rol::Administrador => requests::list_all(db)
            .await?
            .into_iter()
            .filter(|s| filtro.accepts(s.estado))
            .collect(),
    };

    let debug_info = json!({ "filtro": format!("{filtro:?}"), "count": solicitudes.len() });
    Ok(wrap_response(solicitudes, debug_params, Some(debug_info)))
}

pub async fn get_request_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    debug_params: Query<DebugParams>,
) -> Result<Json<ApiResponse<Solicitud>>, AppError> {
    let solicitud = requests::get(&app_state.sqlite_provider, &user.0, &id).await?;
    Ok(wrap_response(solicitud, debug_params, None))
}

/// Moves a request along its lifecycle: `aceptar`, `iniciar`, `finalizar`
/// or `cancelar`.
pub async fn transition_request_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path((id, accion)): Path<(String, String)>,
    debug_params: Query<DebugParams>,
) -> Result<Json<ApiResponse<Solicitud>>, AppError> {
    let accion: Accion = accion.parse()?;
    let solicitud =
        requests::transition(&app_state.sqlite_provider, &user.0, &id, accion).await?;
    let debug_info = json!({ "accion": accion.as_str() });
    Ok(wrap_response(solicitud, debug_params, Some(debug_info)))
}

pub async fn rate_request_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    debug_params: Query<DebugParams>,
    Json(payload): Json<CalificarRequest>,
) -> Result<Json<ApiResponse<Solicitud>>, AppError> {
    let solicitud =
        requests::rate(&app_state.sqlite_provider, &user.0, &id, payload.estrellas).await?;
    Ok(wrap_response(solicitud, debug_params, None))
}

