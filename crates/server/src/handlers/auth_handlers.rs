//! # Authentication Route Handlers
//!
//! Email and password sign-up and sign-in, the current session, and the
//! account's own profile.

use crate::{
    auth::{middleware::AuthenticatedUser, token::issue_token},
    errors::AppError,
    handlers::{wrap_response, ApiResponse, DebugParams},
    state::AppState,
    types::{AuthResponse, LoginRequest, MeResponse, MessageResponse, PasswordChangeRequest, RegisterRequest},
};
use axum::{
    extract::{Query, State},
    Json,
};
use fletia::{
    access::{self, AccessError, NuevoUsuario, PerfilUpdate},
    carriers, Rol, Usuario,
};
use serde_json::json;
use tracing::info;

fn session_for(app_state: &AppState, usuario: Usuario) -> Result<AuthResponse, AppError> {
    let token = issue_token(
        &app_state.config.jwt_secret,
        &usuario,
        app_state.config.token_ttl_hours,
    )
    .map_err(|e| AppError::Internal(e.into()))?;
    Ok(AuthResponse {
        token,
        dashboard: usuario.rol.dashboard_path().to_string(),
        usuario,
    })
}

/// Handler for creating a client or carrier account.
///
/// Carriers also get an unverified carrier profile, which an administrator
/// must approve before it shows up in searches.
pub async fn register_handler(
    State(app_state): State<AppState>,
    debug_params: Query<DebugParams>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, AppError> {
    let rol: Rol = payload.rol.trim().parse()?;
    if rol == Rol::Administrador {
        return Err(AppError::Forbidden(
            "No es posible registrarse como administrador.".to_string(),
        ));
    }

    let db = &app_state.sqlite_provider;
    let usuario = access::create_usuario(
        &db.db,
        NuevoUsuario {
            email: payload.email,
            password: payload.password,
            nombre: payload.nombre,
            telefono: payload.telefono,
            rol,
        },
    )
    .await?;

    let carrier_id = if rol == Rol::Transportista {
        Some(carriers::create_for_usuario(db, &usuario, &payload.zona).await?.id)
    } else {
        None
    };
    info!(uid = %usuario.uid, rol = %rol, "Registered new account");

    let debug_info = json!({ "carrier_id": carrier_id });
    let session = session_for(&app_state, usuario)?;
    Ok(wrap_response(session, debug_params, Some(debug_info)))
}

/// Handler for signing in with email and password.
pub async fn login_handler(
    State(app_state): State<AppState>,
    debug_params: Query<DebugParams>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, AppError> {
    let usuario =
        access::authenticate(&app_state.sqlite_provider.db, &payload.email, &payload.password)
            .await?;
    info!(uid = %usuario.uid, "Signed in");
    let session = session_for(&app_state, usuario)?;
    Ok(wrap_response(session, debug_params, None))
}

/// Returns the currently authenticated account and its landing dashboard.
pub async fn get_me_handler(
    user: AuthenticatedUser,
    debug_params: Query<DebugParams>,
) -> Result<Json<ApiResponse<MeResponse>>, AppError> {
    let usuario = user.0;
    let response = MeResponse {
        dashboard: usuario.rol.dashboard_path().to_string(),
        usuario,
    };
    Ok(wrap_response(response, debug_params, None))
}

/// Changes the password after checking the current one.
pub async fn change_password_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    debug_params: Query<DebugParams>,
    Json(payload): Json<PasswordChangeRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, AppError> {
    let db = &app_state.sqlite_provider.db;
    match access::authenticate(db, &user.0.email, &payload.actual).await {
        Ok(_) => {}
        Err(AccessError::InvalidCredentials) => {
            return Err(AppError::BadRequest(
                "La contraseña actual es incorrecta.".to_string(),
            ));
        }
        Err(e) => return Err(e.into()),
    }
    access::set_password(db, &user.0.uid, &payload.nueva).await?;
    info!(uid = %user.0.uid, "Password changed");

    let response = MessageResponse {
        message: "Contraseña actualizada correctamente.".to_string(),
    };
    Ok(wrap_response(response, debug_params, None))
}

/// Updates the account's own name, phone or profile photo.
pub async fn update_me_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    debug_params: Query<DebugParams>,
    Json(payload): Json<PerfilUpdate>,
) -> Result<Json<ApiResponse<Usuario>>, AppError> {
    let usuario =
        access::update_profile(&app_state.sqlite_provider.db, &user.0.uid, payload).await?;
    Ok(wrap_response(usuario, debug_params, None))
}
