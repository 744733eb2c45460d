//! # Authentication Middleware
//!
//! This module provides the `AuthenticatedUser` extractor. Handlers that take
//! it only run for requests carrying a valid bearer token whose account still
//! exists and is active.

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use fletia::{access, constants::MSG_UNAUTHENTICATED, Rol, Usuario};
use tracing::{debug, warn};

use super::token::decode_token;
use crate::{errors::AppError, state::AppState};

pub const MSG_FORBIDDEN: &str = "No tienes permiso para realizar esta acción.";
pub const MSG_ADMIN_ONLY: &str = "Solo los administradores pueden realizar esta acción.";

/// An Axum extractor that provides the currently authenticated account.
///
/// 1. **No token**: `401 UNAUTHENTICATED`.
/// 2. **Invalid or expired token**: `401 UNAUTHENTICATED`.
/// 3. **Valid token for a deleted account**: `401 UNAUTHENTICATED`.
/// 4. **Valid token for a disabled account**: `403 PERMISSION_DENIED`.
///
/// The account is reloaded on every request, so role changes and
/// deactivation take effect without waiting for the token to expire.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Usuario);

impl AuthenticatedUser {
    /// Returns the account if it has `rol`, otherwise `403`.
    pub fn require_rol(&self, rol: Rol) -> Result<&Usuario, AppError> {
        if self.0.rol == rol {
            Ok(&self.0)
        } else {
            warn!(uid = %self.0.uid, rol = %self.0.rol, required = %rol, "Role check failed");
            Err(AppError::Forbidden(MSG_FORBIDDEN.to_string()))
        }
    }

    pub fn require_admin(&self) -> Result<&Usuario, AppError> {
        self.require_rol(Rol::Administrador)
            .map_err(|_| AppError::Forbidden(MSG_ADMIN_ONLY.to_string()))
    }
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let bearer_header =
            Option::<TypedHeader<Authorization<Bearer>>>::from_request_parts(parts, state)
                .await
                .map_err(|e| {
                    warn!("Malformed Authorization header: {}", e);
                    AppError::Unauthenticated(MSG_UNAUTHENTICATED.to_string())
                })?;

        let Some(TypedHeader(Authorization(bearer))) = bearer_header else {
            debug!("No Authorization header found.");
            return Err(AppError::Unauthenticated(MSG_UNAUTHENTICATED.to_string()));
        };

        let claims = decode_token(&state.config.jwt_secret, bearer.token()).map_err(|e| {
            warn!("JWT validation failed: {}", e);
            AppError::Unauthenticated(MSG_UNAUTHENTICATED.to_string())
        })?;

        let usuario = access::get_usuario(&state.sqlite_provider.db, &claims.sub)
            .await?
            .ok_or_else(|| {
                warn!(uid = %claims.sub, "Token refers to an unknown account");
                AppError::Unauthenticated(MSG_UNAUTHENTICATED.to_string())
            })?;

        if !usuario.activo {
            return Err(access::AccessError::Disabled.into());
        }

        Ok(AuthenticatedUser(usuario))
    }
}
