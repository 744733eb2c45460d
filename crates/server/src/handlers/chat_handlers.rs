//! # Chat Route Handlers
//!
//! Conversations are created together with their shipment request; these
//! handlers list them, exchange messages and stream new messages live.

use crate::{
    auth::middleware::AuthenticatedUser,
    errors::AppError,
    handlers::{wrap_response, ApiResponse, DebugParams},
    state::AppState,
    types::{LeidoResponse, MensajeRequest},
};
use axum::{
    extract::{Path, Query, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use fletia::chat::{self, Conversacion, Mensaje};
use futures::{Stream, StreamExt};
use serde_json::json;
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, warn};

pub async fn list_conversations_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    debug_params: Query<DebugParams>,
) -> Result<Json<ApiResponse<Vec<Conversacion>>>, AppError> {
    let conversaciones = chat::list_for(&app_state.sqlite_provider, &user.0.uid).await?;
    Ok(wrap_response(conversaciones, debug_params, None))
}

pub async fn conversation_for_request_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(solicitud_id): Path<String>,
    debug_params: Query<DebugParams>,
) -> Result<Json<ApiResponse<Conversacion>>, AppError> {
    let conversacion =
        chat::get_by_solicitud(&app_state.sqlite_provider, &user.0.uid, &solicitud_id).await?;
    Ok(wrap_response(conversacion, debug_params, None))
}

/// Returns the message history of a conversation, oldest first.
pub async fn list_messages_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    debug_params: Query<DebugParams>,
) -> Result<Json<ApiResponse<Vec<Mensaje>>>, AppError> {
    let mensajes = chat::list_mensajes(&app_state.sqlite_provider, &user.0.uid, &id).await?;
    let debug_info = json!({ "count": mensajes.len() });
    Ok(wrap_response(mensajes, debug_params, Some(debug_info)))
}

pub async fn send_message_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    debug_params: Query<DebugParams>,
    Json(payload): Json<MensajeRequest>,
) -> Result<Json<ApiResponse<Mensaje>>, AppError> {
    let mensaje = chat::send(
        &app_state.sqlite_provider,
        &app_state.chat_hub,
        &user.0,
        &id,
        &payload.contenido,
    )
    .await?;
    Ok(wrap_response(mensaje, debug_params, None))
}

/// Marks the other participant's messages as read.
pub async fn mark_read_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    debug_params: Query<DebugParams>,
) -> Result<Json<ApiResponse<LeidoResponse>>, AppError> {
    let marcados = chat::mark_read(&app_state.sqlite_provider, &user.0.uid, &id).await?;
    Ok(wrap_response(LeidoResponse { marcados }, debug_params, None))
}

/// Streams new messages of one conversation as server-sent events named
/// `mensaje`.
pub async fn stream_messages_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    chat::get(&app_state.sqlite_provider, &user.0.uid, &id).await?;
    debug!(conversacion = %id, uid = %user.0.uid, "Opening chat stream");

    let stream = BroadcastStream::new(app_state.chat_hub.subscribe()).filter_map(move |item| {
        let wanted = id.clone();
        async move {
            match item {
                Ok(mensaje) if mensaje.conversacion_id == wanted => Event::default()
                    .event("mensaje")
                    .json_data(&mensaje)
                    .map_err(|e| warn!("Failed to encode chat event: {}", e))
                    .ok()
                    .map(Ok::<Event, Infallible>),
                Ok(_) => None,
                Err(e) => {
                    warn!(conversacion = %wanted, "Chat stream fell behind: {}", e);
                    None
                }
            }
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
