use super::{handlers, state::AppState};
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Creates the Axum router with all the application routes.
pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        // Accounts and sessions
        .route("/auth/register", post(handlers::register_handler))
        .route("/auth/login", post(handlers::login_handler))
        .route("/auth/me", get(handlers::get_me_handler))
        .route("/auth/password", put(handlers::change_password_handler))
        .route("/usuarios/me", put(handlers::update_me_handler))
        // Carriers
        .route("/transportistas", get(handlers::search_carriers_handler))
        .route("/transportistas/registro", post(handlers::apply_handler))
        .route("/transportistas/zonas", get(handlers::zonas_handler))
        .route(
            "/transportistas/me",
            get(handlers::get_my_carrier_handler).put(handlers::update_my_carrier_handler),
        )
        .route(
            "/transportistas/me/disponible",
            put(handlers::set_disponible_handler),
        )
        .route("/transportistas/{id}", get(handlers::get_carrier_handler))
        // Shipment requests
        .route(
            "/solicitudes",
            get(handlers::list_requests_handler).post(handlers::create_request_handler),
        )
        .route("/solicitudes/{id}", get(handlers::get_request_handler))
        .route(
            "/solicitudes/{id}/calificar",
            post(handlers::rate_request_handler),
        )
        .route(
            "/solicitudes/{id}/{accion}",
            post(handlers::transition_request_handler),
        )
        // Chat
        .route(
            "/conversaciones",
            get(handlers::list_conversations_handler),
        )
        .route(
            "/conversaciones/solicitud/{id}",
            get(handlers::conversation_for_request_handler),
        )
        .route(
            "/conversaciones/{id}/mensajes",
            get(handlers::list_messages_handler).post(handlers::send_message_handler),
        )
        .route("/conversaciones/{id}/leido", post(handlers::mark_read_handler))
        .route(
            "/conversaciones/{id}/stream",
            get(handlers::stream_messages_handler),
        )
        .route("/dashboard/resumen", get(handlers::dashboard_summary_handler))
        // Administration
        .route("/admin/usuarios", get(handlers::list_users_handler))
        .route(
            "/admin/usuarios/{id}/activo",
            put(handlers::set_user_active_handler),
        )
        .route(
            "/admin/transportistas",
            get(handlers::list_carriers_admin_handler),
        )
        .route(
            "/admin/transportistas/{id}/aprobar",
            post(handlers::approve_carrier_handler),
        )
        .route(
            "/admin/transportistas/{id}/rechazar",
            post(handlers::reject_carrier_handler),
        )
        // Callable functions
        .route(
            "/callable/aprobarTransportista",
            post(handlers::aprobar_transportista_handler),
        )
        .route(
            "/callable/rechazarTransportista",
            post(handlers::rechazar_transportista_handler),
        )
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
