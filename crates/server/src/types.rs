use fletia::access::Usuario;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Deserialize, Default)]
pub struct DebugParams {
    pub debug: Option<bool>,
}

#[derive(Serialize, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<Value>,
    pub result: T,
}

// --- Auth ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub nombre: String,
    #[serde(default)]
    pub telefono: String,
    pub rol: String,
    /// Only used for carriers.
    #[serde(default)]
    pub zona: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub usuario: Usuario,
    /// Where the client should send this account after signing in.
    pub dashboard: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MeResponse {
    pub usuario: Usuario,
    pub dashboard: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswordChangeRequest {
    pub actual: String,
    pub nueva: String,
}

// --- Carriers, requests and chat ---

#[derive(Debug, Deserialize)]
pub struct DisponibleRequest {
    pub disponible: bool,
}

#[derive(Debug, Deserialize)]
pub struct EstadoQuery {
    #[serde(default)]
    pub estado: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CalificarRequest {
    pub estrellas: u8,
}

#[derive(Debug, Deserialize)]
pub struct MensajeRequest {
    pub contenido: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeidoResponse {
    pub marcados: u64,
}

// --- Admin ---

#[derive(Debug, Deserialize)]
pub struct ActivoRequest {
    pub activo: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct RechazoRequest {
    #[serde(default)]
    pub motivo: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

// --- Callable functions ---

/// The `{"data": ...}` envelope of a callable-function request.
#[derive(Debug, Deserialize)]
pub struct CallableRequest<T> {
    #[serde(default)]
    pub data: T,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AprobarData {
    #[serde(default)]
    pub transportista_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RechazarData {
    #[serde(default)]
    pub transportista_id: Option<String>,
    #[serde(default)]
    pub motivo: Option<String>,
}

/// The `result` of a callable function. Workflow failures are reported with
/// `success: false` rather than as an HTTP error.
#[derive(Debug, Serialize, Deserialize)]
pub struct CallableResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CallableResult {
    pub fn ok(message: impl Into<String>, uid: Option<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            uid,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            uid: None,
            error: Some(error.into()),
        }
    }
}
