//! # Shared Constants
//!
//! Defaults and user-facing messages shared across the Fletia crates. Keeping
//! them here avoids "magic strings" drifting between the server and the CLI.

/// The default path for the main application database.
pub const DEFAULT_DB_FILE: &str = "db/fletia.db";

/// Display name used as the sender of platform emails.
pub const PLATFORM_NAME: &str = "Fletia HND";

pub const MSG_ID_REQUIRED: &str = "El ID del transportista es requerido.";
pub const MSG_CARRIER_NOT_FOUND: &str = "El transportista no existe en la base de datos.";
pub const MSG_CARRIER_ALREADY_APPROVED: &str = "El transportista ya fue aprobado.";
pub const MSG_APPROVED: &str = "Transportista aprobado y perfiles sincronizados correctamente.";
pub const MSG_REJECTED: &str = "Solicitud rechazada correctamente.";
pub const MSG_EMAIL_BELONGS_TO_ADMIN: &str =
    "El correo pertenece a una cuenta de administrador y no puede usarse para un transportista.";
pub const MSG_UNAUTHENTICATED: &str = "Debes estar autenticado para realizar esta acción.";

/// Stored when a carrier is rejected without a reason.
pub const DEFAULT_REJECTION_REASON: &str = "No especificado";

/// Vehicle type recorded on a request when the carrier never filled it in.
pub const UNSPECIFIED_VEHICLE: &str = "No especificado";

/// How many characters of the cargo description seed a new conversation.
pub const CONVERSATION_PREVIEW_CHARS: usize = 50;

/// Longest chat message accepted, in characters.
pub const MAX_MESSAGE_CHARS: usize = 2000;
