//! # Chat
//!
//! Every request gets one conversation between its client and its carrier.
//! Messages are stored in `mensajes` and pushed to live followers through the
//! [`ChatHub`].

pub mod hub;
pub mod types;

pub use hub::ChatHub;
pub use types::{Conversacion, Mensaje};

use crate::{
    constants::{CONVERSATION_PREVIEW_CHARS, MAX_MESSAGE_CHARS},
    errors::MarketError,
    providers::db::sqlite::SqliteProvider,
    requests::Solicitud,
};
use chrono::Utc;
use fletia_access::{values, Usuario};
use tracing::{debug, info};
use turso::{Connection, Value};
use types::{CONVERSACION_COLUMNS, MENSAJE_COLUMNS};
use uuid::Uuid;

const MSG_CONVERSATION_NOT_FOUND: &str = "La conversación no existe.";
const MSG_NOT_A_PARTICIPANT: &str = "No participas en esta conversación.";

async fn query_conversaciones(
    conn: &Connection,
    filter: &str,
    params: Vec<Value>,
) -> Result<Vec<Conversacion>, MarketError> {
    let sql = format!("SELECT {CONVERSACION_COLUMNS} FROM conversaciones {filter}");
    let mut rows = conn.query(&sql, params).await?;
    let mut result = Vec::new();
    while let Some(row) = rows.next().await? {
        result.push(Conversacion::try_from(&row)?);
    }
    Ok(result)
}

/// The opening line of a request's conversation.
pub fn preview(descripcion_carga: &str) -> String {
    let head: String = descripcion_carga
        .chars()
        .take(CONVERSATION_PREVIEW_CHARS)
        .collect();
    format!("Nueva solicitud de flete: {head}...")
}

/// Opens the conversation of a freshly created request.
pub(crate) async fn create_for_solicitud(
    conn: &Connection,
    solicitud: &Solicitud,
) -> Result<Conversacion, MarketError> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now();
    conn.execute(
        "INSERT INTO conversaciones (id, solicitud_id, cliente_id, transportista_id, nombre_cliente,
            nombre_transportista, ultimo_mensaje, ultimo_mensaje_timestamp, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        vec![
            values::text(id.clone()),
            values::text(solicitud.id.clone()),
            values::text(solicitud.usuario_id.clone()),
            values::text(solicitud.transportista_id.clone()),
            values::text(solicitud.nombre_usuario.clone()),
            values::text(solicitud.nombre_transportista.clone()),
            values::text(preview(&solicitud.descripcion_carga)),
            values::timestamp(&now),
            values::timestamp(&now),
        ],
    )
    .await?;
    debug!(id = %id, solicitud = %solicitud.id, "Opened conversation");
    query_conversaciones(conn, "WHERE id = ?", vec![values::text(id)])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| MarketError::DataIntegrity("conversation vanished after insert".into()))
}

/// Conversations `uid` takes part in, most recent activity first.
pub async fn list_for(db: &SqliteProvider, uid: &str) -> Result<Vec<Conversacion>, MarketError> {
    let conn = db.connect()?;
    query_conversaciones(
        &conn,
        "WHERE cliente_id = ? OR transportista_id = ? ORDER BY ultimo_mensaje_timestamp DESC",
        vec![values::text(uid), values::text(uid)],
    )
    .await
}

fn ensure_participant(conversacion: Conversacion, uid: &str) -> Result<Conversacion, MarketError> {
    if conversacion.is_participant(uid) {
        Ok(conversacion)
    } else {
        Err(MarketError::denied(MSG_NOT_A_PARTICIPANT))
    }
}

pub async fn get(db: &SqliteProvider, uid: &str, id: &str) -> Result<Conversacion, MarketError> {
    let conn = db.connect()?;
    let conversacion = query_conversaciones(&conn, "WHERE id = ?", vec![values::text(id)])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| MarketError::not_found(MSG_CONVERSATION_NOT_FOUND))?;
    ensure_participant(conversacion, uid)
}

pub async fn get_by_solicitud(
    db: &SqliteProvider,
    uid: &str,
    solicitud_id: &str,
) -> Result<Conversacion, MarketError> {
    let conn = db.connect()?;
    let conversacion = query_conversaciones(
        &conn,
        "WHERE solicitud_id = ?",
        vec![values::text(solicitud_id)],
    )
    .await?
    .into_iter()
    .next()
    .ok_or_else(|| MarketError::not_found(MSG_CONVERSATION_NOT_FOUND))?;
    ensure_participant(conversacion, uid)
}

/// The full message history, oldest first.
pub async fn list_mensajes(
    db: &SqliteProvider,
    uid: &str,
    conversacion_id: &str,
) -> Result<Vec<Mensaje>, MarketError> {
    get(db, uid, conversacion_id).await?;
    let conn = db.connect()?;
    let mut rows = conn
        .query(
            &format!(
                "SELECT {MENSAJE_COLUMNS} FROM mensajes WHERE conversacion_id = ? ORDER BY created_at ASC"
            ),
            vec![values::text(conversacion_id)],
        )
        .await?;
    let mut mensajes = Vec::new();
    while let Some(row) = rows.next().await? {
        mensajes.push(Mensaje::try_from(&row)?);
    }
    Ok(mensajes)
}

fn validate_contenido(contenido: &str) -> Result<String, MarketError> {
    let contenido = contenido.trim();
    if contenido.is_empty() {
        return Err(MarketError::invalid("El mensaje no puede estar vacío."));
    }
    if contenido.chars().count() > MAX_MESSAGE_CHARS {
        return Err(MarketError::invalid(format!(
            "El mensaje no puede superar {MAX_MESSAGE_CHARS} caracteres."
        )));
    }
    Ok(contenido.to_string())
}

/// Stores a message from `emisor`, bumps the conversation preview and
/// notifies live followers.
pub async fn send(
    db: &SqliteProvider,
    hub: &ChatHub,
    emisor: &Usuario,
    conversacion_id: &str,
    contenido: &str,
) -> Result<Mensaje, MarketError> {
    let contenido = validate_contenido(contenido)?;
    get(db, &emisor.uid, conversacion_id).await?;

    let mensaje = Mensaje {
        id: Uuid::new_v4().to_string(),
        conversacion_id: conversacion_id.to_string(),
        emisor_id: emisor.uid.clone(),
        nombre_emisor: emisor.nombre.clone(),
        contenido,
        leido: false,
        created_at: Utc::now(),
    };

    let conn = db.connect()?;
    conn.execute(
        &format!("INSERT INTO mensajes ({MENSAJE_COLUMNS}) VALUES (?, ?, ?, ?, ?, 0, ?)"),
        vec![
            values::text(mensaje.id.clone()),
            values::text(mensaje.conversacion_id.clone()),
            values::text(mensaje.emisor_id.clone()),
            values::text(mensaje.nombre_emisor.clone()),
            values::text(mensaje.contenido.clone()),
            values::timestamp(&mensaje.created_at),
        ],
    )
    .await?;
    conn.execute(
        "UPDATE conversaciones SET ultimo_mensaje = ?, ultimo_mensaje_timestamp = ? WHERE id = ?",
        vec![
            values::text(mensaje.contenido.clone()),
            values::timestamp(&mensaje.created_at),
            values::text(conversacion_id),
        ],
    )
    .await?;

    hub.publish(&mensaje);
    Ok(mensaje)
}

/// Marks the other participant's messages as read. Returns how many changed.
pub async fn mark_read(
    db: &SqliteProvider,
    uid: &str,
    conversacion_id: &str,
) -> Result<u64, MarketError> {
    get(db, uid, conversacion_id).await?;
    let conn = db.connect()?;
    let changed = conn
        .execute(
            "UPDATE mensajes SET leido = 1 WHERE conversacion_id = ? AND emisor_id != ? AND leido = 0",
            vec![values::text(conversacion_id), values::text(uid)],
        )
        .await?;
    if changed > 0 {
        info!(conversacion = %conversacion_id, uid = %uid, changed, "Marked messages as read");
    }
    Ok(changed)
}

/// Messages addressed to `uid` that they have not read yet, across all of
/// their conversations.
pub async fn count_unread(db: &SqliteProvider, uid: &str) -> Result<i64, MarketError> {
    let conn = db.connect()?;
    let mut rows = conn
        .query(
            "SELECT COUNT(*) FROM mensajes m
             JOIN conversaciones c ON c.id = m.conversacion_id
             WHERE (c.cliente_id = ? OR c.transportista_id = ?)
               AND m.emisor_id != ? AND m.leido = 0",
            vec![values::text(uid), values::text(uid), values::text(uid)],
        )
        .await?;
    match rows.next().await? {
        Some(row) => Ok(values::get_i64(&row, 0)?),
        None => Ok(0),
    }
}
