//! # Shipment Requests
//!
//! A client asks one verified carrier for a shipment. The carrier accepts,
//! starts and finishes it; either side may cancel before work starts. Once
//! finished, the client may rate the carrier exactly once.

pub mod types;

pub use types::{Accion, EstadoSolicitud, FiltroSolicitudes, NuevaSolicitud, Solicitud, Ubicacion};

use crate::{
    carriers,
    chat,
    constants::UNSPECIFIED_VEHICLE,
    errors::MarketError,
    geo::{haversine_km, round2},
    providers::db::sqlite::SqliteProvider,
};
use chrono::Utc;
use fletia_access::{values, Rol, Usuario};
use tracing::info;
use turso::{Connection, Value};
use types::SOLICITUD_COLUMNS;
use uuid::Uuid;

const MSG_REQUEST_NOT_FOUND: &str = "La solicitud no existe.";

async fn query_solicitudes(
    conn: &Connection,
    filter: &str,
    params: Vec<Value>,
) -> Result<Vec<Solicitud>, MarketError> {
    let sql = format!("SELECT {SOLICITUD_COLUMNS} FROM solicitudes {filter}");
    let mut rows = conn.query(&sql, params).await?;
    let mut result = Vec::new();
    while let Some(row) = rows.next().await? {
        result.push(Solicitud::try_from(&row)?);
    }
    Ok(result)
}

async fn load(conn: &Connection, id: &str) -> Result<Solicitud, MarketError> {
    query_solicitudes(conn, "WHERE id = ?", vec![values::text(id)])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| MarketError::not_found(MSG_REQUEST_NOT_FOUND))
}

fn required<'a>(value: &'a str, message: &str) -> Result<&'a str, MarketError> {
    let value = value.trim();
    if value.is_empty() {
        Err(MarketError::invalid(message))
    } else {
        Ok(value)
    }
}

/// Distance between both ends, or zero when either lacks coordinates.
pub fn distancia(origen: &Ubicacion, destino: &Ubicacion) -> f64 {
    match (origen.coordenadas(), destino.coordenadas()) {
        (Some(a), Some(b)) => round2(haversine_km(a, b)),
        _ => 0.0,
    }
}

/// Creates a request from `cliente` to the carrier named in `nueva`, along
/// with the conversation both sides will use.
pub async fn create(
    db: &SqliteProvider,
    cliente: &Usuario,
    nueva: NuevaSolicitud,
) -> Result<Solicitud, MarketError> {
    if cliente.rol != Rol::Cliente {
        return Err(MarketError::denied(
            "Solo los clientes pueden crear solicitudes de flete.",
        ));
    }
    let carrier_id = required(&nueva.transportista_id, "Debes elegir un transportista.")?;
    let origen_dir = required(&nueva.origen.direccion, "La dirección de origen es obligatoria.")?;
    let destino_dir = required(&nueva.destino.direccion, "La dirección de destino es obligatoria.")?;
    let carga = required(&nueva.descripcion_carga, "Describe la carga a transportar.")?;
    let fecha = required(&nueva.fecha_solicitada, "La fecha del servicio es obligatoria.")?;

    let carrier = carriers::require(db, carrier_id).await?;
    if !carrier.verificado {
        return Err(MarketError::precondition(
            "El transportista aún no ha sido verificado.",
        ));
    }
    let Some(carrier_uid) = carrier.usuario_id.clone() else {
        return Err(MarketError::precondition(
            "El transportista no tiene una cuenta activa.",
        ));
    };
    let tipo_vehiculo = if carrier.vehiculo.tipo.trim().is_empty() {
        UNSPECIFIED_VEHICLE.to_string()
    } else {
        carrier.vehiculo.tipo.clone()
    };

    let now = Utc::now();
    let solicitud = Solicitud {
        id: Uuid::new_v4().to_string(),
        usuario_id: cliente.uid.clone(),
        nombre_usuario: cliente.nombre.clone(),
        transportista_id: carrier_uid,
        transportista_registro_id: carrier.id.clone(),
        nombre_transportista: carrier.nombre.clone(),
        origen: Ubicacion {
            direccion: origen_dir.to_string(),
            ..nueva.origen.clone()
        },
        destino: Ubicacion {
            direccion: destino_dir.to_string(),
            ..nueva.destino.clone()
        },
        distancia_km: distancia(&nueva.origen, &nueva.destino),
        descripcion_carga: carga.to_string(),
        tipo_vehiculo,
        fecha_solicitada: fecha.to_string(),
        estado: EstadoSolicitud::Pendiente,
        calificacion: None,
        created_at: now,
        updated_at: now,
    };

    let conn = db.connect()?;
    conn.execute(
        &format!(
            "INSERT INTO solicitudes ({SOLICITUD_COLUMNS})
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, NULL, ?, ?)"
        ),
        vec![
            values::text(solicitud.id.clone()),
            values::text(solicitud.usuario_id.clone()),
            values::text(solicitud.nombre_usuario.clone()),
            values::text(solicitud.transportista_id.clone()),
            values::text(solicitud.transportista_registro_id.clone()),
            values::text(solicitud.nombre_transportista.clone()),
            values::text(solicitud.origen.direccion.clone()),
            values::opt_real(solicitud.origen.lat),
            values::opt_real(solicitud.origen.lng),
            values::text(solicitud.destino.direccion.clone()),
            values::opt_real(solicitud.destino.lat),
            values::opt_real(solicitud.destino.lng),
            values::real(solicitud.distancia_km),
            values::text(solicitud.descripcion_carga.clone()),
            values::text(solicitud.tipo_vehiculo.clone()),
            values::text(solicitud.fecha_solicitada.clone()),
            values::text(solicitud.estado.as_str()),
            values::timestamp(&now),
            values::timestamp(&now),
        ],
    )
    .await?;
    chat::create_for_solicitud(&conn, &solicitud).await?;
    info!(
        id = %solicitud.id,
        cliente = %solicitud.usuario_id,
        transportista = %solicitud.transportista_id,
        km = solicitud.distancia_km,
        "Created shipment request"
    );
    load(&conn, &solicitud.id).await
}

/// Loads a request for one of its participants or an administrator.
pub async fn get(db: &SqliteProvider, actor: &Usuario, id: &str) -> Result<Solicitud, MarketError> {
    let conn = db.connect()?;
    let solicitud = load(&conn, id).await?;
    if solicitud.is_participant(&actor.uid) || actor.rol == Rol::Administrador {
        Ok(solicitud)
    } else {
        Err(MarketError::denied("No tienes acceso a esta solicitud."))
    }
}

/// A client's requests, newest first.
pub async fn list_for_cliente(
    db: &SqliteProvider,
    uid: &str,
    filtro: FiltroSolicitudes,
) -> Result<Vec<Solicitud>, MarketError> {
    let conn = db.connect()?;
    let all = query_solicitudes(
        &conn,
        "WHERE usuario_id = ? ORDER BY created_at DESC",
        vec![values::text(uid)],
    )
    .await?;
    Ok(all.into_iter().filter(|s| filtro.accepts(s.estado)).collect())
}

/// Requests addressed to a carrier account, newest first.
pub async fn list_for_transportista(
    db: &SqliteProvider,
    uid: &str,
    estado: Option<EstadoSolicitud>,
) -> Result<Vec<Solicitud>, MarketError> {
    let conn = db.connect()?;
    match estado {
        Some(estado) => {
            query_solicitudes(
                &conn,
                "WHERE transportista_id = ? AND estado = ? ORDER BY created_at DESC",
                vec![values::text(uid), values::text(estado.as_str())],
            )
            .await
        }
        None => {
            query_solicitudes(
                &conn,
                "WHERE transportista_id = ? ORDER BY created_at DESC",
                vec![values::text(uid)],
            )
            .await
        }
    }
}

/// Every request in the system, newest first.
pub async fn list_all(db: &SqliteProvider) -> Result<Vec<Solicitud>, MarketError> {
    let conn = db.connect()?;
    query_solicitudes(&conn, "ORDER BY created_at DESC", vec![]).await
}

fn authorize(actor: &Usuario, solicitud: &Solicitud, accion: Accion) -> Result<(), MarketError> {
    let is_carrier = actor.uid == solicitud.transportista_id;
    let is_client = actor.uid == solicitud.usuario_id;
    let allowed = match accion {
        Accion::Aceptar | Accion::Iniciar | Accion::Finalizar => is_carrier,
        Accion::Cancelar => is_carrier || is_client,
    };
    if allowed {
        Ok(())
    } else {
        Err(MarketError::denied(format!(
            "No puedes {} esta solicitud.",
            accion.as_str()
        )))
    }
}

/// Moves a request along its lifecycle.
///
/// Finishing a request bumps the carrier's completed-service counter.
pub async fn transition(
    db: &SqliteProvider,
    actor: &Usuario,
    id: &str,
    accion: Accion,
) -> Result<Solicitud, MarketError> {
    let conn = db.connect()?;
    let solicitud = load(&conn, id).await?;
    authorize(actor, &solicitud, accion)?;

    let (from, to) = accion.edge();
    if !from.contains(&solicitud.estado) {
        return Err(MarketError::precondition(format!(
            "No se puede {} una solicitud en estado '{}'.",
            accion.as_str(),
            solicitud.estado
        )));
    }

    // Guarded on the state we read so a concurrent change is not overwritten.
    let changed = conn
        .execute(
            "UPDATE solicitudes SET estado = ?, updated_at = ? WHERE id = ? AND estado = ?",
            vec![
                values::text(to.as_str()),
                values::timestamp(&Utc::now()),
                values::text(id),
                values::text(solicitud.estado.as_str()),
            ],
        )
        .await?;
    if changed == 0 {
        return Err(MarketError::precondition(
            "La solicitud cambió de estado mientras se procesaba. Intenta de nuevo.",
        ));
    }

    if to == EstadoSolicitud::Finalizado {
        carriers::record_completed_service(&conn, &solicitud.transportista_registro_id).await?;
    }
    info!(id = %id, from = %solicitud.estado, to = %to, by = %actor.uid, "Request state changed");
    load(&conn, id).await
}

/// Records the client's 1 to 5 star rating of a finished request.
pub async fn rate(
    db: &SqliteProvider,
    cliente: &Usuario,
    id: &str,
    estrellas: u8,
) -> Result<Solicitud, MarketError> {
    if !(1..=5).contains(&estrellas) {
        return Err(MarketError::invalid(
            "La calificación debe estar entre 1 y 5 estrellas.",
        ));
    }
    let conn = db.connect()?;
    let solicitud = load(&conn, id).await?;
    if solicitud.usuario_id != cliente.uid {
        return Err(MarketError::denied(
            "Solo el cliente de la solicitud puede calificarla.",
        ));
    }
    if solicitud.estado != EstadoSolicitud::Finalizado {
        return Err(MarketError::precondition(
            "Solo se pueden calificar servicios finalizados.",
        ));
    }

    let changed = conn
        .execute(
            "UPDATE solicitudes SET calificacion = ?, updated_at = ? WHERE id = ? AND calificacion IS NULL",
            vec![
                values::integer(i64::from(estrellas)),
                values::timestamp(&Utc::now()),
                values::text(id),
            ],
        )
        .await?;
    if changed == 0 {
        return Err(MarketError::precondition("Esta solicitud ya fue calificada."));
    }
    carriers::record_rating(&conn, &solicitud.transportista_registro_id, estrellas).await?;
    load(&conn, id).await
}
