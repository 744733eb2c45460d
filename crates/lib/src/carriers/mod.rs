//! # Carriers
//!
//! Carrier (`transportista`) profiles: public applications, self-registered
//! carriers, profile edits, availability, search and the rating counters
//! that requests feed back into.

pub mod search;
pub mod types;

pub use types::{
    ActualizacionPerfil, Documentos, EstadoVerificacion, FiltroBusqueda, RegistroTransportista,
    Transportista, Vehiculo,
};

use crate::{
    constants::MSG_CARRIER_NOT_FOUND, errors::MarketError, geo::round2,
    providers::db::sqlite::SqliteProvider,
};
use chrono::{Datelike, Utc};
use fletia_access::{normalize_email, values, Usuario};
use std::collections::BTreeSet;
use tracing::{debug, info};
use turso::{Connection, Value};
use types::TRANSPORTISTA_COLUMNS;
use uuid::Uuid;

const MIN_VEHICLE_YEAR: i32 = 1950;

async fn query_carriers(
    conn: &Connection,
    filter: &str,
    params: Vec<Value>,
) -> Result<Vec<Transportista>, MarketError> {
    let sql = format!("SELECT {TRANSPORTISTA_COLUMNS} FROM transportistas {filter}");
    let mut rows = conn.query(&sql, params).await?;
    let mut carriers = Vec::new();
    while let Some(row) = rows.next().await? {
        carriers.push(Transportista::try_from(&row)?);
    }
    Ok(carriers)
}

async fn query_one(
    conn: &Connection,
    filter: &str,
    params: Vec<Value>,
) -> Result<Option<Transportista>, MarketError> {
    Ok(query_carriers(conn, filter, params).await?.into_iter().next())
}

/// Records a public carrier application. No account exists yet; one is
/// created when an administrator approves the application.
pub async fn submit_application(
    db: &SqliteProvider,
    registro: RegistroTransportista,
) -> Result<Transportista, MarketError> {
    let nombre = registro.nombre.trim().to_string();
    if nombre.is_empty() {
        return Err(MarketError::invalid("El nombre es obligatorio."));
    }
    let email = normalize_email(&registro.email)?;

    let conn = db.connect()?;
    let open = query_carriers(
        &conn,
        "WHERE email = ? AND estado_verificacion != 'rechazado'",
        vec![values::text(email.clone())],
    )
    .await?;
    if !open.is_empty() {
        return Err(MarketError::AlreadyExists(
            "Ya existe una solicitud de registro para este correo.".to_string(),
        ));
    }

    let id = Uuid::new_v4().to_string();
    insert_carrier(
        &conn,
        &id,
        None,
        &nombre,
        &email,
        registro.telefono.trim(),
        registro.zona.trim(),
        registro.descripcion.trim(),
        &registro.vehiculo,
        &registro.documentos,
    )
    .await?;
    info!(id = %id, email = %email, "Received carrier application");
    require(db, &id).await
}

/// Creates the unverified carrier record of a self-registered account. The
/// record id equals the account uid.
///
/// If an open application with the same email is waiting without an account,
/// it is linked to the new account instead.
pub async fn create_for_usuario(
    db: &SqliteProvider,
    usuario: &Usuario,
    zona: &str,
) -> Result<Transportista, MarketError> {
    let conn = db.connect()?;
    if let Some(existing) = get_by_usuario(db, &usuario.uid).await? {
        return Ok(existing);
    }

    let orphan = query_one(
        &conn,
        "WHERE email = ? AND usuario_id IS NULL AND estado_verificacion != 'rechazado'",
        vec![values::text(usuario.email.clone())],
    )
    .await?;
    if let Some(orphan) = orphan {
        conn.execute(
            "UPDATE transportistas SET usuario_id = ? WHERE id = ?",
            vec![values::text(usuario.uid.clone()), values::text(orphan.id.clone())],
        )
        .await?;
        info!(id = %orphan.id, uid = %usuario.uid, "Linked pending application to new account");
        return require(db, &orphan.id).await;
    }

    insert_carrier(
        &conn,
        &usuario.uid,
        Some(&usuario.uid),
        &usuario.nombre,
        &usuario.email,
        &usuario.telefono,
        zona.trim(),
        "",
        &Vehiculo::default(),
        &Documentos::default(),
    )
    .await?;
    info!(uid = %usuario.uid, "Created carrier profile for account");
    require(db, &usuario.uid).await
}

#[allow(clippy::too_many_arguments)]
async fn insert_carrier(
    conn: &Connection,
    id: &str,
    usuario_id: Option<&str>,
    nombre: &str,
    email: &str,
    telefono: &str,
    zona: &str,
    descripcion: &str,
    vehiculo: &Vehiculo,
    documentos: &Documentos,
) -> Result<(), MarketError> {
    let fotos = serde_json::to_string(&vehiculo.fotos)?;
    conn.execute(
        "INSERT INTO transportistas (id, usuario_id, nombre, email, telefono, zona, descripcion,
            disponible, verificado, estado_verificacion, vehiculo_tipo, vehiculo_marca,
            vehiculo_modelo, vehiculo_anio, vehiculo_placa, vehiculo_capacidad_kg, vehiculo_fotos,
            doc_licencia, doc_tarjeta_circulacion, calificacion_promedio, total_calificaciones,
            servicios_completados, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, 0, 0, 'pendiente', ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, 0, 0, ?)",
        vec![
            values::text(id),
            values::opt_text(usuario_id),
            values::text(nombre),
            values::text(email),
            values::text(telefono),
            values::text(zona),
            values::text(descripcion),
            values::text(vehiculo.tipo.trim()),
            values::text(vehiculo.marca.trim()),
            values::text(vehiculo.modelo.trim()),
            values::opt_integer(vehiculo.anio.map(i64::from)),
            values::text(vehiculo.placa.trim()),
            values::opt_integer(vehiculo.capacidad_kg),
            values::text(fotos),
            values::text(documentos.licencia.trim()),
            values::text(documentos.tarjeta_circulacion.trim()),
            values::timestamp(&Utc::now()),
        ],
    )
    .await?;
    Ok(())
}

pub async fn get(db: &SqliteProvider, id: &str) -> Result<Option<Transportista>, MarketError> {
    let conn = db.connect()?;
    query_one(&conn, "WHERE id = ?", vec![values::text(id)]).await
}

/// Like [`get`], but a missing carrier is `NotFound`.
pub async fn require(db: &SqliteProvider, id: &str) -> Result<Transportista, MarketError> {
    get(db, id)
        .await?
        .ok_or_else(|| MarketError::not_found(MSG_CARRIER_NOT_FOUND))
}

/// Finds the carrier profile linked to an account.
pub async fn get_by_usuario(
    db: &SqliteProvider,
    uid: &str,
) -> Result<Option<Transportista>, MarketError> {
    let conn = db.connect()?;
    query_one(&conn, "WHERE usuario_id = ?", vec![values::text(uid)]).await
}

pub async fn require_by_usuario(
    db: &SqliteProvider,
    uid: &str,
) -> Result<Transportista, MarketError> {
    get_by_usuario(db, uid)
        .await?
        .ok_or_else(|| MarketError::not_found(MSG_CARRIER_NOT_FOUND))
}

/// Lists carriers, newest first, optionally restricted to one state.
pub async fn list(
    db: &SqliteProvider,
    estado: Option<EstadoVerificacion>,
) -> Result<Vec<Transportista>, MarketError> {
    let conn = db.connect()?;
    match estado {
        Some(estado) => {
            query_carriers(
                &conn,
                "WHERE estado_verificacion = ? ORDER BY created_at DESC",
                vec![values::text(estado.as_str())],
            )
            .await
        }
        None => query_carriers(&conn, "ORDER BY created_at DESC", vec![]).await,
    }
}

/// The approval queue: every carrier that is not verified yet.
pub async fn list_unverified(db: &SqliteProvider) -> Result<Vec<Transportista>, MarketError> {
    let conn = db.connect()?;
    query_carriers(&conn, "WHERE verificado = 0 ORDER BY created_at ASC", vec![]).await
}

fn validate_profile(update: &ActualizacionPerfil) -> Result<(), MarketError> {
    let required = [
        (update.zona.as_str(), "La zona es obligatoria."),
        (update.vehiculo.tipo.as_str(), "El tipo de vehículo es obligatorio."),
        (update.vehiculo.marca.as_str(), "La marca del vehículo es obligatoria."),
        (update.vehiculo.modelo.as_str(), "El modelo del vehículo es obligatorio."),
        (update.vehiculo.placa.as_str(), "La placa del vehículo es obligatoria."),
    ];
    for (value, message) in required {
        if value.trim().is_empty() {
            return Err(MarketError::invalid(message));
        }
    }
    match update.vehiculo.capacidad_kg {
        Some(kg) if kg > 0 => {}
        _ => {
            return Err(MarketError::invalid(
                "La capacidad de carga debe ser mayor que cero.",
            ));
        }
    }
    if let Some(anio) = update.vehiculo.anio {
        let max = Utc::now().year() + 1;
        if !(MIN_VEHICLE_YEAR..=max).contains(&anio) {
            return Err(MarketError::invalid(format!(
                "El año del vehículo debe estar entre {MIN_VEHICLE_YEAR} y {max}."
            )));
        }
    }
    Ok(())
}

/// Saves the carrier's own profile edits.
pub async fn update_profile(
    db: &SqliteProvider,
    uid: &str,
    update: ActualizacionPerfil,
) -> Result<Transportista, MarketError> {
    let current = require_by_usuario(db, uid).await?;
    validate_profile(&update)?;

    let documentos = update.documentos.unwrap_or(current.documentos);
    let vehiculo = &update.vehiculo;
    let fotos = serde_json::to_string(&vehiculo.fotos)?;
    let conn = db.connect()?;
    conn.execute(
        "UPDATE transportistas SET zona = ?, descripcion = ?, disponible = ?,
            vehiculo_tipo = ?, vehiculo_marca = ?, vehiculo_modelo = ?, vehiculo_anio = ?,
            vehiculo_placa = ?, vehiculo_capacidad_kg = ?, vehiculo_fotos = ?,
            doc_licencia = ?, doc_tarjeta_circulacion = ?
         WHERE id = ?",
        vec![
            values::text(update.zona.trim()),
            values::text(update.descripcion.trim()),
            values::flag(update.disponible),
            values::text(vehiculo.tipo.trim()),
            values::text(vehiculo.marca.trim()),
            values::text(vehiculo.modelo.trim()),
            values::opt_integer(vehiculo.anio.map(i64::from)),
            values::text(vehiculo.placa.trim().to_uppercase()),
            values::opt_integer(vehiculo.capacidad_kg),
            values::text(fotos),
            values::text(documentos.licencia),
            values::text(documentos.tarjeta_circulacion),
            values::text(current.id.clone()),
        ],
    )
    .await?;
    debug!(id = %current.id, "Updated carrier profile");
    require(db, &current.id).await
}

pub async fn set_disponible(
    db: &SqliteProvider,
    uid: &str,
    disponible: bool,
) -> Result<Transportista, MarketError> {
    let current = require_by_usuario(db, uid).await?;
    let conn = db.connect()?;
    conn.execute(
        "UPDATE transportistas SET disponible = ? WHERE id = ?",
        vec![values::flag(disponible), values::text(current.id.clone())],
    )
    .await?;
    require(db, &current.id).await
}

/// Searches verified carriers. See [`search::apply`] for the filter rules.
pub async fn search(
    db: &SqliteProvider,
    filtro: &FiltroBusqueda,
) -> Result<Vec<Transportista>, MarketError> {
    let conn = db.connect()?;
    let verified = query_carriers(&conn, "WHERE verificado = 1", vec![]).await?;
    Ok(search::apply(verified, filtro))
}

/// Sorted, de-duplicated zones served by verified carriers.
pub async fn zonas(db: &SqliteProvider) -> Result<Vec<String>, MarketError> {
    let conn = db.connect()?;
    let mut rows = conn
        .query("SELECT zona FROM transportistas WHERE verificado = 1", ())
        .await?;
    let mut zonas = BTreeSet::new();
    while let Some(row) = rows.next().await? {
        let zona = values::get_text(&row, 0)?;
        if !zona.trim().is_empty() {
            zonas.insert(zona);
        }
    }
    Ok(zonas.into_iter().collect())
}

/// Folds a new rating into the carrier's running average.
pub async fn record_rating(
    conn: &Connection,
    id: &str,
    estrellas: u8,
) -> Result<(), MarketError> {
    let mut rows = conn
        .query(
            "SELECT calificacion_promedio, total_calificaciones FROM transportistas WHERE id = ?",
            vec![values::text(id)],
        )
        .await?;
    let Some(row) = rows.next().await? else {
        return Err(MarketError::not_found(MSG_CARRIER_NOT_FOUND));
    };
    let promedio = values::get_f64(&row, 0)?;
    let total = values::get_i64(&row, 1)?;

    let nuevo_total = total + 1;
    let nuevo_promedio = round2((promedio * total as f64 + f64::from(estrellas)) / nuevo_total as f64);
    conn.execute(
        "UPDATE transportistas SET calificacion_promedio = ?, total_calificaciones = ? WHERE id = ?",
        vec![
            values::real(nuevo_promedio),
            values::integer(nuevo_total),
            values::text(id),
        ],
    )
    .await?;
    debug!(id = %id, promedio = nuevo_promedio, total = nuevo_total, "Recorded rating");
    Ok(())
}

pub async fn record_completed_service(conn: &Connection, id: &str) -> Result<(), MarketError> {
    conn.execute(
        "UPDATE transportistas SET servicios_completados = servicios_completados + 1 WHERE id = ?",
        vec![values::text(id)],
    )
    .await?;
    Ok(())
}
