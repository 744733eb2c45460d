//! # SQLite Schema
//!
//! This module centralizes the DDL for the marketplace tables. The tables
//! mirror the document collections of the hosted store the application was
//! designed around: `usuarios`, `transportistas`, `solicitudes`,
//! `conversaciones` and their `mensajes`.

pub const CREATE_TRANSPORTISTAS_TABLE_SQL: &str = "
    CREATE TABLE IF NOT EXISTS transportistas (
        id TEXT PRIMARY KEY,
        usuario_id TEXT,
        nombre TEXT NOT NULL,
        email TEXT NOT NULL,
        telefono TEXT NOT NULL DEFAULT '',
        zona TEXT NOT NULL DEFAULT '',
        descripcion TEXT NOT NULL DEFAULT '',
        disponible INTEGER NOT NULL DEFAULT 0,
        verificado INTEGER NOT NULL DEFAULT 0,
        estado_verificacion TEXT NOT NULL DEFAULT 'pendiente',
        motivo_rechazo TEXT,
        fecha_aprobacion TEXT,
        fecha_rechazo TEXT,
        vehiculo_tipo TEXT NOT NULL DEFAULT '',
        vehiculo_marca TEXT NOT NULL DEFAULT '',
        vehiculo_modelo TEXT NOT NULL DEFAULT '',
        vehiculo_anio INTEGER,
        vehiculo_placa TEXT NOT NULL DEFAULT '',
        vehiculo_capacidad_kg INTEGER,
        vehiculo_fotos TEXT NOT NULL DEFAULT '[]',
        doc_licencia TEXT NOT NULL DEFAULT '',
        doc_tarjeta_circulacion TEXT NOT NULL DEFAULT '',
        calificacion_promedio REAL NOT NULL DEFAULT 0,
        total_calificaciones INTEGER NOT NULL DEFAULT 0,
        servicios_completados INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL
    )";

pub const CREATE_SOLICITUDES_TABLE_SQL: &str = "
    CREATE TABLE IF NOT EXISTS solicitudes (
        id TEXT PRIMARY KEY,
        usuario_id TEXT NOT NULL,
        nombre_usuario TEXT NOT NULL,
        transportista_id TEXT NOT NULL,
        transportista_registro_id TEXT NOT NULL,
        nombre_transportista TEXT NOT NULL,
        origen_direccion TEXT NOT NULL,
        origen_lat REAL,
        origen_lng REAL,
        destino_direccion TEXT NOT NULL,
        destino_lat REAL,
        destino_lng REAL,
        distancia_km REAL NOT NULL DEFAULT 0,
        descripcion_carga TEXT NOT NULL,
        tipo_vehiculo TEXT NOT NULL,
        fecha_solicitada TEXT NOT NULL,
        estado TEXT NOT NULL DEFAULT 'pendiente',
        calificacion INTEGER,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )";

pub const CREATE_CONVERSACIONES_TABLE_SQL: &str = "
    CREATE TABLE IF NOT EXISTS conversaciones (
        id TEXT PRIMARY KEY,
        solicitud_id TEXT NOT NULL,
        cliente_id TEXT NOT NULL,
        transportista_id TEXT NOT NULL,
        nombre_cliente TEXT NOT NULL,
        nombre_transportista TEXT NOT NULL,
        ultimo_mensaje TEXT NOT NULL DEFAULT '',
        ultimo_mensaje_timestamp TEXT NOT NULL,
        created_at TEXT NOT NULL
    )";

pub const CREATE_MENSAJES_TABLE_SQL: &str = "
    CREATE TABLE IF NOT EXISTS mensajes (
        id TEXT PRIMARY KEY,
        conversacion_id TEXT NOT NULL,
        emisor_id TEXT NOT NULL,
        nombre_emisor TEXT NOT NULL,
        contenido TEXT NOT NULL,
        leido INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL
    )";

/// Every table the application needs, in creation order.
pub const ALL_TABLE_CREATION_SQL: &[&str] = &[
    fletia_access::CREATE_USUARIOS_TABLE_SQL,
    CREATE_TRANSPORTISTAS_TABLE_SQL,
    CREATE_SOLICITUDES_TABLE_SQL,
    CREATE_CONVERSACIONES_TABLE_SQL,
    CREATE_MENSAJES_TABLE_SQL,
];
