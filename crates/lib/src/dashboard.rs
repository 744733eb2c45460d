//! Summary counters for the three role dashboards.

use crate::{
    carriers::{self, EstadoVerificacion},
    chat,
    errors::MarketError,
    providers::db::sqlite::SqliteProvider,
    requests::{self, EstadoSolicitud, FiltroSolicitudes, Solicitud},
};
use fletia_access::{self as access, Rol, Usuario};
use serde::Serialize;
use std::collections::BTreeMap;

const RECENT_LIMIT: usize = 5;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumenCliente {
    pub solicitudes_activas: usize,
    pub solicitudes_finalizadas: usize,
    pub conversaciones: usize,
    pub mensajes_sin_leer: i64,
    pub recientes: Vec<Solicitud>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumenTransportista {
    pub por_estado: BTreeMap<String, usize>,
    pub servicios_completados: i64,
    pub calificacion_promedio: f64,
    pub total_calificaciones: i64,
    pub disponible: bool,
    pub verificado: bool,
    pub mensajes_sin_leer: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumenAdmin {
    pub usuarios_total: usize,
    pub usuarios_por_rol: BTreeMap<String, usize>,
    pub usuarios_inactivos: usize,
    pub transportistas_pendientes: usize,
    pub transportistas_aprobados: usize,
    pub transportistas_rechazados: usize,
    pub solicitudes_total: usize,
    pub solicitudes_activas: usize,
}

/// A role-specific summary, tagged by the dashboard it feeds.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "rol", rename_all = "lowercase")]
pub enum Resumen {
    Cliente(ResumenCliente),
    Transportista(ResumenTransportista),
    Administrador(ResumenAdmin),
}

pub async fn resumen_cliente(
    db: &SqliteProvider,
    uid: &str,
) -> Result<ResumenCliente, MarketError> {
    let solicitudes = requests::list_for_cliente(db, uid, FiltroSolicitudes::Todas).await?;
    let activas = solicitudes.iter().filter(|s| s.estado.is_active()).count();
    let finalizadas = solicitudes
        .iter()
        .filter(|s| s.estado == EstadoSolicitud::Finalizado)
        .count();
    Ok(ResumenCliente {
        solicitudes_activas: activas,
        solicitudes_finalizadas: finalizadas,
        conversaciones: chat::list_for(db, uid).await?.len(),
        mensajes_sin_leer: chat::count_unread(db, uid).await?,
        recientes: solicitudes.into_iter().take(RECENT_LIMIT).collect(),
    })
}

pub async fn resumen_transportista(
    db: &SqliteProvider,
    uid: &str,
) -> Result<ResumenTransportista, MarketError> {
    let carrier = carriers::require_by_usuario(db, uid).await?;
    let solicitudes = requests::list_for_transportista(db, uid, None).await?;

    let mut por_estado: BTreeMap<String, usize> = EstadoSolicitud::ALL
        .iter()
        .map(|e| (e.as_str().to_string(), 0))
        .collect();
    for s in &solicitudes {
        *por_estado.entry(s.estado.as_str().to_string()).or_default() += 1;
    }

    Ok(ResumenTransportista {
        por_estado,
        servicios_completados: carrier.servicios_completados,
        calificacion_promedio: carrier.calificacion_promedio,
        total_calificaciones: carrier.total_calificaciones,
        disponible: carrier.disponible,
        verificado: carrier.verificado,
        mensajes_sin_leer: chat::count_unread(db, uid).await?,
    })
}

pub async fn resumen_admin(db: &SqliteProvider) -> Result<ResumenAdmin, MarketError> {
    let mut resumen = ResumenAdmin::default();

    let usuarios = access::list_usuarios(&db.db).await?;
    resumen.usuarios_total = usuarios.len();
    for rol in [Rol::Cliente, Rol::Transportista, Rol::Administrador] {
        resumen.usuarios_por_rol.insert(rol.as_str().to_string(), 0);
    }
    for u in &usuarios {
        *resumen
            .usuarios_por_rol
            .entry(u.rol.as_str().to_string())
            .or_default() += 1;
        if !u.activo {
            resumen.usuarios_inactivos += 1;
        }
    }

    for carrier in carriers::list(db, None).await? {
        match carrier.estado_verificacion {
            EstadoVerificacion::Pendiente => resumen.transportistas_pendientes += 1,
            EstadoVerificacion::Aprobado => resumen.transportistas_aprobados += 1,
            EstadoVerificacion::Rechazado => resumen.transportistas_rechazados += 1,
        }
    }

    let solicitudes = requests::list_all(db).await?;
    resumen.solicitudes_total = solicitudes.len();
    resumen.solicitudes_activas = solicitudes.iter().filter(|s| s.estado.is_active()).count();
    Ok(resumen)
}

/// Picks the summary matching the account's role.
pub async fn resumen_for(db: &SqliteProvider, usuario: &Usuario) -> Result<Resumen, MarketError> {
    Ok(match usuario.rol {
        Rol::Cliente => Resumen::Cliente(resumen_cliente(db, &usuario.uid).await?),
        Rol::Transportista => {
            Resumen::Transportista(resumen_transportista(db, &usuario.uid).await?)
        }
        Rol::Administrador => Resumen::Administrador(resumen_admin(db).await?),
    })
}
