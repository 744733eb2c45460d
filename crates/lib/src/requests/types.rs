use crate::errors::MarketError;
use chrono::{DateTime, Utc};
use fletia_access::values;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use turso::Row;

pub(crate) const SOLICITUD_COLUMNS: &str = "id, usuario_id, nombre_usuario, transportista_id, \
    transportista_registro_id, nombre_transportista, origen_direccion, origen_lat, origen_lng, \
    destino_direccion, destino_lat, destino_lng, distancia_km, descripcion_carga, tipo_vehiculo, \
    fecha_solicitada, estado, calificacion, created_at, updated_at";

/// A pickup or drop-off point. Coordinates are absent when the client typed
/// an address without picking it on the map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ubicacion {
    pub direccion: String,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
}

impl Ubicacion {
    pub fn coordenadas(&self) -> Option<(f64, f64)> {
        Some((self.lat?, self.lng?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstadoSolicitud {
    Pendiente,
    Asignada,
    EnProceso,
    Finalizado,
    Cancelado,
}

impl EstadoSolicitud {
    pub const ALL: [EstadoSolicitud; 5] = [
        EstadoSolicitud::Pendiente,
        EstadoSolicitud::Asignada,
        EstadoSolicitud::EnProceso,
        EstadoSolicitud::Finalizado,
        EstadoSolicitud::Cancelado,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EstadoSolicitud::Pendiente => "pendiente",
            EstadoSolicitud::Asignada => "asignada",
            EstadoSolicitud::EnProceso => "en_proceso",
            EstadoSolicitud::Finalizado => "finalizado",
            EstadoSolicitud::Cancelado => "cancelado",
        }
    }

    /// Requests still moving through the workflow.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            EstadoSolicitud::Pendiente | EstadoSolicitud::Asignada | EstadoSolicitud::EnProceso
        )
    }
}

impl fmt::Display for EstadoSolicitud {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EstadoSolicitud {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EstadoSolicitud::ALL
            .into_iter()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| MarketError::invalid(format!("Estado de solicitud desconocido: '{s}'")))
    }
}

/// What a participant does to move a request along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accion {
    Aceptar,
    Iniciar,
    Finalizar,
    Cancelar,
}

impl Accion {
    /// The states the action may start from, and the state it leads to.
    pub fn edge(&self) -> (&'static [EstadoSolicitud], EstadoSolicitud) {
        use EstadoSolicitud::*;
        match self {
            Accion::Aceptar => (&[Pendiente], Asignada),
            Accion::Iniciar => (&[Asignada], EnProceso),
            Accion::Finalizar => (&[EnProceso], Finalizado),
            Accion::Cancelar => (&[Pendiente, Asignada], Cancelado),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Accion::Aceptar => "aceptar",
            Accion::Iniciar => "iniciar",
            Accion::Finalizar => "finalizar",
            Accion::Cancelar => "cancelar",
        }
    }
}

impl FromStr for Accion {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "aceptar" => Ok(Accion::Aceptar),
            "iniciar" => Ok(Accion::Iniciar),
            "finalizar" => Ok(Accion::Finalizar),
            "cancelar" => Ok(Accion::Cancelar),
            other => Err(MarketError::invalid(format!("Acción desconocida: '{other}'"))),
        }
    }
}

/// A shipment request between one client and one carrier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Solicitud {
    pub id: String,
    pub usuario_id: String,
    pub nombre_usuario: String,
    /// The carrier's account uid.
    pub transportista_id: String,
    /// The carrier's profile id.
    pub transportista_registro_id: String,
    pub nombre_transportista: String,
    pub origen: Ubicacion,
    pub destino: Ubicacion,
    pub distancia_km: f64,
    pub descripcion_carga: String,
    pub tipo_vehiculo: String,
    pub fecha_solicitada: String,
    pub estado: EstadoSolicitud,
    pub calificacion: Option<u8>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Solicitud {
    pub fn is_participant(&self, uid: &str) -> bool {
        self.usuario_id == uid || self.transportista_id == uid
    }
}

impl TryFrom<&Row> for Solicitud {
    type Error = MarketError;

    fn try_from(row: &Row) -> Result<Self, Self::Error> {
        Ok(Solicitud {
            id: values::get_text(row, 0)?,
            usuario_id: values::get_text(row, 1)?,
            nombre_usuario: values::get_text(row, 2)?,
            transportista_id: values::get_text(row, 3)?,
            transportista_registro_id: values::get_text(row, 4)?,
            nombre_transportista: values::get_text(row, 5)?,
            origen: Ubicacion {
                direccion: values::get_text(row, 6)?,
                lat: values::get_opt_f64(row, 7)?,
                lng: values::get_opt_f64(row, 8)?,
            },
            destino: Ubicacion {
                direccion: values::get_text(row, 9)?,
                lat: values::get_opt_f64(row, 10)?,
                lng: values::get_opt_f64(row, 11)?,
            },
            distancia_km: values::get_f64(row, 12)?,
            descripcion_carga: values::get_text(row, 13)?,
            tipo_vehiculo: values::get_text(row, 14)?,
            fecha_solicitada: values::get_text(row, 15)?,
            estado: values::get_text(row, 16)?.parse()?,
            calificacion: values::get_opt_i64(row, 17)?.map(|c| c as u8),
            created_at: values::get_datetime(row, 18)?,
            updated_at: values::get_datetime(row, 19)?,
        })
    }
}

/// A client's new shipment request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NuevaSolicitud {
    /// The carrier's profile id, as shown in search results.
    pub transportista_id: String,
    pub origen: Ubicacion,
    pub destino: Ubicacion,
    pub descripcion_carga: String,
    pub fecha_solicitada: String,
}

/// Which of a client's requests to list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FiltroSolicitudes {
    #[default]
    Todas,
    Activas,
    Estado(EstadoSolicitud),
}

impl FiltroSolicitudes {
    pub fn accepts(&self, estado: EstadoSolicitud) -> bool {
        match self {
            FiltroSolicitudes::Todas => true,
            FiltroSolicitudes::Activas => estado.is_active(),
            FiltroSolicitudes::Estado(e) => *e == estado,
        }
    }
}

impl FromStr for FiltroSolicitudes {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "todas" => Ok(FiltroSolicitudes::Todas),
            "activas" => Ok(FiltroSolicitudes::Activas),
            other => Ok(FiltroSolicitudes::Estado(other.parse()?)),
        }
    }
}
