use crate::errors::MarketError;
use chrono::{DateTime, Utc};
use fletia_access::values;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use turso::Row;

/// Column list matching [`Transportista::try_from`].
pub(crate) const TRANSPORTISTA_COLUMNS: &str = "id, usuario_id, nombre, email, telefono, zona, \
    descripcion, disponible, verificado, estado_verificacion, motivo_rechazo, fecha_aprobacion, \
    fecha_rechazo, vehiculo_tipo, vehiculo_marca, vehiculo_modelo, vehiculo_anio, vehiculo_placa, \
    vehiculo_capacidad_kg, vehiculo_fotos, doc_licencia, doc_tarjeta_circulacion, \
    calificacion_promedio, total_calificaciones, servicios_completados, created_at";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehiculo {
    #[serde(default)]
    pub tipo: String,
    #[serde(default)]
    pub marca: String,
    #[serde(default)]
    pub modelo: String,
    #[serde(default)]
    pub anio: Option<i32>,
    #[serde(default)]
    pub placa: String,
    #[serde(default)]
    pub capacidad_kg: Option<i64>,
    /// Public URLs of vehicle photos on the media host.
    #[serde(default)]
    pub fotos: Vec<String>,
}

/// Public URLs of the carrier's uploaded documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Documentos {
    #[serde(default)]
    pub licencia: String,
    #[serde(default)]
    pub tarjeta_circulacion: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EstadoVerificacion {
    Pendiente,
    Aprobado,
    Rechazado,
}

impl EstadoVerificacion {
    pub fn as_str(&self) -> &'static str {
        match self {
            EstadoVerificacion::Pendiente => "pendiente",
            EstadoVerificacion::Aprobado => "aprobado",
            EstadoVerificacion::Rechazado => "rechazado",
        }
    }
}

impl fmt::Display for EstadoVerificacion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EstadoVerificacion {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pendiente" => Ok(EstadoVerificacion::Pendiente),
            "aprobado" => Ok(EstadoVerificacion::Aprobado),
            "rechazado" => Ok(EstadoVerificacion::Rechazado),
            other => Err(MarketError::invalid(format!(
                "Estado de verificación desconocido: '{other}'"
            ))),
        }
    }
}

/// A carrier profile, from application through approval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transportista {
    pub id: String,
    /// The linked account. `None` until the carrier is approved (or
    /// registered themselves).
    pub usuario_id: Option<String>,
    pub nombre: String,
    pub email: String,
    pub telefono: String,
    pub zona: String,
    pub descripcion: String,
    pub disponible: bool,
    pub verificado: bool,
    pub estado_verificacion: EstadoVerificacion,
    pub motivo_rechazo: Option<String>,
    pub fecha_aprobacion: Option<DateTime<Utc>>,
    pub fecha_rechazo: Option<DateTime<Utc>>,
    pub vehiculo: Vehiculo,
    pub documentos: Documentos,
    pub calificacion_promedio: f64,
    pub total_calificaciones: i64,
    pub servicios_completados: i64,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<&Row> for Transportista {
    type Error = MarketError;

    fn try_from(row: &Row) -> Result<Self, Self::Error> {
        let fotos_json = values::get_text(row, 19)?;
        let fotos: Vec<String> = serde_json::from_str(&fotos_json)?;
        Ok(Transportista {
            id: values::get_text(row, 0)?,
            usuario_id: values::get_opt_text(row, 1)?,
            nombre: values::get_text(row, 2)?,
            email: values::get_text(row, 3)?,
            telefono: values::get_text(row, 4)?,
            zona: values::get_text(row, 5)?,
            descripcion: values::get_text(row, 6)?,
            disponible: values::get_bool(row, 7)?,
            verificado: values::get_bool(row, 8)?,
            estado_verificacion: values::get_text(row, 9)?.parse()?,
            motivo_rechazo: values::get_opt_text(row, 10)?,
            fecha_aprobacion: values::get_opt_datetime(row, 11)?,
            fecha_rechazo: values::get_opt_datetime(row, 12)?,
            vehiculo: Vehiculo {
                tipo: values::get_text(row, 13)?,
                marca: values::get_text(row, 14)?,
                modelo: values::get_text(row, 15)?,
                anio: values::get_opt_i64(row, 16)?.map(|a| a as i32),
                placa: values::get_text(row, 17)?,
                capacidad_kg: values::get_opt_i64(row, 18)?,
                fotos,
            },
            documentos: Documentos {
                licencia: values::get_text(row, 20)?,
                tarjeta_circulacion: values::get_text(row, 21)?,
            },
            calificacion_promedio: values::get_f64(row, 22)?,
            total_calificaciones: values::get_i64(row, 23)?,
            servicios_completados: values::get_i64(row, 24)?,
            created_at: values::get_datetime(row, 25)?,
        })
    }
}

/// A public carrier application, submitted before any account exists.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistroTransportista {
    pub nombre: String,
    pub email: String,
    #[serde(default)]
    pub telefono: String,
    #[serde(default)]
    pub zona: String,
    #[serde(default)]
    pub descripcion: String,
    #[serde(default)]
    pub vehiculo: Vehiculo,
    #[serde(default)]
    pub documentos: Documentos,
}

/// The profile fields a carrier edits on their own dashboard.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActualizacionPerfil {
    pub zona: String,
    #[serde(default)]
    pub descripcion: String,
    #[serde(default)]
    pub disponible: bool,
    pub vehiculo: Vehiculo,
    /// `None` keeps the documents already on file.
    #[serde(default)]
    pub documentos: Option<Documentos>,
}

/// Search filters for verified carriers. Empty fields do not filter.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FiltroBusqueda {
    #[serde(default)]
    pub texto: Option<String>,
    #[serde(default)]
    pub zona: Option<String>,
    #[serde(default)]
    pub tipo_vehiculo: Option<String>,
    #[serde(default)]
    pub calificacion_minima: Option<f64>,
    #[serde(default)]
    pub solo_disponibles: bool,
}
