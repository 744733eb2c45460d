use crate::errors::MarketError;
use chrono::{DateTime, Utc};
use fletia_access::values;
use serde::{Deserialize, Serialize};
use turso::Row;

pub(crate) const CONVERSACION_COLUMNS: &str = "id, solicitud_id, cliente_id, transportista_id, \
    nombre_cliente, nombre_transportista, ultimo_mensaje, ultimo_mensaje_timestamp, created_at";

pub(crate) const MENSAJE_COLUMNS: &str =
    "id, conversacion_id, emisor_id, nombre_emisor, contenido, leido, created_at";

/// The chat thread attached to a request. Participants are always the
/// client uid first and the carrier's account uid second.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversacion {
    pub id: String,
    pub solicitud_id: String,
    pub participantes: [String; 2],
    pub nombre_cliente: String,
    pub nombre_transportista: String,
    pub ultimo_mensaje: String,
    pub ultimo_mensaje_timestamp: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Conversacion {
    pub fn is_participant(&self, uid: &str) -> bool {
        self.participantes.iter().any(|p| p == uid)
    }
}

impl TryFrom<&Row> for Conversacion {
    type Error = MarketError;

    fn try_from(row: &Row) -> Result<Self, Self::Error> {
        Ok(Conversacion {
            id: values::get_text(row, 0)?,
            solicitud_id: values::get_text(row, 1)?,
            participantes: [values::get_text(row, 2)?, values::get_text(row, 3)?],
            nombre_cliente: values::get_text(row, 4)?,
            nombre_transportista: values::get_text(row, 5)?,
            ultimo_mensaje: values::get_text(row, 6)?,
            ultimo_mensaje_timestamp: values::get_datetime(row, 7)?,
            created_at: values::get_datetime(row, 8)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mensaje {
    pub id: String,
    pub conversacion_id: String,
    pub emisor_id: String,
    pub nombre_emisor: String,
    pub contenido: String,
    pub leido: bool,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<&Row> for Mensaje {
    type Error = MarketError;

    fn try_from(row: &Row) -> Result<Self, Self::Error> {
        Ok(Mensaje {
            id: values::get_text(row, 0)?,
            conversacion_id: values::get_text(row, 1)?,
            emisor_id: values::get_text(row, 2)?,
            nombre_emisor: values::get_text(row, 3)?,
            contenido: values::get_text(row, 4)?,
            leido: values::get_bool(row, 5)?,
            created_at: values::get_datetime(row, 6)?,
        })
    }
}
