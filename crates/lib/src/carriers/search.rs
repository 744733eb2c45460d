//! In-memory filtering and ordering of verified carriers.
//!
//! The hosted store the marketplace grew up on could not combine substring
//! and range filters in one query, so filtering always happened after the
//! fetch. The same shape is kept here: SQL selects verified carriers and the
//! remaining filters run in Rust.

use super::types::{FiltroBusqueda, Transportista};
use std::cmp::Ordering;

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub fn matches(carrier: &Transportista, filtro: &FiltroBusqueda) -> bool {
    if let Some(texto) = non_empty(&filtro.texto) {
        if !carrier
            .nombre
            .to_lowercase()
            .contains(&texto.to_lowercase())
        {
            return false;
        }
    }
    if let Some(zona) = non_empty(&filtro.zona) {
        if carrier.zona != zona {
            return false;
        }
    }
    if let Some(tipo) = non_empty(&filtro.tipo_vehiculo) {
        if carrier.vehiculo.tipo != tipo {
            return false;
        }
    }
    if let Some(minima) = filtro.calificacion_minima {
        if carrier.calificacion_promedio < minima {
            return false;
        }
    }
    if filtro.solo_disponibles && !carrier.disponible {
        return false;
    }
    true
}

/// Applies `filtro` and orders by rating (best first), then by name.
pub fn apply(carriers: Vec<Transportista>, filtro: &FiltroBusqueda) -> Vec<Transportista> {
    let mut result: Vec<Transportista> = carriers
        .into_iter()
        .filter(|c| c.verificado && matches(c, filtro))
        .collect();
    result.sort_by(|a, b| {
        b.calificacion_promedio
            .partial_cmp(&a.calificacion_promedio)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.nombre.cmp(&b.nombre))
    });
    result
}
