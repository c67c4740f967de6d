//! Data models
//!
//! Rows as PostgREST returns them (snake_case) and the payloads we send.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

// =============================================================================
// Estado
// =============================================================================

/// Lifecycle state of a visita
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EstadoVisita {
    PendienteSincronizacion,
    Sincronizado,
    EnRevision,
    Aprobado,
    Rechazado,
}

impl EstadoVisita {
    pub const ALL: [EstadoVisita; 5] = [
        EstadoVisita::PendienteSincronizacion,
        EstadoVisita::Sincronizado,
        EstadoVisita::EnRevision,
        EstadoVisita::Aprobado,
        EstadoVisita::Rechazado,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EstadoVisita::PendienteSincronizacion => "PENDIENTE_SINCRONIZACION",
            EstadoVisita::Sincronizado => "SINCRONIZADO",
            EstadoVisita::EnRevision => "EN_REVISION",
            EstadoVisita::Aprobado => "APROBADO",
            EstadoVisita::Rechazado => "RECHAZADO",
        }
    }

    /// Comma-separated list of every accepted value
    pub fn valid_values() -> String {
        Self::ALL
            .iter()
            .map(EstadoVisita::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for EstadoVisita {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EstadoVisita {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|estado| estado.as_str() == s)
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "Invalid estado {s:?}. Valid values: {}",
                    Self::valid_values()
                ))
            })
    }
}

// =============================================================================
// Visita
// =============================================================================

/// A stored visita row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visita {
    pub id: String,
    pub user_id: String,
    /// Identifier assigned on the device before sync
    pub radicado_local: String,
    pub estado: EstadoVisita,
    /// Free-form characterization answers
    #[serde(default)]
    pub caracterizacion: serde_json::Value,
    #[serde(default)]
    pub fotos: Vec<String>,
    pub firma: Option<String>,
    pub latitud: Option<f64>,
    pub longitud: Option<f64>,
    pub observaciones_estado: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Insert payload for a new visita
#[derive(Debug, Clone, Serialize)]
pub struct NewVisita {
    pub user_id: String,
    pub radicado_local: String,
    pub estado: EstadoVisita,
    pub caracterizacion: serde_json::Value,
    pub fotos: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firma: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitud: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitud: Option<f64>,
}

/// Status change for one visita
#[derive(Debug, Clone, PartialEq)]
pub struct EstadoUpdate {
    pub visita_id: String,
    pub estado: EstadoVisita,
    pub observaciones: Option<String>,
}
