//! Data layer module
//!
//! Visita rows live in Supabase; this module defines the models and the
//! store seam the handlers talk to.

mod models;
mod postgrest;

pub use models::*;
pub use postgrest::PostgrestVisitaStore;

use async_trait::async_trait;

use crate::error::AppError;

/// Persistence for visitas
///
/// All operations act as the caller identified by `access_token`.
#[async_trait]
pub trait VisitaStore: Send + Sync {
    /// Set the estado of one visita; `AppError::NotFound` when no row matched
    async fn update_estado(&self, access_token: &str, update: &EstadoUpdate) -> Result<Visita, AppError>;

    async fn insert_visita(&self, access_token: &str, visita: &NewVisita) -> Result<Visita, AppError>;

    /// Visitas owned by `user_id`, newest first
    async fn list_visitas(&self, access_token: &str, user_id: &str) -> Result<Vec<Visita>, AppError>;
}
