//! Visita endpoints

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::auth::CurrentUser;
use crate::data::{EstadoUpdate, EstadoVisita, NewVisita, Visita};
use crate::error::AppError;
use crate::metrics::{VISITA_STATUS_UPDATES_TOTAL, VISITAS_CREATED_TOTAL};

// =============================================================================
// Status update
// =============================================================================

/// Status update request
///
/// Fields are optional here so missing ones surface as our own 400 rather
/// than a deserialization rejection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstadoUpdateRequest {
    pub visita_id: Option<String>,
    pub estado: Option<String>,
    pub observaciones: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EstadoUpdateResponse {
    pub success: bool,
    pub estado: EstadoVisita,
}

impl EstadoUpdateRequest {
    fn validate(self) -> Result<EstadoUpdate, AppError> {
        let visita_id = self
            .visita_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());
        let estado = self.estado.filter(|estado| !estado.trim().is_empty());

        let (Some(visita_id), Some(estado)) = (visita_id, estado) else {
            return Err(AppError::Validation(
                "visitaId and estado are required".to_string(),
            ));
        };

        Ok(EstadoUpdate {
            visita_id,
            estado: estado.trim().parse()?,
            observaciones: self
                .observaciones
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty()),
        })
    }
}

/// POST /api/visitas/estado
pub async fn update_estado(
    State(state): State<AppState>,
    CurrentUser { user, access_token }: CurrentUser,
    WithRejection(Json(req), _): WithRejection<Json<EstadoUpdateRequest>, AppError>,
) -> Result<Json<EstadoUpdateResponse>, AppError> {
    let update = req.validate()?;

    let visita = state
        .visitas
        .update_estado(&access_token, &update)
        .await
        .map_err(|error| match error {
            AppError::NotFound | AppError::Unauthorized => error,
            other => AppError::Upstream(format!("Failed to update visita estado: {other}")),
        })?;

    VISITA_STATUS_UPDATES_TOTAL
        .with_label_values(&[update.estado.as_str()])
        .inc();
    tracing::info!(
        visita_id = %update.visita_id,
        estado = %update.estado,
        user_id = %user.id,
        "Visita estado updated"
    );

    Ok(Json(EstadoUpdateResponse {
        success: true,
        estado: visita.estado,
    }))
}

// =============================================================================
// Create / list
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVisitaRequest {
    pub radicado_local: Option<String>,
    #[serde(default)]
    pub caracterizacion: serde_json::Value,
    #[serde(default)]
    pub fotos: Vec<String>,
    pub firma: Option<String>,
    pub latitud: Option<f64>,
    pub longitud: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct CreateVisitaResponse {
    pub success: bool,
    pub visita: Visita,
}

impl CreateVisitaRequest {
    fn into_new_visita(self, user_id: &str) -> Result<NewVisita, AppError> {
        let radicado_local = self
            .radicado_local
            .map(|radicado| radicado.trim().to_string())
            .filter(|radicado| !radicado.is_empty())
            .ok_or_else(|| AppError::Validation("radicadoLocal is required".to_string()))?;

        let caracterizacion = match self.caracterizacion {
            serde_json::Value::Null => serde_json::Value::Object(Default::default()),
            value @ serde_json::Value::Object(_) => value,
            _ => {
                return Err(AppError::Validation(
                    "caracterizacion must be an object".to_string(),
                ));
            }
        };

        if let Some(latitud) = self.latitud {
            if !(-90.0..=90.0).contains(&latitud) {
                return Err(AppError::Validation("latitud out of range".to_string()));
            }
        }
        if let Some(longitud) = self.longitud {
            if !(-180.0..=180.0).contains(&longitud) {
                return Err(AppError::Validation("longitud out of range".to_string()));
            }
        }

        Ok(NewVisita {
            user_id: user_id.to_string(),
            radicado_local,
            estado: EstadoVisita::PendienteSincronizacion,
            caracterizacion,
            fotos: self.fotos,
            firma: self.firma,
            latitud: self.latitud,
            longitud: self.longitud,
        })
    }
}

/// POST /api/visitas
pub async fn create_visita(
    State(state): State<AppState>,
    CurrentUser { user, access_token }: CurrentUser,
    WithRejection(Json(req), _): WithRejection<Json<CreateVisitaRequest>, AppError>,
) -> Result<(StatusCode, Json<CreateVisitaResponse>), AppError> {
    let new_visita = req.into_new_visita(&user.id)?;
    let visita = state.visitas.insert_visita(&access_token, &new_visita).await?;

    VISITAS_CREATED_TOTAL.inc();
    tracing::info!(
        visita_id = %visita.id,
        radicado_local = %visita.radicado_local,
        "Visita created"
    );

    Ok((
        StatusCode::CREATED,
        Json(CreateVisitaResponse {
            success: true,
            visita,
        }),
    ))
}

/// GET /api/visitas
pub async fn list_visitas(
    State(state): State<AppState>,
    CurrentUser { user, access_token }: CurrentUser,
) -> Result<Json<Vec<Visita>>, AppError> {
    let visitas = state.visitas.list_visitas(&access_token, &user.id).await?;
    Ok(Json(visitas))
}
