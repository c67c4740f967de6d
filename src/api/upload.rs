//! Attachment upload endpoint

use axum::{
    extract::{Multipart, State},
    response::Json,
};
use axum_extra::extract::WithRejection;
use serde::Serialize;

use crate::AppState;
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::metrics::{UPLOAD_BYTES_TOTAL, UPLOADS_TOTAL};
use crate::storage::{UploadKind, object_path, validate_radicado};

pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub url: String,
    pub path: String,
}

/// POST /api/upload
///
/// Multipart fields: `file`, `tipo` (`firma` | `foto`), `radicadoLocal`.
/// Bodies over the route's limit surface as a multipart read error and are
/// answered with 400 like any other malformed upload.
pub async fn upload_file(
    State(state): State<AppState>,
    CurrentUser { user, access_token }: CurrentUser,
    WithRejection(mut multipart, _): WithRejection<Multipart, AppError>,
) -> Result<Json<UploadResponse>, AppError> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut tipo: Option<String> = None;
    let mut radicado: Option<String> = None;

    while let Some(mut field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => {
                let mut bytes = Vec::new();
                while let Some(chunk) = field.chunk().await? {
                    if bytes.len() + chunk.len() > MAX_UPLOAD_BYTES {
                        return Err(AppError::Validation(format!(
                            "File too large: exceeds {} bytes",
                            MAX_UPLOAD_BYTES
                        )));
                    }
                    bytes.extend_from_slice(&chunk);
                }
                file_data = Some(bytes);
            }
            "tipo" => tipo = Some(field.text().await?),
            "radicadoLocal" => radicado = Some(field.text().await?),
            _ => {}
        }
    }

    let (Some(file_data), Some(tipo), Some(radicado)) = (file_data, tipo, radicado) else {
        return Err(AppError::Validation(
            "file, tipo and radicadoLocal are required".to_string(),
        ));
    };
    if file_data.is_empty() {
        return Err(AppError::Validation("file must not be empty".to_string()));
    }

    let kind: UploadKind = tipo.trim().parse()?;
    let radicado = validate_radicado(&radicado)?;
    let path = object_path(radicado, kind, chrono::Utc::now().timestamp_millis());
    let size = file_data.len();

    let url = state
        .storage
        .upload(&access_token, &path, file_data, kind.content_type())
        .await
        .map_err(|error| match error {
            AppError::Storage(_) => error,
            other => AppError::Storage(format!("Storage upload failed: {other}")),
        })?;

    UPLOADS_TOTAL.with_label_values(&[kind.as_str()]).inc();
    UPLOAD_BYTES_TOTAL.inc_by(size as f64);
    tracing::info!(path = %path, bytes = size, user_id = %user.id, "Attachment uploaded");

    Ok(Json(UploadResponse {
        success: true,
        url,
        path,
    }))
}
