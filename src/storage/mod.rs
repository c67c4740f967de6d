//! Supabase Storage module
//!
//! Handles:
//! - Photo and signature uploads for visitas
//! - Object naming per upload kind

mod media;

pub use media::SupabaseMediaStorage;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;

use crate::error::AppError;

/// Blob storage for visita attachments
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `data` at `path` as the caller; returns the public URL
    async fn upload(
        &self,
        access_token: &str,
        path: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String, AppError>;
}

/// Kind of attachment being uploaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    /// Signature, captured as PNG
    Firma,
    /// Photo, captured as JPEG
    Foto,
}

impl UploadKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadKind::Firma => "firma",
            UploadKind::Foto => "foto",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            UploadKind::Firma => "png",
            UploadKind::Foto => "jpg",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            UploadKind::Firma => "image/png",
            UploadKind::Foto => "image/jpeg",
        }
    }
}

impl fmt::Display for UploadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UploadKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "firma" => Ok(UploadKind::Firma),
            "foto" => Ok(UploadKind::Foto),
            other => Err(AppError::Validation(format!(
                "Invalid tipo {other:?}. Valid values: firma, foto"
            ))),
        }
    }
}

/// Check a device-assigned radicado before using it as a folder name
pub fn validate_radicado(radicado: &str) -> Result<&str, AppError> {
    let radicado = radicado.trim();
    if radicado.is_empty() {
        return Err(AppError::Validation("radicadoLocal is required".to_string()));
    }
    if radicado.contains(['/', '\\']) || radicado.contains("..") {
        return Err(AppError::Validation(
            "radicadoLocal must not contain path separators".to_string(),
        ));
    }
    Ok(radicado)
}

/// Object path `{radicado}/{tipo}-{epoch_millis}.{ext}`
pub fn object_path(radicado: &str, kind: UploadKind, epoch_millis: i64) -> String {
    format!(
        "{}/{}-{}.{}",
        radicado,
        kind.as_str(),
        epoch_millis,
        kind.extension()
    )
}
