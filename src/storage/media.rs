//! Media storage using Supabase Storage
//!
//! Uploads attachments into a public bucket and returns their public URLs.

use async_trait::async_trait;
use reqwest::Method;

use super::BlobStore;
use crate::error::AppError;
use crate::supabase::{SupabaseApi, upstream_error_message};

const SERVICE: &str = "storage";

/// Media storage service
pub struct SupabaseMediaStorage {
    api: SupabaseApi,
    /// Bucket name
    bucket: String,
}

impl SupabaseMediaStorage {
    pub fn new(api: SupabaseApi, bucket: impl Into<String>) -> Self {
        Self {
            api,
            bucket: bucket.into(),
        }
    }

    /// Get public URL for an object path
    ///
    /// # Example
    /// ```ignore
    /// storage.get_public_url("RAD-1/foto-1700000000000.jpg");
    /// // https://<ref>.supabase.co/storage/v1/object/public/visitas/RAD-1/foto-1700000000000.jpg
    /// ```
    pub fn get_public_url(&self, path: &str) -> String {
        self.api.endpoint(&format!(
            "/storage/v1/object/public/{}/{}",
            self.bucket, path
        ))
    }
}

#[async_trait]
impl BlobStore for SupabaseMediaStorage {
    async fn upload(
        &self,
        access_token: &str,
        path: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String, AppError> {
        let request = self
            .api
            .request(
                Method::POST,
                &format!("/storage/v1/object/{}/{}", self.bucket, path),
                Some(access_token),
            )
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header(reqwest::header::CACHE_CONTROL, "max-age=3600")
            .header("x-upsert", "false")
            .body(data);

        let response = self
            .api
            .send(SERVICE, request)
            .await
            .map_err(|e| AppError::Storage(format!("Storage upload failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Storage(
                upstream_error_message(SERVICE, response).await,
            ));
        }

        Ok(self.get_public_url(path))
    }
}
