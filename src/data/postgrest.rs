//! Visita persistence through Supabase PostgREST
//!
//! Every call carries the caller's access token, so the project's row-level
//! security policies decide what each user may read or change.

use async_trait::async_trait;
use reqwest::Method;

use super::VisitaStore;
use super::models::{EstadoUpdate, NewVisita, Visita};
use crate::error::AppError;
use crate::supabase::{SupabaseApi, upstream_error_message};

const SERVICE: &str = "rest";

pub struct PostgrestVisitaStore {
    api: SupabaseApi,
    table: String,
}

impl PostgrestVisitaStore {
    pub fn new(api: SupabaseApi, table: impl Into<String>) -> Self {
        Self {
            api,
            table: table.into(),
        }
    }

    fn table_path(&self, query: &str) -> String {
        format!("/rest/v1/{}?{}", self.table, query)
    }

    async fn rows(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<Vec<Visita>, AppError> {
        let response = self.api.send(SERVICE, request).await?;
        if !response.status().is_success() {
            return Err(AppError::Upstream(
                upstream_error_message(SERVICE, response).await,
            ));
        }
        Ok(response.json::<Vec<Visita>>().await?)
    }
}

#[async_trait]
impl VisitaStore for PostgrestVisitaStore {
    async fn update_estado(&self, access_token: &str, update: &EstadoUpdate) -> Result<Visita, AppError> {
        let mut body = serde_json::json!({
            "estado": update.estado,
            "updated_at": chrono::Utc::now(),
        });
        if let Some(observaciones) = &update.observaciones {
            body["observaciones_estado"] = serde_json::Value::String(observaciones.clone());
        }

        let path = self.table_path(&format!(
            "id=eq.{}",
            urlencoding::encode(&update.visita_id)
        ));
        let request = self
            .api
            .request(Method::PATCH, &path, Some(access_token))
            .header("Prefer", "return=representation")
            .json(&body);

        self.rows(request)
            .await?
            .into_iter()
            .next()
            .ok_or(AppError::NotFound)
    }

    async fn insert_visita(&self, access_token: &str, visita: &NewVisita) -> Result<Visita, AppError> {
        let request = self
            .api
            .request(Method::POST, &self.table_path("select=*"), Some(access_token))
            .header("Prefer", "return=representation")
            .json(visita);

        self.rows(request).await?.into_iter().next().ok_or_else(|| {
            AppError::Upstream("Insert returned no representation".to_string())
        })
    }

    async fn list_visitas(&self, access_token: &str, user_id: &str) -> Result<Vec<Visita>, AppError> {
        let path = self.table_path(&format!(
            "select=*&user_id=eq.{}&order=created_at.desc",
            urlencoding::encode(user_id)
        ));
        let request = self.api.request(Method::GET, &path, Some(access_token));
        self.rows(request).await
    }
}
