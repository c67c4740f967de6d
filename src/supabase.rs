//! Shared Supabase HTTP plumbing
//!
//! Auth, PostgREST and Storage clients all talk to the same project with the
//! same `apikey` header; this holds that common part.

use std::time::Instant;

use reqwest::{Method, RequestBuilder, Response};

use crate::config::SupabaseConfig;
use crate::error::AppError;
use crate::metrics::UPSTREAM_REQUEST_DURATION_SECONDS;

/// Handle on a Supabase project
#[derive(Clone)]
pub struct SupabaseApi {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseApi {
    pub fn new(http: reqwest::Client, config: &SupabaseConfig) -> Self {
        Self {
            http,
            base_url: config.base_url().to_string(),
            anon_key: config.anon_key.clone(),
        }
    }

    /// Absolute URL for a project path such as `/auth/v1/user`
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Request builder carrying the project `apikey`
    ///
    /// Authorization defaults to the anon key; callers acting for a user
    /// pass the user's access token so row-level security applies.
    pub fn request(&self, method: Method, path: &str, access_token: Option<&str>) -> RequestBuilder {
        let bearer = access_token.unwrap_or(&self.anon_key);
        self.http
            .request(method, self.endpoint(path))
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
    }

    /// Send a request and record its latency under `service`
    pub async fn send(&self, service: &str, request: RequestBuilder) -> Result<Response, AppError> {
        let started = Instant::now();
        let result = request.send().await;
        UPSTREAM_REQUEST_DURATION_SECONDS
            .with_label_values(&[service])
            .observe(started.elapsed().as_secs_f64());
        Ok(result?)
    }
}

/// Turn a non-success upstream response into an error message
///
/// Supabase services answer with `message`, `msg` or `error_description`
/// depending on the service; fall back to the raw body.
pub async fn upstream_error_message(service: &str, response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|value| {
            ["message", "msg", "error_description", "error"]
                .iter()
                .find_map(|key| value.get(*key).and_then(|v| v.as_str()).map(ToOwned::to_owned))
        })
        .unwrap_or(body);

    tracing::warn!(service, status = %status, detail = %detail, "Upstream request failed");
    format!("{service} request failed ({status}): {detail}")
}
