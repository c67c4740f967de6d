//! Supabase Auth (GoTrue) client

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::Deserialize;

use super::authority::{AuthUser, IdentityAuthority};
use super::session::SessionTokens;
use crate::error::AppError;
use crate::supabase::{SupabaseApi, upstream_error_message};

const SERVICE: &str = "auth";

/// Identity authority backed by Supabase Auth
pub struct SupabaseAuth {
    api: SupabaseApi,
}

impl SupabaseAuth {
    pub fn new(api: SupabaseApi) -> Self {
        Self { api }
    }

    async fn token_grant(
        &self,
        grant_type: &str,
        body: serde_json::Value,
    ) -> Result<reqwest::Response, AppError> {
        let request = self
            .api
            .request(
                Method::POST,
                &format!("/auth/v1/token?grant_type={grant_type}"),
                None,
            )
            .json(&body);
        self.api.send(SERVICE, request).await
    }
}

/// Token endpoint response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: Option<i64>,
    expires_at: Option<i64>,
}

impl From<TokenResponse> for SessionTokens {
    fn from(response: TokenResponse) -> Self {
        let expires_at = response.expires_at.unwrap_or_else(|| {
            chrono::Utc::now().timestamp() + response.expires_in.unwrap_or(3600)
        });
        SessionTokens {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_at,
        }
    }
}

#[async_trait]
impl IdentityAuthority for SupabaseAuth {
    async fn get_user(&self, access_token: &str) -> Result<Option<AuthUser>, AppError> {
        let request = self
            .api
            .request(Method::GET, "/auth/v1/user", Some(access_token));
        let response = self.api.send(SERVICE, request).await?;

        match response.status() {
            status if status.is_success() => Ok(Some(response.json::<AuthUser>().await?)),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            _ => Err(AppError::Upstream(
                upstream_error_message(SERVICE, response).await,
            )),
        }
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<SessionTokens, AppError> {
        let response = self
            .token_grant(
                "refresh_token",
                serde_json::json!({ "refresh_token": refresh_token }),
            )
            .await?;

        if !response.status().is_success() {
            return Err(AppError::Upstream(
                upstream_error_message(SERVICE, response).await,
            ));
        }

        Ok(response.json::<TokenResponse>().await?.into())
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<SessionTokens>, AppError> {
        let response = self
            .token_grant(
                "password",
                serde_json::json!({ "email": email, "password": password }),
            )
            .await?;

        match response.status() {
            status if status.is_success() => {
                Ok(Some(response.json::<TokenResponse>().await?.into()))
            }
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => {
                tracing::info!("Password sign-in rejected by identity authority");
                Ok(None)
            }
            _ => Err(AppError::Upstream(
                upstream_error_message(SERVICE, response).await,
            )),
        }
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AppError> {
        let request = self
            .api
            .request(Method::POST, "/auth/v1/logout", Some(access_token));
        let response = self.api.send(SERVICE, request).await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(AppError::Upstream(
                upstream_error_message(SERVICE, response).await,
            ))
        }
    }
}
