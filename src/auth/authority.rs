//! Identity authority seam
//!
//! The service of record for who the caller is. Production wiring talks to
//! Supabase Auth; tests substitute their own.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::session::SessionTokens;
use crate::error::AppError;

/// A user as reported by the identity authority
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityAuthority: Send + Sync {
    /// Resolve the user owning `access_token`
    ///
    /// `Ok(None)` means the authority rejected the token.
    async fn get_user(&self, access_token: &str) -> Result<Option<AuthUser>, AppError>;

    /// Exchange a refresh token for a new session
    async fn refresh_session(&self, refresh_token: &str) -> Result<SessionTokens, AppError>;

    /// Password sign-in; `Ok(None)` for rejected credentials
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<SessionTokens>, AppError>;

    /// Revoke the session behind `access_token`
    async fn sign_out(&self, access_token: &str) -> Result<(), AppError>;
}
