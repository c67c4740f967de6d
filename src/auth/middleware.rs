//! Caller authentication for handlers
//!
//! The access gate only looks at cookie names. Handlers that act on the
//! caller's behalf use these extractors, which always ask the identity
//! authority.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, request::Parts},
};
use axum_extra::extract::CookieJar;

use super::authority::AuthUser;
use super::session::decode_session_cookie;
use crate::AppState;
use crate::error::AppError;

/// Find the caller's access token
///
/// `Authorization: Bearer` wins over the session cookie so API clients
/// without cookies can call handlers directly.
pub(crate) fn extract_access_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(ToOwned::to_owned)
        .or_else(|| {
            let jar = CookieJar::from_headers(headers);
            jar.get(cookie_name)
                .and_then(|cookie| decode_session_cookie(cookie.value()))
                .map(|tokens| tokens.access_token)
        })
}

async fn authenticate(parts: &Parts, state: &AppState) -> Result<CurrentUser, AppError> {
    let access_token = extract_access_token(&parts.headers, &state.session_cookie.name)
        .ok_or(AppError::Unauthorized)?;

    let user = state
        .authority
        .get_user(&access_token)
        .await?
        .ok_or(AppError::Unauthorized)?;

    Ok(CurrentUser { user, access_token })
}

/// Extractor for the authenticated caller
///
/// # Usage
/// ```ignore
/// async fn handler(
///     CurrentUser { user, .. }: CurrentUser,
/// ) -> impl IntoResponse {
///     format!("Hello, {}", user.id)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: AuthUser,
    /// Token forwarded to Supabase so row-level security applies
    pub access_token: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(current) = parts.extensions.get::<CurrentUser>().cloned() {
            return Ok(current);
        }

        let state = AppState::from_ref(state);
        let current = authenticate(parts, &state).await?;
        parts.extensions.insert(current.clone());

        Ok(current)
    }
}

/// Optional current user extractor
///
/// Returns None if not authenticated, instead of error.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<CurrentUser>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(current) = parts.extensions.get::<CurrentUser>().cloned() {
            return Ok(MaybeUser(Some(current)));
        }

        let app_state = AppState::from_ref(state);
        let current = match authenticate(parts, &app_state).await {
            Ok(current) => Some(current),
            Err(AppError::Unauthorized) => None,
            Err(error) => {
                tracing::warn!(%error, "Could not resolve caller identity");
                None
            }
        };

        if let Some(current) = &current {
            parts.extensions.insert(current.clone());
        }

        Ok(MaybeUser(current))
    }
}
