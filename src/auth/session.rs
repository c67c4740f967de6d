//! Session cookie codec
//!
//! The Supabase session lives entirely in a client cookie. Its value is
//! `base64-` followed by unpadded URL-safe base64 of the token JSON, which
//! keeps it within the cookie value character set.

use axum_extra::extract::cookie::{Cookie, SameSite};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

const COOKIE_VALUE_PREFIX: &str = "base64-";

/// Tokens issued by the identity authority
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token expiry, unix seconds
    pub expires_at: i64,
}

impl SessionTokens {
    /// True when the access token expires within `margin_seconds` of `now`
    pub fn expires_within(&self, margin_seconds: i64, now: i64) -> bool {
        self.expires_at - now <= margin_seconds
    }
}

/// Encode tokens into a cookie value
pub fn encode_session_cookie(tokens: &SessionTokens) -> Result<String, AppError> {
    use base64::{Engine as _, engine::general_purpose};

    let payload = serde_json::to_vec(tokens).map_err(|e| AppError::Internal(e.into()))?;
    Ok(format!(
        "{}{}",
        COOKIE_VALUE_PREFIX,
        general_purpose::URL_SAFE_NO_PAD.encode(payload)
    ))
}

/// Decode a cookie value back into tokens
///
/// Returns `None` for anything malformed; callers treat that as no session.
pub fn decode_session_cookie(value: &str) -> Option<SessionTokens> {
    use base64::{Engine as _, engine::general_purpose};

    let encoded = value.strip_prefix(COOKIE_VALUE_PREFIX)?;
    let payload = general_purpose::URL_SAFE_NO_PAD.decode(encoded).ok()?;
    serde_json::from_slice(&payload).ok()
}

/// How session cookies are named and flagged
#[derive(Debug, Clone)]
pub struct SessionCookieSettings {
    pub name: String,
    pub secure: bool,
    pub max_age_seconds: i64,
}

impl SessionCookieSettings {
    /// Seven days, matching the refresh token lifetime we expect upstream
    pub const DEFAULT_MAX_AGE_SECONDS: i64 = 7 * 24 * 60 * 60;

    pub fn from_config(config: &crate::config::AppConfig) -> Self {
        Self {
            name: config.session_cookie_name(),
            secure: config.should_use_secure_cookies(),
            max_age_seconds: Self::DEFAULT_MAX_AGE_SECONDS,
        }
    }

    /// Build the `Set-Cookie` for a fresh session
    pub fn build(&self, tokens: &SessionTokens) -> Result<Cookie<'static>, AppError> {
        Ok(Cookie::build((self.name.clone(), encode_session_cookie(tokens)?))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::seconds(self.max_age_seconds))
            .build())
    }

    /// Removal cookie for logout
    pub fn removal(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build((self.name.clone(), String::new()))
            .path("/")
            .http_only(true)
            .build();
        cookie.make_removal();
        cookie
    }
}
