//! Session refresh
//!
//! Fails open: any problem reaching the identity authority leaves the request
//! as it was. Protected-route checks in the gate still apply afterwards.

use std::sync::Arc;

use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::Cookie;

use crate::auth::session::decode_session_cookie;
use crate::auth::{IdentityAuthority, SessionCookieSettings, SessionTokens};
use crate::metrics::SESSION_REFRESH_TOTAL;

/// A session the authority just renewed
#[derive(Debug, Clone)]
pub struct RefreshedSession {
    pub tokens: SessionTokens,
    /// Cookie to hand back to the client
    pub cookie: Cookie<'static>,
}

pub struct SessionRefresher {
    authority: Arc<dyn IdentityAuthority>,
    cookie: SessionCookieSettings,
    refresh_margin_seconds: i64,
}

impl SessionRefresher {
    pub fn new(
        authority: Arc<dyn IdentityAuthority>,
        cookie: SessionCookieSettings,
        refresh_margin_seconds: i64,
    ) -> Self {
        Self {
            authority,
            cookie,
            refresh_margin_seconds,
        }
    }

    /// Renew the session carried by `jar` if it is about to expire
    ///
    /// Returns `None` whenever there is nothing to hand back to the client:
    /// no session, a session still fresh, or a failed refresh.
    pub async fn refresh(&self, jar: &CookieJar) -> Option<RefreshedSession> {
        let raw = jar.get(&self.cookie.name)?;
        let Some(tokens) = decode_session_cookie(raw.value()) else {
            tracing::debug!(cookie = %self.cookie.name, "Ignoring undecodable session cookie");
            SESSION_REFRESH_TOTAL.with_label_values(&["undecodable"]).inc();
            return None;
        };

        let now = chrono::Utc::now().timestamp();
        if !tokens.expires_within(self.refresh_margin_seconds, now) {
            return None;
        }

        let refreshed = match self.authority.refresh_session(&tokens.refresh_token).await {
            Ok(refreshed) => refreshed,
            Err(error) => {
                tracing::warn!(%error, "Session refresh failed; continuing without refreshed cookies");
                SESSION_REFRESH_TOTAL.with_label_values(&["failed"]).inc();
                return None;
            }
        };

        match self.cookie.build(&refreshed) {
            Ok(cookie) => {
                tracing::debug!(expires_at = refreshed.expires_at, "Session refreshed");
                SESSION_REFRESH_TOTAL.with_label_values(&["refreshed"]).inc();
                Some(RefreshedSession {
                    tokens: refreshed,
                    cookie,
                })
            }
            Err(error) => {
                tracing::warn!(%error, "Could not encode refreshed session cookie");
                SESSION_REFRESH_TOTAL.with_label_values(&["failed"]).inc();
                None
            }
        }
    }
}
