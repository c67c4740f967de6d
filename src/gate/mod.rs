//! Access gate
//!
//! Runs in front of every route:
//!
//! ```text
//! request ──► SessionRefresher ──► RouteClassifier ──► decide()
//!                                                        │
//!              ┌─────────────────────────┬───────────────┴───────────┐
//!              ▼                         ▼                           ▼
//!        RedirectToLogin          RedirectToLanding              Continue
//!   (protected, no cookie)    (login page, has cookie)   (refreshed cookies added)
//! ```
//!
//! The gate trusts cookie *names* only. That is a routing hint for the
//! browser flow, not authentication: every handler that acts for a user
//! asks the identity authority through [`crate::auth::CurrentUser`].

mod classifier;
mod middleware;
mod refresher;

pub use classifier::{RouteClass, RouteClassifier};
pub use middleware::{AccessGate, access_gate};
pub use refresher::{RefreshedSession, SessionRefresher};

use axum_extra::extract::CookieJar;

/// Outcome of the gate for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Forward to the route
    Continue,
    /// Send to the login page, returning to `return_path` afterwards
    RedirectToLogin { return_path: String },
    /// Already signed in; skip the login page
    RedirectToLanding,
}

impl GateDecision {
    /// Metric label
    pub fn label(&self) -> &'static str {
        match self {
            GateDecision::Continue => "continue",
            GateDecision::RedirectToLogin { .. } => "redirect_to_login",
            GateDecision::RedirectToLanding => "redirect_to_landing",
        }
    }
}

/// Decide what to do with a request
///
/// Protected-route enforcement is checked first, so a path that is both
/// protected and a login page still requires a session.
pub fn decide(class: RouteClass, has_session_evidence: bool, path: &str) -> GateDecision {
    if class.is_protected && !has_session_evidence {
        return GateDecision::RedirectToLogin {
            return_path: path.to_string(),
        };
    }

    if class.is_auth_page && has_session_evidence {
        return GateDecision::RedirectToLanding;
    }

    GateDecision::Continue
}

/// True when any cookie name contains `marker`
///
/// Presence check only; the value is never inspected.
pub fn has_session_evidence(jar: &CookieJar, marker: &str) -> bool {
    jar.iter().any(|cookie| cookie.name().contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_extra::extract::cookie::Cookie;

    const PROTECTED: RouteClass = RouteClass {
        is_protected: true,
        is_auth_page: false,
    };
    const AUTH_PAGE: RouteClass = RouteClass {
        is_protected: false,
        is_auth_page: true,
    };
    const PUBLIC: RouteClass = RouteClass {
        is_protected: false,
        is_auth_page: false,
    };

    #[test]
    fn protected_without_evidence_redirects_to_login() {
        assert_eq!(
            decide(PROTECTED, false, "/dashboard"),
            GateDecision::RedirectToLogin {
                return_path: "/dashboard".to_string()
            }
        );
        assert_eq!(decide(PROTECTED, true, "/dashboard"), GateDecision::Continue);
    }

    #[test]
    fn auth_page_with_evidence_redirects_to_landing() {
        assert_eq!(decide(AUTH_PAGE, true, "/auth/login"), GateDecision::RedirectToLanding);
        assert_eq!(decide(AUTH_PAGE, false, "/auth/login"), GateDecision::Continue);
    }

    #[test]
    fn public_paths_always_continue() {
        assert_eq!(decide(PUBLIC, false, "/"), GateDecision::Continue);
        assert_eq!(decide(PUBLIC, true, "/"), GateDecision::Continue);
    }

    #[test]
    fn protection_wins_over_login_page_redirect() {
        let both = RouteClass {
            is_protected: true,
            is_auth_page: true,
        };
        assert_eq!(
            decide(both, false, "/admin/login"),
            GateDecision::RedirectToLogin {
                return_path: "/admin/login".to_string()
            }
        );
        assert_eq!(decide(both, true, "/admin/login"), GateDecision::RedirectToLanding);
    }

    #[test]
    fn evidence_is_cookie_name_substring() {
        let marker = "auth-token";
        assert!(!has_session_evidence(&CookieJar::new(), marker));

        let jar = CookieJar::new().add(Cookie::new("theme", "auth-token"));
        assert!(!has_session_evidence(&jar, marker), "values are not inspected");

        let jar = CookieJar::new().add(Cookie::new("sb-abc-auth-token", "anything"));
        assert!(has_session_evidence(&jar, marker));

        let jar = CookieJar::new().add(Cookie::new("sb-abc-auth-token.0", "chunk"));
        assert!(has_session_evidence(&jar, marker));
    }
}
