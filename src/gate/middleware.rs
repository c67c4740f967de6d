//! Access gate middleware

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderValue, header},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;

use super::{
    GateDecision, RefreshedSession, RouteClassifier, SessionRefresher, decide,
    has_session_evidence,
};
use crate::config::GateConfig;
use crate::metrics::GATE_DECISIONS_TOTAL;

/// Gate state, built once at startup
pub struct AccessGate {
    config: GateConfig,
    classifier: RouteClassifier,
    refresher: SessionRefresher,
}

impl AccessGate {
    pub fn new(config: GateConfig, refresher: SessionRefresher) -> Self {
        let classifier = RouteClassifier::new(&config);
        Self {
            config,
            classifier,
            refresher,
        }
    }

    /// Login URL carrying `return_path` as the post-login target
    pub fn login_redirect_location(&self, return_path: &str) -> String {
        format!(
            "{}?{}={}",
            self.config.login_path,
            self.config.redirect_param,
            urlencoding::encode(return_path)
        )
    }

    /// Evaluate the gate for one request
    pub async fn evaluate(&self, jar: &CookieJar, path: &str) -> (GateDecision, Option<RefreshedSession>) {
        let refreshed = self.refresher.refresh(jar).await;
        let class = self.classifier.classify(path);
        let evidence = has_session_evidence(jar, &self.config.session_cookie_marker);
        (decide(class, evidence, path), refreshed)
    }
}

/// Middleware applying the [`AccessGate`]
///
/// # Usage
/// ```ignore
/// let app = Router::new()
///     .route("/dashboard", get(dashboard))
///     .layer(middleware::from_fn_with_state(Arc::new(gate), access_gate));
/// ```
pub async fn access_gate(
    State(gate): State<Arc<AccessGate>>,
    mut request: Request,
    next: Next,
) -> Response {
    let jar = CookieJar::from_headers(request.headers());
    let path = request.uri().path().to_owned();

    let (decision, refreshed) = gate.evaluate(&jar, &path).await;
    GATE_DECISIONS_TOTAL
        .with_label_values(&[decision.label()])
        .inc();

    match decision {
        GateDecision::RedirectToLogin { return_path } => {
            tracing::debug!(path = %return_path, "No session cookie on protected route");
            Redirect::temporary(&gate.login_redirect_location(&return_path)).into_response()
        }
        GateDecision::RedirectToLanding => {
            tracing::debug!(path = %path, "Session cookie present on login page");
            Redirect::temporary(&gate.config.landing_path).into_response()
        }
        GateDecision::Continue => {
            let Some(refreshed) = refreshed else {
                return next.run(request).await;
            };

            forward_refreshed_cookie(&mut request, jar, &refreshed);
            let mut response = next.run(request).await;
            match HeaderValue::from_str(&refreshed.cookie.to_string()) {
                Ok(value) => {
                    response.headers_mut().append(header::SET_COOKIE, value);
                }
                Err(error) => {
                    tracing::warn!(%error, "Refreshed session cookie is not a valid header value");
                }
            }
            response
        }
    }
}

/// Replace the session cookie on the inbound request
///
/// Handlers downstream then authenticate with the renewed access token.
fn forward_refreshed_cookie(request: &mut Request, jar: CookieJar, refreshed: &RefreshedSession) {
    let jar = jar.add(refreshed.cookie.clone());
    let header_value = jar
        .iter()
        .map(|cookie| format!("{}={}", cookie.name(), cookie.value()))
        .collect::<Vec<_>>()
        .join("; ");

    match HeaderValue::from_str(&header_value) {
        Ok(value) => {
            request.headers_mut().insert(header::COOKIE, value);
        }
        Err(error) => {
            tracing::warn!(%error, "Could not rewrite request cookies after refresh");
        }
    }
}
