//! Password login and logout
//!
//! Credentials go straight to the identity authority; this module only
//! moves the resulting tokens in and out of the session cookie.

use axum::{
    Form, Router,
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::{CookieJar, WithRejection};
use serde::Deserialize;

use super::middleware::extract_access_token;
use crate::AppState;
use crate::config::GateConfig;
use crate::error::AppError;

/// Create authentication router
///
/// Routes:
/// - GET {login_path} and aliases - Login page
/// - POST {login_path} - Password sign-in
/// - POST /auth/logout - Logout
pub fn auth_router(gate: &GateConfig) -> Router<AppState> {
    let mut router = Router::new().route(&gate.login_path, get(login_page).post(login));
    for alias in &gate.login_aliases {
        if alias != &gate.login_path {
            router = router.route(alias, get(login_page));
        }
    }
    router.route("/auth/logout", post(logout))
}

// =============================================================================
// Login Page
// =============================================================================

#[derive(Debug, Default, Deserialize)]
struct LoginPageQuery {
    #[serde(rename = "redirectTo")]
    redirect_to: Option<String>,
    error: Option<String>,
}

/// GET /auth/login
async fn login_page(State(state): State<AppState>, Query(query): Query<LoginPageQuery>) -> Html<String> {
    use html_escape::{encode_double_quoted_attribute, encode_text};

    let error = match query.error.as_deref() {
        Some("invalid_credentials") => "<p class=\"error\">Correo o contraseña incorrectos</p>",
        Some("missing_credentials") => "<p class=\"error\">Ingrese correo y contraseña</p>",
        Some(_) => "<p class=\"error\">No fue posible iniciar sesión</p>",
        None => "",
    };
    let redirect_to = query.redirect_to.unwrap_or_default();

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="es">
<head><meta charset="utf-8"><title>{title}</title></head>
<body>
    <h1>{title}</h1>
    {error}
    <form method="post" action="{action}">
        <input type="email" name="email" required />
        <input type="password" name="password" required />
        <input type="hidden" name="redirectTo" value="{redirect_to}" />
        <button type="submit">Ingresar</button>
    </form>
</body>
</html>"#,
        title = encode_text("Iniciar sesión - Visitas"),
        action = encode_double_quoted_attribute(&state.config.gate.login_path),
        redirect_to = encode_double_quoted_attribute(&redirect_to),
    ))
}

// =============================================================================
// Password sign-in
// =============================================================================

#[derive(Debug, Deserialize)]
struct LoginForm {
    email: Option<String>,
    password: Option<String>,
    #[serde(rename = "redirectTo")]
    redirect_to: Option<String>,
}

/// POST /auth/login
///
/// # Steps
/// 1. Check both credentials are present
/// 2. Password grant against the identity authority
/// 3. Store tokens in the session cookie
/// 4. Redirect to the local return path, or the landing page
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Form(form), _): WithRejection<Form<LoginForm>, AppError>,
) -> Result<Response, AppError> {
    let gate = &state.config.gate;
    let redirect_to = form.redirect_to.as_deref().unwrap_or_default();

    let email = form.email.as_deref().map(str::trim).unwrap_or_default();
    let password = form.password.as_deref().unwrap_or_default();
    if email.is_empty() || password.is_empty() {
        return Ok(Redirect::to(&login_error_location(gate, "missing_credentials", redirect_to))
            .into_response());
    }

    let Some(tokens) = state.authority.sign_in_with_password(email, password).await? else {
        return Ok(Redirect::to(&login_error_location(gate, "invalid_credentials", redirect_to))
            .into_response());
    };

    let cookie = state.session_cookie.build(&tokens)?;
    let target = safe_return_path(redirect_to).unwrap_or(&gate.landing_path);
    tracing::info!(return_path = %target, "User signed in");

    Ok((jar.add(cookie), Redirect::to(target)).into_response())
}

/// Accept only same-origin absolute paths as return targets
fn safe_return_path(candidate: &str) -> Option<&str> {
    let is_local = candidate.starts_with('/')
        && !candidate.starts_with("//")
        && !candidate.starts_with("/\\")
        && !candidate.contains(['\r', '\n']);
    is_local.then_some(candidate)
}

fn login_error_location(gate: &GateConfig, error: &str, redirect_to: &str) -> String {
    let mut location = format!("{}?error={}", gate.login_path, error);
    if let Some(path) = safe_return_path(redirect_to) {
        location.push_str(&format!(
            "&{}={}",
            gate.redirect_param,
            urlencoding::encode(path)
        ));
    }
    location
}

// =============================================================================
// Logout
// =============================================================================

/// POST /auth/logout
///
/// Revokes the session upstream when possible, then clears the cookie.
/// An upstream failure does not keep the user signed in locally.
async fn logout(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
    jar: CookieJar,
) -> impl IntoResponse {
    if let Some(access_token) = extract_access_token(&headers, &state.session_cookie.name) {
        if let Err(error) = state.authority.sign_out(&access_token).await {
            tracing::warn!(%error, "Upstream sign-out failed; clearing local session anyway");
        }
    }

    (
        jar.remove(state.session_cookie.removal()),
        Redirect::to(&state.config.gate.login_path),
    )
}
