//! Page placeholders
//!
//! The field forms are rendered client-side; the server only hands out a
//! shell per route so the gate has something to guard.

use axum::{
    Router,
    response::{Html, IntoResponse},
    routing::get,
};

use crate::AppState;
use crate::auth::MaybeUser;
use crate::error::AppError;

/// Create page router
///
/// Routes:
/// - GET / - Home
/// - GET /dashboard, /formulario, /profile, /settings, /admin - App shells
/// - GET /offline - Offline fallback
pub fn pages_router() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/dashboard", get(dashboard))
        .route("/formulario", get(formulario))
        .route("/profile", get(profile))
        .route("/settings", get(settings))
        .route("/admin", get(admin))
        .route("/offline", get(offline))
}

fn render_page(title: &str, body: &str) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html lang="es">
<head><meta charset="utf-8"><meta name="viewport" content="width=device-width, initial-scale=1"><title>{title} - Visitas</title></head>
<body>
    <h1>{title}</h1>
    {body}
</body>
</html>"#,
        title = html_escape::encode_text(title),
    ))
}

async fn home() -> Html<String> {
    render_page(
        "Visitas",
        r#"<p>Registro de visitas de campo.</p><a href="/dashboard">Ir al panel</a>"#,
    )
}

/// GET /dashboard
async fn dashboard(MaybeUser(current): MaybeUser) -> Html<String> {
    let greeting = current
        .and_then(|current| current.user.email)
        .map(|email| format!("<p>Sesión: {}</p>", html_escape::encode_text(&email)))
        .unwrap_or_default();
    render_page(
        "Panel",
        &format!(
            r#"{greeting}<a href="/formulario">Nueva visita</a>
    <form method="post" action="/auth/logout"><button type="submit">Salir</button></form>"#
        ),
    )
}

async fn formulario() -> Html<String> {
    render_page("Nueva visita", r#"<div id="formulario-visita"></div>"#)
}

async fn profile() -> Html<String> {
    render_page("Perfil", r#"<div id="perfil"></div>"#)
}

async fn settings() -> Html<String> {
    render_page("Configuración", r#"<div id="configuracion"></div>"#)
}

async fn admin() -> Html<String> {
    render_page("Administración", r#"<div id="administracion"></div>"#)
}

/// GET /offline
///
/// Served when the device has no connectivity and the service worker falls
/// back to its cached copy; must work without a session.
async fn offline() -> Html<String> {
    render_page(
        "Sin conexión",
        "<p>No hay conexión. Las visitas guardadas se sincronizarán al recuperar la red.</p>",
    )
}

/// Fallback for unknown routes
pub async fn not_found() -> impl IntoResponse {
    AppError::NotFound
}
