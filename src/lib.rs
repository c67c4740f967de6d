//! Visitas - field visit collection service backed by Supabase
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Access Gate (middleware)                   │
//! │  - Session refresh (fail-open)                              │
//! │  - Protected-route redirects                                │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      API Layer (Axum)                        │
//! │  - Visita status / create / list                            │
//! │  - Attachment upload, weather proxy                         │
//! │  - Login/logout, page shells                                │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    External collaborators                    │
//! │  - Supabase Auth / PostgREST / Storage                      │
//! │  - OpenWeatherMap                                           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `gate`: Access gate (route classifier, session refresher, middleware)
//! - `auth`: Identity authority, session cookie, caller extraction, login
//! - `api`: HTTP handlers
//! - `data`: Visita models and PostgREST store
//! - `storage`: Supabase Storage uploads
//! - `weather`: Weather provider client
//! - `config`: Configuration management
//! - `error`: Error types

pub mod api;
pub mod auth;
pub mod config;
pub mod data;
pub mod error;
pub mod gate;
pub mod metrics;
pub mod storage;
pub mod supabase;
pub mod weather;

use std::sync::Arc;

/// Application state shared across all handlers
///
/// Cloned for each request. Holds immutable configuration and the clients
/// for each external collaborator; no per-request state lives here.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Session cookie name and flags
    pub session_cookie: auth::SessionCookieSettings,

    /// Identity authority (Supabase Auth)
    pub authority: Arc<dyn auth::IdentityAuthority>,

    /// Visita persistence (Supabase PostgREST)
    pub visitas: Arc<dyn data::VisitaStore>,

    /// Attachment storage (Supabase Storage)
    pub storage: Arc<dyn storage::BlobStore>,

    /// Weather provider
    pub weather: Arc<dyn weather::WeatherProvider>,
}

impl AppState {
    /// Initialize application state with the production clients
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built
    pub async fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        tracing::info!("Initializing application state...");

        let http_client = reqwest::Client::builder()
            .user_agent(&config.http.user_agent)
            .timeout(std::time::Duration::from_secs(config.http.timeout_seconds))
            .build()
            .map_err(|e| error::AppError::Internal(e.into()))?;

        let api = supabase::SupabaseApi::new(http_client.clone(), &config.supabase);
        let authority = Arc::new(auth::SupabaseAuth::new(api.clone()));
        let visitas = Arc::new(data::PostgrestVisitaStore::new(
            api.clone(),
            config.supabase.visitas_table.clone(),
        ));
        let storage = Arc::new(storage::SupabaseMediaStorage::new(
            api,
            config.supabase.storage_bucket.clone(),
        ));
        let weather = Arc::new(weather::OpenWeatherClient::new(http_client, &config.weather));

        if config.weather.api_key.is_none() {
            tracing::warn!("No weather API key configured; /api/weather will answer 500");
        }

        tracing::info!(
            project_ref = %config.supabase.project_ref(),
            "Application state initialized successfully"
        );

        Ok(Self::with_services(config, authority, visitas, storage, weather))
    }

    /// Assemble state from explicit collaborators
    pub fn with_services(
        config: config::AppConfig,
        authority: Arc<dyn auth::IdentityAuthority>,
        visitas: Arc<dyn data::VisitaStore>,
        storage: Arc<dyn storage::BlobStore>,
        weather: Arc<dyn weather::WeatherProvider>,
    ) -> Self {
        Self {
            session_cookie: auth::SessionCookieSettings::from_config(&config),
            config: Arc::new(config),
            authority,
            visitas,
            storage,
            weather,
        }
    }
}

/// Build the Axum router with all routes.
///
/// This is shared by the binary and integration tests to keep route
/// composition consistent across environments. Every request, including
/// unknown paths, passes through the access gate.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::{Router, middleware};
    use tower_http::{compression::CompressionLayer, trace::TraceLayer};

    let refresher = gate::SessionRefresher::new(
        state.authority.clone(),
        state.session_cookie.clone(),
        state.config.gate.refresh_margin_seconds,
    );
    let access_gate = Arc::new(gate::AccessGate::new(state.config.gate.clone(), refresher));
    let cors_layer = build_cors_layer(&state.config.server);

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .merge(auth::auth_router(&state.config.gate))
        .merge(api::pages_router())
        .nest("/api", api::api_router())
        .merge(api::metrics_router())
        .fallback(api::not_found)
        .layer(middleware::from_fn_with_state(access_gate, gate::access_gate))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
}

fn build_cors_layer(server: &config::ServerConfig) -> tower_http::cors::CorsLayer {
    use axum::http::HeaderValue;
    use tower_http::cors::{Any, CorsLayer};

    if !server.protocol.eq_ignore_ascii_case("https") {
        return CorsLayer::permissive();
    }

    let allowed_origin = server.base_url();
    match HeaderValue::from_str(&allowed_origin) {
        Ok(origin) => CorsLayer::new()
            .allow_origin([origin])
            .allow_methods(Any)
            .allow_headers(Any),
        Err(error) => {
            tracing::error!(
                %error,
                origin = %allowed_origin,
                "Failed to parse CORS origin from server base URL; denying cross-origin requests"
            );
            CorsLayer::new().allow_methods(Any).allow_headers(Any)
        }
    }
}

async fn health_check() -> &'static str {
    "OK"
}
