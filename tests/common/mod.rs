//! Common test utilities for E2E tests
//!
//! The router under test is the production one; only the external
//! collaborators (identity authority, PostgREST, Storage, weather) are
//! replaced by in-memory fakes.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::net::TcpListener;
use visitas::auth::session::encode_session_cookie;
use visitas::auth::{AuthUser, IdentityAuthority, SessionTokens};
use visitas::data::{EstadoUpdate, NewVisita, Visita, VisitaStore};
use visitas::error::AppError;
use visitas::storage::BlobStore;
use visitas::weather::{WeatherProvider, WeatherReport};
use visitas::{AppState, config};

pub const VALID_ACCESS_TOKEN: &str = "valid-access-token";
pub const VALID_REFRESH_TOKEN: &str = "valid-refresh-token";
pub const TEST_USER_ID: &str = "user-123";
pub const TEST_EMAIL: &str = "tecnico@example.com";
pub const TEST_PASSWORD: &str = "correct-horse";
pub const SESSION_COOKIE: &str = "sb-testproject-auth-token";

// =============================================================================
// Fakes
// =============================================================================

/// Identity authority that knows one user
#[derive(Default)]
pub struct FakeAuthority {
    pub fail_refresh: AtomicBool,
    pub fail_get_user: AtomicBool,
    pub get_user_calls: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    pub sign_out_calls: AtomicUsize,
}

impl FakeAuthority {
    pub fn fresh_tokens() -> SessionTokens {
        SessionTokens {
            access_token: VALID_ACCESS_TOKEN.to_string(),
            refresh_token: VALID_REFRESH_TOKEN.to_string(),
            expires_at: chrono::Utc::now().timestamp() + 3600,
        }
    }
}

#[async_trait]
impl IdentityAuthority for FakeAuthority {
    async fn get_user(&self, access_token: &str) -> Result<Option<AuthUser>, AppError> {
        self.get_user_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_get_user.load(Ordering::SeqCst) {
            return Err(AppError::Upstream("auth unavailable".to_string()));
        }
        Ok((access_token == VALID_ACCESS_TOKEN).then(|| AuthUser {
            id: TEST_USER_ID.to_string(),
            email: Some(TEST_EMAIL.to_string()),
        }))
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<SessionTokens, AppError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_refresh.load(Ordering::SeqCst) {
            return Err(AppError::Internal(anyhow::anyhow!("refresh exploded")));
        }
        if refresh_token != VALID_REFRESH_TOKEN {
            return Err(AppError::Upstream("Invalid Refresh Token".to_string()));
        }
        Ok(Self::fresh_tokens())
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<SessionTokens>, AppError> {
        Ok((email == TEST_EMAIL && password == TEST_PASSWORD).then(Self::fresh_tokens))
    }

    async fn sign_out(&self, _access_token: &str) -> Result<(), AppError> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// In-memory visita table
#[derive(Default)]
pub struct FakeVisitaStore {
    pub rows: Mutex<HashMap<String, Visita>>,
    pub fail: AtomicBool,
    pub update_calls: AtomicUsize,
}

impl FakeVisitaStore {
    pub fn seed(&self, id: &str, radicado: &str) {
        let visita = Visita {
            id: id.to_string(),
            user_id: TEST_USER_ID.to_string(),
            radicado_local: radicado.to_string(),
            estado: visitas::data::EstadoVisita::PendienteSincronizacion,
            caracterizacion: serde_json::json!({}),
            fotos: vec![],
            firma: None,
            latitud: None,
            longitud: None,
            observaciones_estado: None,
            created_at: chrono::Utc::now(),
            updated_at: None,
        };
        self.rows.lock().unwrap().insert(id.to_string(), visita);
    }

    pub fn get(&self, id: &str) -> Option<Visita> {
        self.rows.lock().unwrap().get(id).cloned()
    }
}

#[async_trait]
impl VisitaStore for FakeVisitaStore {
    async fn update_estado(&self, _access_token: &str, update: &EstadoUpdate) -> Result<Visita, AppError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Upstream("permission denied for table visitas".to_string()));
        }
        let mut rows = self.rows.lock().unwrap();
        let row = rows.get_mut(&update.visita_id).ok_or(AppError::NotFound)?;
        row.estado = update.estado;
        row.observaciones_estado = update.observaciones.clone();
        row.updated_at = Some(chrono::Utc::now());
        Ok(row.clone())
    }

    async fn insert_visita(&self, _access_token: &str, visita: &NewVisita) -> Result<Visita, AppError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Upstream("insert failed".to_string()));
        }
        let mut rows = self.rows.lock().unwrap();
        let row = Visita {
            id: format!("visita-{}", rows.len() + 1),
            user_id: visita.user_id.clone(),
            radicado_local: visita.radicado_local.clone(),
            estado: visita.estado,
            caracterizacion: visita.caracterizacion.clone(),
            fotos: visita.fotos.clone(),
            firma: visita.firma.clone(),
            latitud: visita.latitud,
            longitud: visita.longitud,
            observaciones_estado: None,
            created_at: chrono::Utc::now(),
            updated_at: None,
        };
        rows.insert(row.id.clone(), row.clone());
        Ok(row)
    }

    async fn list_visitas(&self, _access_token: &str, user_id: &str) -> Result<Vec<Visita>, AppError> {
        let mut visitas: Vec<Visita> = self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|visita| visita.user_id == user_id)
            .cloned()
            .collect();
        visitas.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(visitas)
    }
}

/// Stored object as seen by the fake bucket
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub path: String,
    pub size: usize,
    pub content_type: String,
}

#[derive(Default)]
pub struct FakeBlobStore {
    pub objects: Mutex<Vec<StoredObject>>,
    pub fail: AtomicBool,
}

#[async_trait]
impl BlobStore for FakeBlobStore {
    async fn upload(
        &self,
        _access_token: &str,
        path: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String, AppError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Storage("Bucket not found".to_string()));
        }
        self.objects.lock().unwrap().push(StoredObject {
            path: path.to_string(),
            size: data.len(),
            content_type: content_type.to_string(),
        });
        Ok(format!(
            "https://testproject.supabase.co/storage/v1/object/public/visitas/{path}"
        ))
    }
}

#[derive(Default)]
pub struct FakeWeather {
    pub calls: AtomicUsize,
    pub fail: AtomicBool,
}

#[async_trait]
impl WeatherProvider for FakeWeather {
    async fn current(&self, _lat: f64, _lng: f64) -> Result<WeatherReport, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Upstream("Weather provider request failed (502)".to_string()));
        }
        Ok(WeatherReport {
            temperature: 17.5,
            humidity: 80.0,
            description: "lluvia ligera".to_string(),
            wind_speed: 2.4,
            feels_like: 17.1,
        })
    }
}

/// All collaborators injected into the test server
#[derive(Clone, Default)]
pub struct Fakes {
    pub authority: Arc<FakeAuthority>,
    pub visitas: Arc<FakeVisitaStore>,
    pub storage: Arc<FakeBlobStore>,
    pub weather: Arc<FakeWeather>,
}

// =============================================================================
// Server
// =============================================================================

/// Configuration used by every test server
pub fn test_config() -> config::AppConfig {
    config::AppConfig {
        server: config::ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0, // Let OS assign port
            domain: "localhost".to_string(),
            protocol: "http".to_string(),
        },
        supabase: config::SupabaseConfig {
            url: "https://testproject.supabase.co".to_string(),
            anon_key: "test-anon-key".to_string(),
            project_ref: None,
            storage_bucket: "visitas".to_string(),
            visitas_table: "visitas".to_string(),
        },
        weather: config::WeatherConfig::default(),
        gate: config::GateConfig::default(),
        http: config::HttpConfig::default(),
        logging: config::LoggingConfig::default(),
    }
}

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub fakes: Fakes,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Create a new test server instance
    pub async fn new() -> Self {
        Self::with_fakes(Fakes::default()).await
    }

    pub async fn with_fakes(fakes: Fakes) -> Self {
        let state = AppState::with_services(
            test_config(),
            fakes.authority.clone(),
            fakes.visitas.clone(),
            fakes.storage.clone(),
            fakes.weather.clone(),
        );

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        let app = visitas::build_router(state.clone());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr: addr_str,
            state,
            fakes,
            client,
        }
    }

    /// Get base URL for requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// `Cookie` header value carrying a valid session
    pub fn session_cookie(&self) -> String {
        self.session_cookie_expiring_in(3600)
    }

    /// `Cookie` header value whose access token expires in `seconds`
    pub fn session_cookie_expiring_in(&self, seconds: i64) -> String {
        let tokens = SessionTokens {
            access_token: VALID_ACCESS_TOKEN.to_string(),
            refresh_token: VALID_REFRESH_TOKEN.to_string(),
            expires_at: chrono::Utc::now().timestamp() + seconds,
        };
        format!(
            "{}={}",
            SESSION_COOKIE,
            encode_session_cookie(&tokens).expect("encode session cookie")
        )
    }
}

/// Client that reports redirects instead of following them
pub fn no_redirect_client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .timeout(std::time::Duration::from_secs(10))
        .build()
        .expect("failed to build no-redirect client")
}

/// Value of the `location` header
pub fn location(response: &reqwest::Response) -> String {
    response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .expect("location header")
        .to_string()
}
