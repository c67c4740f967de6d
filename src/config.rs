//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration files (config/default.toml, config/local.toml)
//! 3. Environment variables (override)

use serde::Deserialize;
use std::net::IpAddr;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub supabase: SupabaseConfig,
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub gate: GateConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Port number (e.g., 8080)
    pub port: u16,
    /// Public domain (e.g., "visitas.example.com")
    pub domain: String,
    /// Protocol ("http" or "https")
    pub protocol: String,
}

impl ServerConfig {
    /// Get the base URL for the instance
    ///
    /// # Returns
    /// Full URL like "https://visitas.example.com"
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.protocol, self.domain)
    }
}

/// Supabase project configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SupabaseConfig {
    /// Project URL (e.g., "https://abcd1234.supabase.co")
    pub url: String,
    /// Public anon key, sent as `apikey` on every request
    pub anon_key: String,
    /// Project reference used in the session cookie name.
    ///
    /// Derived from the first label of the project URL host when unset.
    pub project_ref: Option<String>,
    /// Storage bucket holding photos and signatures
    #[serde(default = "default_storage_bucket")]
    pub storage_bucket: String,
    /// Table holding visita rows
    #[serde(default = "default_visitas_table")]
    pub visitas_table: String,
}

fn default_storage_bucket() -> String {
    "visitas".to_string()
}

fn default_visitas_table() -> String {
    "visitas".to_string()
}

impl SupabaseConfig {
    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    /// Resolve the project reference
    pub fn project_ref(&self) -> String {
        if let Some(project_ref) = self
            .project_ref
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
        {
            return project_ref.to_string();
        }

        url::Url::parse(self.base_url())
            .ok()
            .and_then(|url| url.host_str().map(ToOwned::to_owned))
            .and_then(|host| host.split('.').next().map(ToOwned::to_owned))
            .unwrap_or_else(|| "local".to_string())
    }
}

/// Weather provider configuration (OpenWeatherMap)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Provider API key; the weather proxy answers 500 without one
    pub api_key: Option<String>,
    /// Provider base URL
    pub base_url: String,
    /// Unit system ("metric", "imperial", "standard")
    pub units: String,
    /// Language for descriptions
    pub lang: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openweathermap.org".to_string(),
            units: "metric".to_string(),
            lang: "es".to_string(),
        }
    }
}

/// Access gate routing configuration
///
/// Passed into the gate at construction; never read from globals.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Paths requiring a session, matched exactly or as `prefix/...`
    pub protected_prefixes: Vec<String>,
    /// Canonical login page
    pub login_path: String,
    /// Other paths serving the login page
    pub login_aliases: Vec<String>,
    /// Where authenticated users land when they open the login page
    pub landing_path: String,
    /// Query parameter carrying the post-login return path
    pub redirect_param: String,
    /// Substring identifying session cookies by name
    pub session_cookie_marker: String,
    /// Refresh the access token when it expires within this many seconds
    pub refresh_margin_seconds: i64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            protected_prefixes: ["/admin", "/dashboard", "/formulario", "/profile", "/settings"]
                .into_iter()
                .map(ToOwned::to_owned)
                .collect(),
            login_path: "/auth/login".to_string(),
            login_aliases: vec!["/login".to_string()],
            landing_path: "/dashboard".to_string(),
            redirect_param: "redirectTo".to_string(),
            session_cookie_marker: "auth-token".to_string(),
            refresh_margin_seconds: 60,
        }
    }
}

/// Outbound HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout for upstream calls
    pub timeout_seconds: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            user_agent: "Visitas/0.1.0".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub fn filter_directive(&self) -> String {
        format!("visitas={},tower_http=debug", self.level.trim())
    }

    pub fn is_json(&self) -> bool {
        self.format.trim().eq_ignore_ascii_case("json")
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (VISITAS__*)
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        Self::load_from(
            Config::builder()
                .add_source(File::with_name("config/default").required(false))
                .add_source(File::with_name("config/local").required(false))
                .add_source(
                    Environment::with_prefix("VISITAS")
                        .separator("__")
                        .try_parsing(true),
                ),
        )
    }

    /// Apply built-in defaults under `sources`, then deserialize and validate
    fn load_from(
        sources: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, crate::error::AppError> {
        let config = sources
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.domain", "localhost")?
            .set_default("server.protocol", "http")?
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    pub fn should_use_secure_cookies(&self) -> bool {
        self.server.protocol.eq_ignore_ascii_case("https")
            || !is_local_server_domain(&self.server.domain)
    }

    /// Name of the cookie holding the Supabase session
    pub fn session_cookie_name(&self) -> String {
        format!("sb-{}-auth-token", self.supabase.project_ref())
    }

    pub(crate) fn validate(&self) -> Result<(), crate::error::AppError> {
        use crate::error::AppError;

        if url::Url::parse(self.supabase.base_url()).is_err() {
            return Err(AppError::Config(
                "supabase.url must be an absolute URL".to_string(),
            ));
        }

        if self.supabase.anon_key.trim().is_empty() {
            return Err(AppError::Config(
                "supabase.anon_key must not be empty".to_string(),
            ));
        }

        for prefix in &self.gate.protected_prefixes {
            if !prefix.starts_with('/') || prefix.trim_end_matches('/').is_empty() {
                return Err(AppError::Config(format!(
                    "gate.protected_prefixes entry {prefix:?} must be an absolute path other than /"
                )));
            }
        }

        for path in std::iter::once(&self.gate.login_path)
            .chain(self.gate.login_aliases.iter())
            .chain(std::iter::once(&self.gate.landing_path))
        {
            if !path.starts_with('/') {
                return Err(AppError::Config(format!(
                    "gate path {path:?} must start with /"
                )));
            }
        }

        if self.gate.session_cookie_marker.is_empty()
            || !self
                .session_cookie_name()
                .contains(&self.gate.session_cookie_marker)
        {
            return Err(AppError::Config(
                "gate.session_cookie_marker must be a non-empty part of the session cookie name"
                    .to_string(),
            ));
        }

        if self.should_use_secure_cookies() && !self.server.protocol.eq_ignore_ascii_case("https") {
            return Err(AppError::Config(
                "server.protocol must be https for non-local server domains".to_string(),
            ));
        }

        Ok(())
    }
}

fn normalized_server_host(domain: &str) -> String {
    let trimmed = domain.trim();
    let parsed_host = url::Url::parse(&format!("http://{trimmed}"))
        .ok()
        .and_then(|url| url.host_str().map(|host| host.to_string()));
    let host = parsed_host.unwrap_or_else(|| trimmed.to_string());
    host.trim_end_matches('.').to_ascii_lowercase()
}

fn is_local_server_domain(domain: &str) -> bool {
    let host = normalized_server_host(domain);
    if host == "localhost" || host.ends_with(".localhost") {
        return true;
    }

    if let Ok(ip) = host.parse::<IpAddr>() {
        return ip.is_loopback() || ip.is_unspecified();
    }

    false
}
