//! Configuration management for bhaav
//!
//! All configurable parameters in one place with environment variable
//! overrides. Sensible defaults, configurable in production.

use std::env;
use std::path::PathBuf;
use tracing::info;

/// CORS configuration
#[derive(Debug, Clone)]
pub struct CorsConfig {
    /// Allowed origins
    pub allowed_origins: Vec<String>,
    /// Allowed HTTP methods (empty = any)
    pub allowed_methods: Vec<String>,
    /// Allowed headers (empty = any)
    pub allowed_headers: Vec<String>,
    /// Whether to allow credentials
    pub allow_credentials: bool,
    /// Max age for preflight cache (seconds)
    pub max_age_seconds: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            // The two local dev frontends this service pairs with
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:3001".to_string(),
            ],
            allowed_methods: Vec::new(),
            allowed_headers: Vec::new(),
            allow_credentials: true,
            max_age_seconds: 86400, // 24 hours
        }
    }
}

impl CorsConfig {
    /// Load from environment variables, keeping the dev-origin defaults when
    /// unset.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(origins) = env::var("BHAAV_CORS_ORIGINS") {
            config.allowed_origins = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Ok(methods) = env::var("BHAAV_CORS_METHODS") {
            config.allowed_methods = methods
                .split(',')
                .map(|s| s.trim().to_uppercase())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Ok(headers) = env::var("BHAAV_CORS_HEADERS") {
            config.allowed_headers = headers
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Ok(val) = env::var("BHAAV_CORS_CREDENTIALS") {
            config.allow_credentials = val.to_lowercase() == "true" || val == "1";
        }

        if let Ok(val) = env::var("BHAAV_CORS_MAX_AGE") {
            if let Ok(n) = val.parse() {
                config.max_age_seconds = n;
            }
        }

        config
    }

    /// Convert to tower-http CorsLayer.
    ///
    /// With credentials enabled, wildcard methods/headers are not allowed by
    /// the CORS spec, so empty method/header lists become mirror-request
    /// instead of `Any`.
    pub fn to_layer(&self) -> tower_http::cors::CorsLayer {
        use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};

        let mut layer = CorsLayer::new();

        let mut valid_origins = Vec::new();
        for origin_str in &self.allowed_origins {
            match origin_str.parse::<axum::http::HeaderValue>() {
                Ok(origin) => valid_origins.push(origin),
                Err(_) => tracing::warn!("CORS: Invalid origin '{}' - skipping", origin_str),
            }
        }

        if valid_origins.is_empty() {
            // All configured origins failed to parse - this is a config
            // error. Do NOT fall back to permissive.
            tracing::error!(
                "CORS: no valid origin configured. Rejecting all cross-origin requests. \
                 Fix BHAAV_CORS_ORIGINS."
            );
            layer = layer.allow_origin(AllowOrigin::list(Vec::<axum::http::HeaderValue>::new()));
        } else {
            layer = layer.allow_origin(AllowOrigin::list(valid_origins));
        }

        let methods: Vec<axum::http::Method> = self
            .allowed_methods
            .iter()
            .filter_map(|m| m.parse().ok())
            .collect();
        if methods.is_empty() {
            if self.allow_credentials {
                layer = layer.allow_methods(AllowMethods::mirror_request());
            } else {
                layer = layer.allow_methods(Any);
            }
        } else {
            layer = layer.allow_methods(methods);
        }

        let headers: Vec<axum::http::HeaderName> = self
            .allowed_headers
            .iter()
            .filter_map(|h| h.parse().ok())
            .collect();
        if headers.is_empty() {
            if self.allow_credentials {
                layer = layer.allow_headers(AllowHeaders::mirror_request());
            } else {
                layer = layer.allow_headers(Any);
            }
        } else {
            layer = layer.allow_headers(headers);
        }

        if self.allow_credentials {
            layer = layer.allow_credentials(true);
        }

        layer.max_age(std::time::Duration::from_secs(self.max_age_seconds))
    }
}

/// Server configuration loaded from environment with defaults
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server host address (default: 127.0.0.1)
    /// Set to 0.0.0.0 for Docker or network-accessible deployments
    pub host: String,

    /// Server port (default: 8000)
    pub port: u16,

    /// Base directory holding <capability>/ model bundles. When unset,
    /// models live in (and are downloaded to) ~/.cache/bhaav/models/
    pub model_dir: Option<PathBuf>,

    /// Disable model auto-download; missing files fail that capability's
    /// load (default: false)
    pub offline: bool,

    /// ONNX intra-op thread count per session (default: 2)
    pub onnx_threads: usize,

    /// Maximum concurrent in-flight requests (default: 64)
    pub max_concurrent_requests: usize,

    /// CORS configuration
    pub cors: CorsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            model_dir: None,
            offline: false,
            onnx_threads: 2,
            max_concurrent_requests: 64,
            cors: CorsConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = env::var("BHAAV_HOST") {
            config.host = val;
        }

        if let Ok(val) = env::var("BHAAV_PORT") {
            if let Ok(port) = val.parse() {
                config.port = port;
            }
        }

        if let Ok(val) = env::var("BHAAV_MODEL_DIR") {
            if !val.is_empty() {
                config.model_dir = Some(PathBuf::from(val));
            }
        }

        if let Ok(val) = env::var("BHAAV_OFFLINE") {
            config.offline = val == "1" || val.to_lowercase() == "true";
        }

        if let Ok(val) = env::var("BHAAV_ONNX_THREADS") {
            if let Ok(n) = val.parse::<usize>() {
                if n > 0 {
                    config.onnx_threads = n;
                }
            }
        }

        if let Ok(val) = env::var("BHAAV_MAX_CONCURRENT") {
            if let Ok(n) = val.parse::<usize>() {
                if n > 0 {
                    config.max_concurrent_requests = n;
                }
            }
        }

        config.cors = CorsConfig::from_env();

        config
    }

    /// Log the effective configuration at startup.
    pub fn log(&self) {
        info!("Configuration:");
        info!("  Bind: {}:{}", self.host, self.port);
        match &self.model_dir {
            Some(dir) => info!("  Model dir: {:?} (operator-managed)", dir),
            None => info!(
                "  Model dir: {:?} (auto-download {})",
                crate::analysis::downloader::get_cache_dir().join("models"),
                if self.offline { "disabled" } else { "enabled" }
            ),
        }
        info!("  ONNX threads: {}", self.onnx_threads);
        info!("  Max concurrent requests: {}", self.max_concurrent_requests);
        info!(
            "  CORS origins: {} (credentials: {})",
            self.cors.allowed_origins.join(", "),
            self.cors.allow_credentials
        );
    }
}
