use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub routing: RoutingConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub imaging: ImagingConfig,
    pub storage: StorageConfig,
    pub instagram: InstagramConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

/// Host-to-tenant routing. The root domain set lists hostnames served as the
/// platform itself; everything else resolves to a dealer storefront. The set
/// is read here once and injected into the resolver at startup - request-time
/// code never touches process environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    pub root_domains: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub session_cookie: String,
    pub session_expiry_hours: u64,
    pub enable_cors: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagingConfig {
    pub max_width: u32,
    pub max_height: u32,
    pub jpeg_quality: u8,
    pub max_fotos: usize,
    pub batch_concurrency: usize,
    /// Request body ceiling for multipart photo uploads.
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub root_dir: String,
    pub public_base: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstagramConfig {
    pub graph_api_base: String,
    pub poll_max_attempts: u32,
    pub poll_initial_delay_ms: u64,
    pub poll_max_delay_ms: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Routing overrides
        if let Ok(v) = env::var("ROUTING_ROOT_DOMAINS") {
            self.routing.root_domains = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_SESSION_COOKIE") {
            self.security.session_cookie = v;
        }
        if let Ok(v) = env::var("SECURITY_SESSION_EXPIRY_HOURS") {
            self.security.session_expiry_hours = v.parse().unwrap_or(self.security.session_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }

        // Imaging overrides
        if let Ok(v) = env::var("IMAGING_MAX_WIDTH") {
            self.imaging.max_width = v.parse().unwrap_or(self.imaging.max_width);
        }
        if let Ok(v) = env::var("IMAGING_MAX_HEIGHT") {
            self.imaging.max_height = v.parse().unwrap_or(self.imaging.max_height);
        }
        if let Ok(v) = env::var("IMAGING_JPEG_QUALITY") {
            self.imaging.jpeg_quality = v.parse().unwrap_or(self.imaging.jpeg_quality);
        }
        if let Ok(v) = env::var("IMAGING_MAX_FOTOS") {
            self.imaging.max_fotos = v.parse().unwrap_or(self.imaging.max_fotos);
        }
        if let Ok(v) = env::var("IMAGING_BATCH_CONCURRENCY") {
            self.imaging.batch_concurrency = v.parse().unwrap_or(self.imaging.batch_concurrency);
        }
        if let Ok(v) = env::var("IMAGING_MAX_UPLOAD_BYTES") {
            self.imaging.max_upload_bytes = v.parse().unwrap_or(self.imaging.max_upload_bytes);
        }

        // Storage overrides
        if let Ok(v) = env::var("STORAGE_ROOT_DIR") {
            self.storage.root_dir = v;
        }
        if let Ok(v) = env::var("STORAGE_PUBLIC_BASE") {
            self.storage.public_base = v;
        }

        // Instagram overrides
        if let Ok(v) = env::var("INSTAGRAM_GRAPH_API_BASE") {
            self.instagram.graph_api_base = v;
        }
        if let Ok(v) = env::var("INSTAGRAM_POLL_MAX_ATTEMPTS") {
            self.instagram.poll_max_attempts = v.parse().unwrap_or(self.instagram.poll_max_attempts);
        }
        if let Ok(v) = env::var("INSTAGRAM_POLL_INITIAL_DELAY_MS") {
            self.instagram.poll_initial_delay_ms =
                v.parse().unwrap_or(self.instagram.poll_initial_delay_ms);
        }
        if let Ok(v) = env::var("INSTAGRAM_POLL_MAX_DELAY_MS") {
            self.instagram.poll_max_delay_ms = v.parse().unwrap_or(self.instagram.poll_max_delay_ms);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            routing: RoutingConfig {
                root_domains: vec![
                    "localhost:3000".to_string(),
                    "127.0.0.1:3000".to_string(),
                ],
            },
            database: DatabaseConfig {
                max_connections: 10,
                connection_timeout: 30,
            },
            security: SecurityConfig {
                jwt_secret: "dev-secret-trocar-em-producao".to_string(),
                session_cookie: "vitrine_session".to_string(),
                session_expiry_hours: 24 * 7,
                enable_cors: true,
            },
            imaging: ImagingConfig {
                max_width: 1920,
                max_height: 1440,
                jpeg_quality: 75,
                max_fotos: 8,
                batch_concurrency: 2,
                max_upload_bytes: 50 * 1024 * 1024, // 50MB
            },
            storage: StorageConfig {
                root_dir: "./uploads".to_string(),
                public_base: "/uploads".to_string(),
            },
            instagram: InstagramConfig {
                graph_api_base: "https://graph.facebook.com/v19.0".to_string(),
                poll_max_attempts: 8,
                poll_initial_delay_ms: 1_000,
                poll_max_delay_ms: 10_000,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            routing: RoutingConfig {
                root_domains: vec!["staging.plataforma.com".to_string()],
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                session_cookie: "vitrine_session".to_string(),
                session_expiry_hours: 24,
                enable_cors: true,
            },
            ..Self::development()
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            routing: RoutingConfig {
                root_domains: vec![
                    "plataforma.com".to_string(),
                    "www.plataforma.com".to_string(),
                ],
            },
            database: DatabaseConfig {
                max_connections: 50,
                connection_timeout: 5,
            },
            security: SecurityConfig {
                // Must come from SECURITY_JWT_SECRET; an empty secret rejects
                // every session, so the gate fails closed.
                jwt_secret: String::new(),
                session_cookie: "vitrine_session".to_string(),
                session_expiry_hours: 24,
                enable_cors: false,
            },
            ..Self::development()
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert!(config.routing.root_domains.contains(&"localhost:3000".to_string()));
        assert_eq!(config.imaging.max_width, 1920);
        assert_eq!(config.imaging.max_height, 1440);
        assert_eq!(config.imaging.jpeg_quality, 75);
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(config.security.jwt_secret.is_empty());
        assert!(!config.security.enable_cors);
        assert_eq!(config.database.max_connections, 50);
    }
}
