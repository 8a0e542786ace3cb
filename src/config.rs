use crate::error::{AppError, AppResult};
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub url: UrlConfig,
    pub geo: GeoConfig,
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    pub url: String,
    pub max_connections: u32,
    pub default_ttl_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UrlConfig {
    pub short_code_length: usize,
    pub base_url: String,
    pub short_code_max_attempts: u32,
    pub cache_enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeoConfig {
    pub enabled: bool,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .map_err(|_| AppError::Configuration("Invalid SERVER_PORT".to_string()))?;

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| AppError::MissingEnvVar("DATABASE_URL".to_string()))?;
        let db_max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .map_err(|_| AppError::Configuration("Invalid DB_MAX_CONNECTIONS".to_string()))?;
        let db_min_connections = env::var("DB_MIN_CONNECTIONS")
            .unwrap_or_else(|_| "1".to_string())
            .parse()
            .map_err(|_| AppError::Configuration("Invalid DB_MIN_CONNECTIONS".to_string()))?;
        let db_acquire_timeout = env::var("DB_ACQUIRE_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .map_err(|_| {
                AppError::Configuration("Invalid DB_ACQUIRE_TIMEOUT_SECONDS".to_string())
            })?;

        let redis_url =
            env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
        let cache_max_connections = env::var("CACHE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .map_err(|_| AppError::Configuration("Invalid CACHE_MAX_CONNECTIONS".to_string()))?;
        let cache_default_ttl = env::var("CACHE_DEFAULT_TTL_SECONDS")
            .unwrap_or_else(|_| "3600".to_string())
            .parse()
            .map_err(|_| {
                AppError::Configuration("Invalid CACHE_DEFAULT_TTL_SECONDS".to_string())
            })?;

        let short_code_length = env::var("SHORT_CODE_LENGTH")
            .unwrap_or_else(|_| "7".to_string())
            .parse()
            .map_err(|_| AppError::Configuration("Invalid SHORT_CODE_LENGTH".to_string()))?;
        let base_url = env::var("BASE_URL")
            .unwrap_or_else(|_| format!("http://{}:{}", server_host, server_port));
        let short_code_max_attempts = env::var("SHORT_CODE_MAX_ATTEMPTS")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .map_err(|_| AppError::Configuration("Invalid SHORT_CODE_MAX_ATTEMPTS".to_string()))?;
        let cache_enabled = env::var("CACHE_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .map_err(|_| AppError::Configuration("Invalid CACHE_ENABLED".to_string()))?;

        // Geo lookup config
        let geo_enabled = env::var("GEO_LOOKUP_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .map_err(|_| AppError::Configuration("Invalid GEO_LOOKUP_ENABLED".to_string()))?;
        let geo_timeout_seconds = env::var("GEO_LOOKUP_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| "3".to_string())
            .parse()
            .map_err(|_| {
                AppError::Configuration("Invalid GEO_LOOKUP_TIMEOUT_SECONDS".to_string())
            })?;

        // CORS config
        let allowed_origins_str = env::var("ALLOWED_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let allowed_origins: Vec<String> = if allowed_origins_str == "*" {
            vec!["*".to_string()]
        } else {
            allowed_origins_str
                .split(',')
                .map(|s| s.trim().to_string())
                .collect()
        };

        let config = Config {
            server: ServerConfig {
                host: server_host,
                port: server_port,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: db_max_connections,
                min_connections: db_min_connections,
                acquire_timeout_seconds: db_acquire_timeout,
            },
            cache: CacheConfig {
                url: redis_url,
                max_connections: cache_max_connections,
                default_ttl_seconds: cache_default_ttl,
            },
            url: UrlConfig {
                short_code_length,
                base_url,
                short_code_max_attempts,
                cache_enabled,
            },
            geo: GeoConfig {
                enabled: geo_enabled,
                timeout_seconds: geo_timeout_seconds,
            },
            cors: CorsConfig { allowed_origins },
        };

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> AppResult<()> {
        // Validate database settings
        if self.database.min_connections > self.database.max_connections {
            return Err(AppError::Configuration(
                "DB_MIN_CONNECTIONS cannot be greater than DB_MAX_CONNECTIONS".to_string(),
            ));
        }

        if self.database.acquire_timeout_seconds == 0 {
            return Err(AppError::Configuration(
                "DB_ACQUIRE_TIMEOUT_SECONDS must be greater than 0".to_string(),
            ));
        }

        // Validate URL settings
        if self.url.short_code_length < 4 || self.url.short_code_length > 16 {
            return Err(AppError::Configuration(
                "SHORT_CODE_LENGTH must be between 4 and 16".to_string(),
            ));
        }

        if self.url.short_code_max_attempts < 1 || self.url.short_code_max_attempts > 100 {
            return Err(AppError::Configuration(
                "SHORT_CODE_MAX_ATTEMPTS must be between 1 and 100".to_string(),
            ));
        }

        // Validate geo settings
        if self.geo.timeout_seconds == 0 {
            return Err(AppError::Configuration(
                "GEO_LOOKUP_TIMEOUT_SECONDS must be greater than 0".to_string(),
            ));
        }

        // Validate cache settings
        if self.cache.default_ttl_seconds == 0 {
            return Err(AppError::Configuration(
                "CACHE_DEFAULT_TTL_SECONDS must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/test".to_string(),
                max_connections: 10,
                min_connections: 1,
                acquire_timeout_seconds: 30,
            },
            cache: CacheConfig {
                url: "redis://127.0.0.1".to_string(),
                max_connections: 10,
                default_ttl_seconds: 3600,
            },
            url: UrlConfig {
                short_code_length: 7,
                base_url: "http://localhost:3000".to_string(),
                short_code_max_attempts: 5,
                cache_enabled: true,
            },
            geo: GeoConfig {
                enabled: true,
                timeout_seconds: 3,
            },
            cors: CorsConfig {
                allowed_origins: vec!["*".to_string()],
            },
        };

        assert!(config.validate().is_ok());
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.url.short_code_length, 7);
    }

    #[test]
    fn test_config_rejects_bad_code_length() {
        let mut config = Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/test".to_string(),
                max_connections: 10,
                min_connections: 1,
                acquire_timeout_seconds: 30,
            },
            cache: CacheConfig {
                url: "redis://127.0.0.1".to_string(),
                max_connections: 10,
                default_ttl_seconds: 3600,
            },
            url: UrlConfig {
                short_code_length: 2,
                base_url: "http://localhost:3000".to_string(),
                short_code_max_attempts: 5,
                cache_enabled: true,
            },
            geo: GeoConfig {
                enabled: true,
                timeout_seconds: 3,
            },
            cors: CorsConfig {
                allowed_origins: vec!["*".to_string()],
            },
        };

        assert!(config.validate().is_err());

        config.url.short_code_length = 7;
        config.database.min_connections = 20;
        assert!(config.validate().is_err());
    }
}
