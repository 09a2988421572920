use serde::{Deserialize, Serialize};
use std::env;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub pagination: PaginationConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    pub posts_per_page: usize,
}

/// Identity provider boundary. The fronting proxy authenticates the user and
/// forwards the username in `user_header`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub login_url: String,
    pub user_header: String,
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        let config = Self {
            database: DatabaseConfig {
                url: env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "sqlite:data/yatube.db".to_string()),
                max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 5)?,
            },
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_var("SERVER_PORT", 8000)?,
            },
            pagination: PaginationConfig {
                posts_per_page: parse_var("POSTS_PER_PAGE", 10)?,
            },
            auth: AuthConfig {
                login_url: env::var("LOGIN_URL").unwrap_or_else(|_| "/auth/login/".to_string()),
                user_header: env::var("AUTH_USER_HEADER")
                    .unwrap_or_else(|_| "x-authenticated-user".to_string())
                    .to_ascii_lowercase(),
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// In-memory database, default page size. Used by the test suites.
    pub fn for_tests() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite::memory:".to_string(),
                max_connections: 1,
            },
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            pagination: PaginationConfig { posts_per_page: 10 },
            auth: AuthConfig {
                login_url: "/auth/login/".to_string(),
                user_header: "x-authenticated-user".to_string(),
            },
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.pagination.posts_per_page == 0 {
            return Err(AppError::Configuration(
                "POSTS_PER_PAGE must be a positive integer".to_string(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(AppError::Configuration(
                "DATABASE_MAX_CONNECTIONS must be a positive integer".to_string(),
            ));
        }
        if !self.auth.login_url.starts_with('/') && !self.auth.login_url.starts_with("http") {
            return Err(AppError::Configuration(format!(
                "LOGIN_URL must be a path or an absolute URL, got {}",
                self.auth.login_url
            )));
        }
        Ok(())
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> AppResult<T> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| {
            AppError::Configuration(format!("{} has an invalid value: {:?}", name, raw))
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_rejects_zero_page_size() {
        let mut config = Config::for_tests();
        config.pagination.posts_per_page = 0;
        assert!(matches!(config.validate(), Err(AppError::Configuration(_))));
    }

    #[test]
    fn test_config_rejects_relative_login_url() {
        let mut config = Config::for_tests();
        config.auth.login_url = "auth/login".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_test_config_is_valid() {
        let config = Config::for_tests();
        assert!(config.validate().is_ok());
        assert_eq!(config.server_address(), "127.0.0.1:0");
    }

    #[test]
    fn test_parse_var_falls_back_to_default() {
        let value: usize = parse_var("YATUBE_TEST_UNSET_VARIABLE", 42).unwrap();
        assert_eq!(value, 42);
    }
}
