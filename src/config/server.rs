//! Server, auth and collaborator configuration types.

use std::net::SocketAddr;

use serde::Deserialize;

use super::ConfigError;

/// Listener configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to.
    pub host: String,
    /// Port for the identity HTTP service.
    pub identity_port: u16,
    /// Port for the catalog HTTP service.
    pub catalog_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            identity_port: 5000,
            catalog_port: 5001,
        }
    }
}

impl ServerConfig {
    pub fn identity_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.addr(self.identity_port)
    }

    pub fn catalog_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.addr(self.catalog_port)
    }

    fn addr(&self, port: u16) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.host, port);
        addr.parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::Address(addr, e.to_string()))
    }
}

/// Access token configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret for signing access tokens. Required by the identity service.
    pub secret: String,
    /// Access token lifetime in seconds.
    pub token_ttl_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            token_ttl_secs: 900,
        }
    }
}

impl AuthConfig {
    /// The signing secret, or an error if none is configured.
    pub fn signing_secret(&self) -> Result<&str, ConfigError> {
        if self.secret.is_empty() {
            return Err(ConfigError::Missing("auth.secret"));
        }
        Ok(&self.secret)
    }
}

/// Collaborators of the catalog service.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Base URL of the identity service, used by the users proxy.
    pub identity_url: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            identity_url: "http://localhost:5000".to_string(),
        }
    }
}
