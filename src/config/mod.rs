//! Configuration management
//!
//! This module handles loading and parsing configuration for the publishing
//! client. Configuration can be loaded from:
//! - config.yml file
//! - Environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Remote content service configuration
    #[serde(default)]
    pub remote: RemoteConfig,
    /// Local session persistence configuration
    #[serde(default)]
    pub session: SessionConfig,
    /// Read-view cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Authorization variant configuration
    #[serde(default)]
    pub auth: AuthConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            remote: RemoteConfig::default(),
            session: SessionConfig::default(),
            cache: CacheConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

/// Remote content service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the remote content service API
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

fn default_endpoint() -> String {
    "http://localhost:8080/api/v1".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

/// Local session persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Path of the persisted session record
    #[serde(default = "default_session_path")]
    pub path: PathBuf,
    /// Session lifetime in seconds, mirroring the remote session lifetime
    #[serde(default = "default_session_ttl")]
    pub ttl_seconds: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            path: default_session_path(),
            ttl_seconds: default_session_ttl(),
        }
    }
}

fn default_session_path() -> PathBuf {
    PathBuf::from("data/admin_session.json")
}

fn default_session_ttl() -> u64 {
    // 8 hours, matching the remote side's own session lifetime
    8 * 60 * 60
}

/// Read-view cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// TTL for cached single-article views in seconds
    #[serde(default = "default_article_ttl")]
    pub article_ttl_seconds: u64,
    /// TTL for cached listing views in seconds
    #[serde(default = "default_list_ttl")]
    pub list_ttl_seconds: u64,
    /// Maximum number of cached entries per view kind
    #[serde(default = "default_max_entries")]
    pub max_entries: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            article_ttl_seconds: default_article_ttl(),
            list_ttl_seconds: default_list_ttl(),
            max_entries: default_max_entries(),
        }
    }
}

fn default_article_ttl() -> u64 {
    3600
}

fn default_list_ttl() -> u64 {
    600
}

fn default_max_entries() -> u64 {
    10_000
}

/// Authorization variant configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Which capability variant the client presents
    #[serde(default)]
    pub variant: AuthVariant,
    /// Ambient principal for the identity variant (absent = anonymous)
    #[serde(default)]
    pub principal: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            variant: AuthVariant::default(),
            principal: None,
        }
    }
}

/// Capability variant selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AuthVariant {
    /// Bearer token drawn from the local session store (default)
    #[default]
    Token,
    /// Ambient identity authenticated by fronting infrastructure
    Identity,
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },
}

impl Config {
    /// Load configuration from file.
    ///
    /// If the file doesn't exist, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        // Handle empty file - return defaults
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.display().to_string(),
            message: format_yaml_error(&e),
        })?;

        Ok(config)
    }

    /// Load configuration from file with environment variable overrides.
    ///
    /// Environment variables follow the pattern:
    /// - PRESSGATE_REMOTE_ENDPOINT
    /// - PRESSGATE_REMOTE_TIMEOUT_SECONDS
    /// - PRESSGATE_SESSION_PATH
    /// - PRESSGATE_SESSION_TTL_SECONDS
    /// - PRESSGATE_CACHE_ARTICLE_TTL_SECONDS
    /// - PRESSGATE_CACHE_LIST_TTL_SECONDS
    /// - PRESSGATE_CACHE_MAX_ENTRIES
    /// - PRESSGATE_AUTH_VARIANT
    /// - PRESSGATE_AUTH_PRINCIPAL
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) {
        // Remote service configuration
        if let Ok(endpoint) = std::env::var("PRESSGATE_REMOTE_ENDPOINT") {
            self.remote.endpoint = endpoint;
        }
        if let Ok(timeout) = std::env::var("PRESSGATE_REMOTE_TIMEOUT_SECONDS") {
            if let Ok(timeout) = timeout.parse::<u64>() {
                self.remote.timeout_seconds = timeout;
            }
        }

        // Session configuration
        if let Ok(path) = std::env::var("PRESSGATE_SESSION_PATH") {
            self.session.path = PathBuf::from(path);
        }
        if let Ok(ttl) = std::env::var("PRESSGATE_SESSION_TTL_SECONDS") {
            if let Ok(ttl) = ttl.parse::<u64>() {
                self.session.ttl_seconds = ttl;
            }
        }

        // Cache configuration
        if let Ok(ttl) = std::env::var("PRESSGATE_CACHE_ARTICLE_TTL_SECONDS") {
            if let Ok(ttl) = ttl.parse::<u64>() {
                self.cache.article_ttl_seconds = ttl;
            }
        }
        if let Ok(ttl) = std::env::var("PRESSGATE_CACHE_LIST_TTL_SECONDS") {
            if let Ok(ttl) = ttl.parse::<u64>() {
                self.cache.list_ttl_seconds = ttl;
            }
        }
        if let Ok(max) = std::env::var("PRESSGATE_CACHE_MAX_ENTRIES") {
            if let Ok(max) = max.parse::<u64>() {
                self.cache.max_entries = max;
            }
        }

        // Auth configuration
        if let Ok(variant) = std::env::var("PRESSGATE_AUTH_VARIANT") {
            match variant.to_lowercase().as_str() {
                "token" => self.auth.variant = AuthVariant::Token,
                "identity" => self.auth.variant = AuthVariant::Identity,
                _ => {} // Ignore invalid values
            }
        }
        if let Ok(principal) = std::env::var("PRESSGATE_AUTH_PRINCIPAL") {
            self.auth.principal = Some(principal);
        }
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared mutex for all config tests that modify environment variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
