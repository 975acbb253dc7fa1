//! Server configuration: TOML file + environment overrides.
//!
//! Precedence, highest first: CLI flags (handled in `main`), environment
//! (`PORT`, `JWT_SECRET`), config file, built-in defaults. Every section is
//! optional — a missing file yields a fully defaulted config.

use crate::auth::DEFAULT_TOKEN_TTL_SECS;
use anyhow::Context;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Fallback signing secret for local development only.
const DEV_JWT_SECRET: &str = "userhub-secret-key-2024";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub gateway: GatewayConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 3000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 signing secret. Overridden by the `JWT_SECRET` env var.
    pub jwt_secret: Option<String>,
    /// Bearer token lifetime in seconds.
    pub token_ttl_secs: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the snapshot file. Defaults to the platform data
    /// dir (e.g. `~/.local/share/userhub`).
    pub data_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration. An explicit path must exist and parse; without
    /// one, the default location is used if present, defaults otherwise.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let Some(default) = Self::default_path() else {
                    return Ok(Self::default());
                };
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };

        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
    }

    fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "userhub").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Directory the snapshot lives in.
    pub fn resolve_data_dir(&self) -> PathBuf {
        if let Some(dir) = &self.storage.data_dir {
            return dir.clone();
        }
        ProjectDirs::from("", "", "userhub")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".userhub"))
    }

    /// Resolve the token signing secret: env, then config, then the dev
    /// fallback (with a loud warning — the fallback is guessable).
    pub fn jwt_secret(&self) -> String {
        if let Ok(secret) = std::env::var("JWT_SECRET") {
            if !secret.is_empty() {
                return secret;
            }
        }
        if let Some(secret) = &self.auth.jwt_secret {
            return secret.clone();
        }
        tracing::warn!("no JWT secret configured; using the built-in development secret");
        DEV_JWT_SECRET.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = Config::default();
        assert_eq!(config.gateway.host, "127.0.0.1");
        assert_eq!(config.gateway.port, 3000);
        assert_eq!(config.auth.token_ttl_secs, 24 * 60 * 60);
        assert!(config.auth.jwt_secret.is_none());
    }

    #[test]
    fn partial_toml_keeps_defaults_for_the_rest() {
        let config: Config = toml::from_str(
            r#"
            [gateway]
            port = 8080

            [auth]
            jwt_secret = "s3cret"
            "#,
        )
        .unwrap();

        assert_eq!(config.gateway.port, 8080);
        assert_eq!(config.gateway.host, "127.0.0.1");
        assert_eq!(config.auth.jwt_secret.as_deref(), Some("s3cret"));
        assert_eq!(config.auth.token_ttl_secs, 24 * 60 * 60);
    }

    #[test]
    fn explicit_data_dir_wins() {
        let config: Config = toml::from_str(
            r#"
            [storage]
            data_dir = "/tmp/userhub-test"
            "#,
        )
        .unwrap();
        assert_eq!(config.resolve_data_dir(), PathBuf::from("/tmp/userhub-test"));
    }
}
