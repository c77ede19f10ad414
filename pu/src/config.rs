//! pipeupdater configuration types and loading
//!
//! Values are layered, later layers winning: config file, then environment
//! (the variable names a CI workflow already exports), then CLI flags. The
//! merged [`Config`] is resolved once into a [`ResolvedConfig`] that the
//! rest of the crate receives by parameter.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use eyre::{Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::rewrite::ImageRef;

pub const ENV_IMAGE_REPOSITORY: &str = "DOCKER_IMAGE_NAME";
pub const ENV_IMAGE_REVISION: &str = "GITHUB_SHA";
pub const ENV_CLUSTER_URL: &str = "PACHYDERM_CLUSTER_URL";
pub const ENV_CLUSTER_TOKEN: &str = "PACHYDERM_TOKEN";
pub const ENV_PIPELINE_FILES: &str = "PACHYDERM_PIPELINE_FILES";

/// Port used when the cluster URL names neither a port nor a well-known scheme
pub const DEFAULT_CLUSTER_PORT: u16 = 80;

/// Errors for missing or malformed configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Missing required setting '{key}' (set {env} or {flag})")]
    Missing {
        key: &'static str,
        env: &'static str,
        flag: &'static str,
    },

    #[error("Invalid cluster URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Main pipeupdater configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// Image written into every pipeline transform
    pub image: ImageConfig,

    /// Cluster connection
    pub cluster: ClusterConfig,

    /// Spec files, directories or glob patterns
    pub pipelines: Vec<String>,
}

/// Image repository and revision
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    pub repository: Option<String>,
    pub revision: Option<String>,
}

/// Cluster connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Cluster URL, e.g. `grpcs://pachd.example.com:30650`
    pub url: Option<String>,

    /// Auth token sent with every request
    pub token: Option<String>,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            url: None,
            token: None,
            timeout_ms: 60_000,
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .pipeupdater.yml
        let local_config = PathBuf::from(".pipeupdater.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/pipeupdater/pipeupdater.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("pipeupdater").join("pipeupdater.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is initialised
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let path = config_path.cloned().unwrap_or_else(|| PathBuf::from(".pipeupdater.yml"));
        let content = fs::read_to_string(path).ok()?;
        serde_yaml::from_str::<Config>(&content).ok()?.log_level
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Overlay values from the process environment
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Overlay values from an environment lookup; empty values are ignored
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(repository) = get(ENV_IMAGE_REPOSITORY) {
            debug!(%repository, "apply_env_from: image repository");
            self.image.repository = Some(repository);
        }
        if let Some(revision) = get(ENV_IMAGE_REVISION) {
            debug!(%revision, "apply_env_from: image revision");
            self.image.revision = Some(revision);
        }
        if let Some(url) = get(ENV_CLUSTER_URL) {
            debug!(%url, "apply_env_from: cluster url");
            self.cluster.url = Some(url);
        }
        if let Some(token) = get(ENV_CLUSTER_TOKEN) {
            debug!("apply_env_from: cluster token set");
            self.cluster.token = Some(token);
        }
        if let Some(files) = get(ENV_PIPELINE_FILES) {
            self.pipelines = files.split_whitespace().map(str::to_string).collect();
            debug!(pipelines = ?self.pipelines, "apply_env_from: pipeline files");
        }
    }

    /// Spec paths to collect
    pub fn pipeline_paths(&self) -> Result<&[String], ConfigError> {
        if self.pipelines.is_empty() {
            return Err(ConfigError::Missing {
                key: "pipelines",
                env: ENV_PIPELINE_FILES,
                flag: "positional PATHS",
            });
        }
        Ok(&self.pipelines)
    }

    /// Image reference if both halves are configured
    pub fn image_ref(&self) -> Option<ImageRef> {
        match (&self.image.repository, &self.image.revision) {
            (Some(repository), Some(revision)) => Some(ImageRef::new(repository, revision)),
            _ => None,
        }
    }

    fn require_image(&self) -> Result<ImageRef, ConfigError> {
        let repository = self.image.repository.as_ref().ok_or(ConfigError::Missing {
            key: "image.repository",
            env: ENV_IMAGE_REPOSITORY,
            flag: "--repository",
        })?;
        let revision = self.image.revision.as_ref().ok_or(ConfigError::Missing {
            key: "image.revision",
            env: ENV_IMAGE_REVISION,
            flag: "--revision",
        })?;
        Ok(ImageRef::new(repository, revision))
    }

    /// Validate and resolve everything an apply run needs
    pub fn resolve(&self) -> Result<ResolvedConfig, ConfigError> {
        debug!("Config::resolve: called");
        let pipelines = self.pipeline_paths()?.to_vec();
        let image = self.require_image()?;

        let url = self.cluster.url.as_deref().ok_or(ConfigError::Missing {
            key: "cluster.url",
            env: ENV_CLUSTER_URL,
            flag: "--cluster-url",
        })?;
        let endpoint = Endpoint::parse(url)?;

        Ok(ResolvedConfig {
            pipelines,
            image,
            cluster: ClusterSettings {
                endpoint,
                token: self.cluster.token.clone(),
                timeout: Duration::from_millis(self.cluster.timeout_ms),
            },
        })
    }
}

/// Cluster address derived from the configured URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    pub tls: bool,
}

impl Endpoint {
    /// Parse a cluster URL
    ///
    /// TLS is on for `https` and `grpcs`. A missing port falls back to the
    /// scheme's well-known port, or 80 when the scheme has none.
    pub fn parse(url: &str) -> Result<Self, ConfigError> {
        debug!(%url, "Endpoint::parse: called");
        let parsed = Url::parse(url).map_err(|e| ConfigError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let host = parsed
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| ConfigError::InvalidUrl {
                url: url.to_string(),
                reason: "no host".to_string(),
            })?
            .to_string();

        let port = parsed.port_or_known_default().unwrap_or(DEFAULT_CLUSTER_PORT);
        let tls = matches!(parsed.scheme(), "https" | "grpcs");

        Ok(Self { host, port, tls })
    }

    /// HTTP base URL for API requests
    pub fn base_url(&self) -> String {
        let scheme = if self.tls { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base_url())
    }
}

/// Cluster settings after validation
#[derive(Clone)]
pub struct ClusterSettings {
    pub endpoint: Endpoint,
    pub token: Option<String>,
    pub timeout: Duration,
}

impl fmt::Debug for ClusterSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterSettings")
            .field("endpoint", &self.endpoint)
            .field("token", &self.token.as_ref().map(|_| "[redacted]"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Fully validated configuration for one apply run
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub pipelines: Vec<String>,
    pub image: ImageRef,
    pub cluster: ClusterSettings,
}
