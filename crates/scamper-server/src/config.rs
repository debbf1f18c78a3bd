// ABOUTME: Configuration loading and validation for the scamper server.
// ABOUTME: Reads environment variables and refuses unsafe remote exposure.

use std::net::SocketAddr;
use std::path::PathBuf;

use scamper_agent::research::DEFAULT_MAX_SUBTOPICS;
use scamper_agent::{ResearchSettings, WalletConfig};
use thiserror::Error;

const DEFAULT_BIND: &str = "127.0.0.1:8000";
const DEFAULT_USERNAME: &str = "admin";
const DEFAULT_PASSWORD: &str = "password";
const MAX_RESEARCH_SUBTOPICS: usize = 5;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("SCAMPER_BIND is not a valid socket address: {0}")]
    InvalidBind(String),

    #[error("{bind} is not a loopback address; set SCAMPER_ALLOW_REMOTE=true to listen on it")]
    RemoteNotAllowed { bind: SocketAddr },

    #[error("SCAMPER_ALLOW_REMOTE is true but authentication is disabled; refusing to start")]
    RemoteWithoutAuth,

    #[error(
        "SCAMPER_ALLOW_REMOTE is true but USERNAME/PASSWORD are the built-in defaults; set real credentials"
    )]
    RemoteWithDefaultCredentials,

    #[error("RESEARCH_MAX_SUBTOPICS must be between 1 and {MAX_RESEARCH_SUBTOPICS}, got {0}")]
    InvalidMaxSubtopics(String),
}

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ScamperConfig {
    pub bind: SocketAddr,
    pub allow_remote: bool,
    pub auth_enabled: bool,
    pub username: String,
    pub password: String,
    pub wallet_data_file: PathBuf,
    pub network_id: String,
    pub rpc_url: String,
    pub wallet_address: Option<String>,
    pub research_max_subtopics: usize,
}

impl ScamperConfig {
    /// Load configuration from environment variables with sensible defaults.
    ///
    /// Environment variables:
    /// - SCAMPER_BIND: socket address to bind (default: 127.0.0.1:8000)
    /// - SCAMPER_ALLOW_REMOTE: allow non-loopback binds (default: false)
    /// - SCAMPER_AUTH: require basic auth (default: true)
    /// - USERNAME / PASSWORD: basic auth credentials (default: admin / password)
    /// - WALLET_DATA_FILE: credential blob path (default: wallet_data.txt)
    /// - NETWORK_ID: chain identifier for a fresh wallet (default: base-sepolia)
    /// - SCAMPER_RPC_URL: JSON-RPC endpoint (default: https://sepolia.base.org)
    /// - WALLET_ADDRESS: address to watch when the blob carries none (optional)
    /// - RESEARCH_MAX_SUBTOPICS: research loop bound, 1..=5 (default: 2)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let bind_str = var("SCAMPER_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind: SocketAddr = bind_str
            .parse()
            .map_err(|_| ConfigError::InvalidBind(bind_str))?;

        let allow_remote = var("SCAMPER_ALLOW_REMOTE").is_some_and(|v| is_truthy(&v));
        let auth_enabled = var("SCAMPER_AUTH").is_none_or(|v| is_truthy(&v));

        let research_max_subtopics = match var("RESEARCH_MAX_SUBTOPICS") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) if (1..=MAX_RESEARCH_SUBTOPICS).contains(&n) => n,
                _ => return Err(ConfigError::InvalidMaxSubtopics(raw)),
            },
            None => DEFAULT_MAX_SUBTOPICS,
        };

        let wallet_defaults = WalletConfig::default();

        let config = Self {
            bind,
            allow_remote,
            auth_enabled,
            username: var("USERNAME").unwrap_or_else(|| DEFAULT_USERNAME.to_string()),
            password: var("PASSWORD").unwrap_or_else(|| DEFAULT_PASSWORD.to_string()),
            wallet_data_file: var("WALLET_DATA_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("wallet_data.txt")),
            network_id: var("NETWORK_ID").unwrap_or(wallet_defaults.network_id),
            rpc_url: var("SCAMPER_RPC_URL").unwrap_or(wallet_defaults.rpc_url),
            wallet_address: var("WALLET_ADDRESS"),
            research_max_subtopics,
        };

        config.validate()?;
        Ok(config)
    }

    /// Check the security constraints. Call again after applying overrides.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bind.ip().is_loopback() {
            return Ok(());
        }

        if !self.allow_remote {
            return Err(ConfigError::RemoteNotAllowed { bind: self.bind });
        }
        if !self.auth_enabled {
            return Err(ConfigError::RemoteWithoutAuth);
        }
        if self.uses_default_credentials() {
            return Err(ConfigError::RemoteWithDefaultCredentials);
        }
        Ok(())
    }

    /// True when either basic-auth credential is still the built-in fallback.
    pub fn uses_default_credentials(&self) -> bool {
        self.username == DEFAULT_USERNAME || self.password == DEFAULT_PASSWORD
    }

    pub fn wallet_config(&self) -> WalletConfig {
        WalletConfig {
            rpc_url: self.rpc_url.clone(),
            network_id: self.network_id.clone(),
            address: self.wallet_address.clone(),
        }
    }

    pub fn research_settings(&self) -> ResearchSettings {
        ResearchSettings {
            max_subtopics: self.research_max_subtopics,
        }
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}
