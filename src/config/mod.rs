mod api;
mod defaults;
mod server;
mod validation;

use crate::cli::Args;
use crate::models::GenerationDefaults;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use api::ApiConfig;
pub use defaults::{API_KEY_ENV, DEFAULT_API_ENDPOINT, DEFAULT_BIND};
pub use server::ServerConfig;
pub use validation::{expand_env_var_in_string, normalize_endpoint};

/// Resolved runtime configuration, handed to the relay at construction.
#[derive(Debug, Clone)]
pub struct Config {
    /// Upstream credential. Its absence fails each request, not startup.
    pub api_key: Option<String>,
    pub api_endpoint: String,
    pub bind: SocketAddr,
    pub request_timeout: Duration,
    pub stream_idle_timeout: Duration,
    pub max_body_bytes: usize,
    pub verbose: bool,
    pub defaults: GenerationDefaults,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            api_endpoint: DEFAULT_API_ENDPOINT.to_string(),
            bind: SocketAddr::from(([127, 0, 0, 1], 3000)),
            request_timeout: Duration::from_secs(defaults::default_request_timeout_secs()),
            stream_idle_timeout: Duration::from_secs(defaults::default_stream_timeout_secs()),
            max_body_bytes: defaults::default_max_body_bytes(),
            verbose: false,
            defaults: GenerationDefaults::default(),
        }
    }
}

/// On-disk configuration (YAML, or JSON for `.json` files).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FileConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub defaults: GenerationDefaults,
}

impl Config {
    pub fn from_env_and_args(args: &Args) -> Result<Self> {
        let file_config = match &args.config {
            Some(path) => FileConfig::load_from(path)?,
            None => FileConfig::load()?,
        };
        Self::resolve(args, file_config, |name| env::var(name).ok())
    }

    /// Merge CLI args > environment > config file > defaults.
    pub fn resolve(
        args: &Args,
        file_config: FileConfig,
        env_lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let api_key = env_lookup(API_KEY_ENV)
            .or_else(|| {
                file_config
                    .api
                    .key
                    .as_deref()
                    .map(|key| expand_env_var_in_string(key, &env_lookup))
            })
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty() && !key.starts_with("${"));

        let api_endpoint = args
            .api_endpoint
            .clone()
            .or_else(|| env_lookup("RELAY_API_ENDPOINT"))
            .or(file_config.api.endpoint.clone())
            .map(|endpoint| normalize_endpoint(&endpoint))
            .unwrap_or_else(|| DEFAULT_API_ENDPOINT.to_string());

        let bind_str = args
            .bind
            .clone()
            .or_else(|| env_lookup("RELAY_BIND"))
            .or(file_config.server.bind.clone())
            .unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind: SocketAddr = bind_str
            .parse()
            .with_context(|| format!("Invalid bind address: {}", bind_str))?;

        let request_timeout = env_lookup("RELAY_REQUEST_TIMEOUT")
            .and_then(|s| s.parse::<u64>().ok())
            .or(file_config.api.request_timeout)
            .unwrap_or_else(defaults::default_request_timeout_secs);

        let stream_timeout = env_lookup("RELAY_STREAM_TIMEOUT")
            .and_then(|s| s.parse::<u64>().ok())
            .or(file_config.api.stream_timeout)
            .unwrap_or_else(defaults::default_stream_timeout_secs);

        let verbose = args.verbose
            || env_lookup("RELAY_VERBOSE")
                .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
                .or(file_config.server.verbose)
                .unwrap_or(false);

        let max_body_bytes = file_config
            .server
            .max_body_bytes
            .unwrap_or_else(defaults::default_max_body_bytes);

        Ok(Config {
            api_key,
            api_endpoint,
            bind,
            request_timeout: Duration::from_secs(request_timeout),
            stream_idle_timeout: Duration::from_secs(stream_timeout),
            max_body_bytes,
            verbose,
            defaults: file_config.defaults,
        })
    }
}

impl FileConfig {
    /// Load the first config file found on the default search path.
    pub fn load() -> Result<Self> {
        for path in Self::get_config_paths() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }

        Ok(FileConfig::default())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config = if path.extension().and_then(|s| s.to_str()) == Some("json") {
            serde_json::from_str(&contents).with_context(|| {
                format!("Failed to parse JSON config file: {}", path.display())
            })?
        } else {
            serde_yaml::from_str(&contents).with_context(|| {
                format!("Failed to parse YAML config file: {}", path.display())
            })?
        };

        Ok(config)
    }

    pub fn get_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from(".cod-relay.yaml"),
            PathBuf::from(".cod-relay.yml"),
            PathBuf::from(".cod-relay.json"),
        ];

        if let Some(home_dir) = dirs::home_dir() {
            let config_dir = home_dir.join(".config").join("cod-relay");
            paths.push(config_dir.join("cod-relay.yaml"));
            paths.push(config_dir.join("cod-relay.yml"));
            paths.push(config_dir.join("cod-relay.json"));
        }

        paths
    }
}
