mod cloud_foundry;

pub use cloud_foundry::parse_port_list;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use crate::error::{BeaconError, Result};

/// Root configuration for beacon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeaconConfig {
    /// Application identity advertised to the registry.
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Info / frontend listener configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Service registry configuration.
    pub registry: RegistryConfig,

    /// OAuth2 client-credentials configuration.
    pub oauth: OAuthConfig,

    /// Shutdown configuration.
    #[serde(default)]
    pub shutdown: ShutdownConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BeaconConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| BeaconError::Config(format!("Failed to read config file: {}", e)))?;

        Self::parse_toml(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse_toml(content: &str) -> Result<Self> {
        // Substitute environment variables
        let content = substitute_env_vars(content);

        toml::from_str(&content)
            .map_err(|e| BeaconError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Build configuration from the Cloud Foundry environment.
    pub fn from_cloud_foundry_env() -> Result<Self> {
        cloud_foundry::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_cloud_foundry_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        cloud_foundry::from_lookup(lookup)
    }

    /// Minimal configuration pointing at the given registry and token URLs.
    pub fn with_endpoints(registry_url: &str, token_url: &str) -> Self {
        Self {
            application: ApplicationConfig::default(),
            server: ServerConfig::default(),
            registry: RegistryConfig {
                url: registry_url.to_string(),
                ..Default::default()
            },
            oauth: OAuthConfig {
                token_url: token_url.to_string(),
                ..Default::default()
            },
            shutdown: ShutdownConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Check the configuration for values the runtime cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.registry.url.trim().is_empty() {
            return Err(BeaconError::Config("registry.url must be set".to_string()));
        }
        if self.oauth.token_url.trim().is_empty() {
            return Err(BeaconError::Config("oauth.token_url must be set".to_string()));
        }
        if self.registry.poll_interval_secs == 0 {
            return Err(BeaconError::Config(
                "registry.poll_interval_secs must be greater than zero".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for port in &self.application.cat_ports {
            if *port == self.server.port {
                return Err(BeaconError::Config(format!(
                    "cat port {} collides with server port",
                    port
                )));
            }
            if !seen.insert(*port) {
                return Err(BeaconError::Config(format!("duplicate cat port {}", port)));
            }
        }

        Ok(())
    }
}

/// Application identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Application name, used as the registry app name.
    #[serde(default = "default_app_name")]
    pub name: String,

    /// Index of this instance among the application's instances.
    #[serde(default)]
    pub instance_index: u32,

    /// IP address advertised to the registry.
    #[serde(default = "default_ip")]
    pub ip: String,

    /// Ports serving cats; one registry instance per port.
    #[serde(default)]
    pub cat_ports: Vec<u16>,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            instance_index: 0,
            ip: default_ip(),
            cat_ports: Vec::new(),
        }
    }
}

fn default_app_name() -> String {
    "beacon".to_string()
}

fn default_ip() -> String {
    "127.0.0.1".to_string()
}

/// Listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind listeners on.
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP port of the info (backend) or proxy (frontend) server.
    #[serde(default = "default_http_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_http_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    8080
}

/// Service registry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Registry base URL.
    pub url: String,

    /// Seconds between registration cycles.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Per-request timeout for registry calls, in seconds.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl RegistryConfig {
    /// Interval between registration cycles.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Per-request timeout, if configured.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            poll_interval_secs: default_poll_interval(),
            request_timeout_secs: None,
        }
    }
}

fn default_poll_interval() -> u64 {
    20 // two missed cycles still fit in the registry lease
}

/// OAuth2 client-credentials configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OAuthConfig {
    /// Token endpoint URL.
    pub token_url: String,

    /// Client ID.
    #[serde(default)]
    pub client_id: String,

    /// Client secret.
    #[serde(default)]
    pub client_secret: String,
}

/// Shutdown configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShutdownConfig {
    /// How long to wait for members to exit after a stop request.
    #[serde(default = "default_drain_timeout")]
    pub drain_timeout_secs: u64,
}

impl ShutdownConfig {
    /// Drain timeout as a duration.
    pub fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.drain_timeout_secs)
    }
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            drain_timeout_secs: default_drain_timeout(),
        }
    }
}

fn default_drain_timeout() -> u64 {
    30
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output JSON format.
    #[serde(default)]
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Substitute environment variables in the format ${VAR_NAME}.
fn substitute_env_vars(content: &str) -> String {
    let mut result = content.to_string();
    let Ok(re) = regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}") else {
        return result;
    };

    for cap in re.captures_iter(content) {
        let var_name = &cap[1];
        if let Ok(value) = std::env::var(var_name) {
            result = result.replace(&cap[0], &value);
        }
    }

    result
}
