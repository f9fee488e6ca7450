use serde::Deserialize;

use super::{
    ApplicationConfig, BeaconConfig, LoggingConfig, OAuthConfig, RegistryConfig, ServerConfig,
    ShutdownConfig,
};
use crate::error::{BeaconError, Result};

#[derive(Debug, Deserialize)]
struct VcapServices {
    #[serde(rename = "p-service-registry", default)]
    service_registry: Vec<ServiceBinding>,
}

#[derive(Debug, Deserialize)]
struct ServiceBinding {
    credentials: RegistryCredentials,
}

#[derive(Debug, Deserialize)]
struct RegistryCredentials {
    uri: String,
    client_id: String,
    client_secret: String,
    access_token_uri: String,
}

#[derive(Debug, Deserialize)]
struct VcapApplication {
    application_name: String,
    #[serde(default)]
    instance_index: u32,
}

/// Build configuration from Cloud Foundry variables.
pub(super) fn from_lookup<F>(lookup: F) -> Result<BeaconConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let required = |name: &str| {
        lookup(name)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| BeaconError::Config(format!("missing required env var {}", name)))
    };

    let services: VcapServices = serde_json::from_str(&required("VCAP_SERVICES")?)
        .map_err(|e| BeaconError::Config(format!("invalid VCAP_SERVICES: {}", e)))?;
    let application: VcapApplication = serde_json::from_str(&required("VCAP_APPLICATION")?)
        .map_err(|e| BeaconError::Config(format!("invalid VCAP_APPLICATION: {}", e)))?;
    let ip = required("CF_INSTANCE_INTERNAL_IP")?;

    let port = required("PORT")?
        .trim()
        .parse::<u16>()
        .map_err(|_| BeaconError::Config("invalid required env var PORT".to_string()))?;

    let cat_ports = parse_port_list(&lookup("CATS_PORTS").unwrap_or_default())?;

    let binding = services.service_registry.into_iter().next().ok_or_else(|| {
        BeaconError::Config("VCAP_SERVICES has no p-service-registry binding".to_string())
    })?;
    let credentials = binding.credentials;

    Ok(BeaconConfig {
        application: ApplicationConfig {
            name: application.application_name,
            instance_index: application.instance_index,
            ip,
            cat_ports,
        },
        server: ServerConfig {
            port,
            ..Default::default()
        },
        registry: RegistryConfig {
            url: credentials.uri,
            ..Default::default()
        },
        oauth: OAuthConfig {
            token_url: credentials.access_token_uri,
            client_id: credentials.client_id,
            client_secret: credentials.client_secret,
        },
        shutdown: ShutdownConfig::default(),
        logging: LoggingConfig::default(),
    })
}

/// Parse a comma separated port list. Blank entries are skipped.
pub fn parse_port_list(raw: &str) -> Result<Vec<u16>> {
    let mut ports = Vec::new();
    for entry in raw.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let port = entry
            .parse::<u16>()
            .map_err(|_| BeaconError::Config(format!("invalid port {}", entry)))?;
        ports.push(port);
    }
    Ok(ports)
}
