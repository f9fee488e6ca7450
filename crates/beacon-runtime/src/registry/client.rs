use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{StatusCode, Url};
use serde::Deserialize;

use beacon_core::registry::{RegistrationPayload, Registerable, ServiceInstance};
use beacon_core::{BeaconError, Result};

use crate::auth::TokenProvider;

/// Client for a Eureka-style service registry.
pub struct RegistryClient {
    base_url: String,
    http: reqwest::Client,
    tokens: TokenProvider,
    instances: Vec<ServiceInstance>,
    request_timeout: Option<Duration>,
}

impl RegistryClient {
    /// Create a new registry client for the given instances.
    pub fn new(
        base_url: impl Into<String>,
        http: reqwest::Client,
        tokens: TokenProvider,
        instances: Vec<ServiceInstance>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            http,
            tokens,
            instances,
            request_timeout: None,
        }
    }

    /// Bound every registry request by `timeout`.
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Register every instance in order, stopping at the first failure.
    pub async fn register_all(&self) -> Result<()> {
        for instance in &self.instances {
            self.register(instance).await?;
        }
        Ok(())
    }

    /// Register a single instance.
    pub async fn register(&self, instance: &ServiceInstance) -> Result<()> {
        let credential = self.tokens.get_token().await?;

        let url = self.create_url(&format!("/eureka/apps/{}", instance.name))?;
        let payload = RegistrationPayload::from(instance);

        let mut request = self
            .http
            .post(url)
            .header(AUTHORIZATION, credential.authorization())
            .json(&payload);
        if let Some(timeout) = self.request_timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|e| BeaconError::Transport(format!("register {}: {}", instance.host_name(), e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BeaconError::Transport(format!("read registry response: {}", e)))?;

        if status != StatusCode::NO_CONTENT {
            return Err(BeaconError::UnexpectedStatus {
                service: "registry",
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(host_name = %instance.host_name(), "Registered instance");
        Ok(())
    }

    /// Resolve an application name to the `ip:port` of one of its instances.
    pub async fn get_app_by_name(&self, name: &str) -> Result<String> {
        let credential = self.tokens.get_token().await?;

        let url = self.create_url(&format!("/eureka/apps/{}", name))?;
        let mut request = self
            .http
            .get(url)
            .header(AUTHORIZATION, credential.authorization())
            .header(ACCEPT, "application/json");
        if let Some(timeout) = self.request_timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|e| BeaconError::Transport(format!("lookup {}: {}", name, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BeaconError::Transport(format!("read registry response: {}", e)))?;

        if status != StatusCode::OK {
            return Err(BeaconError::UnexpectedStatus {
                service: "registry",
                status: status.as_u16(),
                body,
            });
        }

        let envelope: ApplicationEnvelope = serde_json::from_str(&body)
            .map_err(|e| BeaconError::Decode(format!("application {}: {}", name, e)))?;

        let instances = envelope.application.instance.into_vec();
        let chosen = instances
            .iter()
            .find(|i| i.status.as_deref() == Some("UP"))
            .or_else(|| instances.iter().find(|i| i.status.is_none()))
            .ok_or_else(|| BeaconError::NotFound(format!("no instances of {}", name)))?;

        Ok(format!("{}:{}", chosen.ip_addr, chosen.port.as_string()?))
    }

    fn create_url(&self, route: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| BeaconError::Config(format!("unable to parse base url: {}", e)))?;
        let path = format!(
            "{}/{}",
            url.path().trim_end_matches('/'),
            route.trim_start_matches('/')
        );
        url.set_path(&path);
        Ok(url)
    }
}

impl Registerable for RegistryClient {
    fn register_all(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(RegistryClient::register_all(self))
    }
}

#[derive(Debug, Deserialize)]
struct ApplicationEnvelope {
    application: Application,
}

#[derive(Debug, Deserialize)]
struct Application {
    #[serde(default)]
    instance: OneOrMany<RegisteredInstance>,
}

/// The registry renders a single instance as an object instead of a list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Self::Many(items) => items,
            Self::One(item) => vec![item],
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisteredInstance {
    ip_addr: String,
    port: RegisteredPort,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RegisteredPort {
    #[serde(rename = "$")]
    value: serde_json::Value,
}

impl RegisteredPort {
    fn as_string(&self) -> Result<String> {
        match &self.value {
            serde_json::Value::Number(n) => Ok(n.to_string()),
            serde_json::Value::String(s) => Ok(s.clone()),
            other => Err(BeaconError::Decode(format!("invalid port value {}", other))),
        }
    }
}
