//! Beacon runtime composition.
//!
//! Builds the ordered member list for the selected mode from configuration
//! and supervises it as a single process group:
//! - backend: info server, one cat server per port, registration poller
//! - frontend: proxy server resolving backends through the registry

use std::net::SocketAddr;

use tokio_util::sync::CancellationToken;

use beacon_core::config::BeaconConfig;
use beacon_core::group::Member;
use beacon_core::registry::ServiceInstance;
use beacon_core::{BeaconError, Result};
use beacon_runtime::auth::TokenProvider;
use beacon_runtime::group::{GroupConfig, ProcessGroup};
use beacon_runtime::registry::{RegistrationPoller, RegistryClient};
use beacon_runtime::server::{
    cat_router, frontend_router, info_router, CatPage, FrontendState, HttpServer, InfoPage,
};

/// Which set of members to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Backend,
    Frontend,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Backend => "backend",
            Self::Frontend => "frontend",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The beacon runtime.
pub struct Beacon {
    config: BeaconConfig,
}

impl Beacon {
    /// Create a runtime from validated configuration.
    pub fn new(config: BeaconConfig) -> Self {
        Self { config }
    }

    /// One service instance per configured cat port.
    pub fn service_instances(&self) -> Vec<ServiceInstance> {
        let app = &self.config.application;
        app.cat_ports
            .iter()
            .map(|port| ServiceInstance::new(&app.name, app.instance_index, &app.ip, *port))
            .collect()
    }

    /// Build a registry client for this instance's cat ports.
    ///
    /// The token endpoint and the registry each get their own HTTP client.
    pub fn registry_client(&self) -> Result<RegistryClient> {
        let tokens = TokenProvider::new(build_client("token")?, &self.config.oauth);
        let client = RegistryClient::new(
            self.config.registry.url.clone(),
            build_client("registry")?,
            tokens,
            self.service_instances(),
        )
        .with_request_timeout(self.config.registry.request_timeout());
        Ok(client)
    }

    /// Ordered members for `mode`.
    pub fn members(&self, mode: Mode) -> Result<Vec<Member>> {
        match mode {
            Mode::Backend => self.backend_members(),
            Mode::Frontend => self.frontend_members(),
        }
    }

    fn backend_members(&self) -> Result<Vec<Member>> {
        let app = &self.config.application;
        let mut members = Vec::with_capacity(app.cat_ports.len() + 2);

        let info = info_router(InfoPage {
            ip: app.ip.clone(),
            instance_index: app.instance_index,
            cat_ports: app.cat_ports.clone(),
        });
        members.push(Member::new(
            "info_server",
            HttpServer::new(self.listen_addr(self.config.server.port)?, info),
        ));

        for port in &app.cat_ports {
            let cats = cat_router(CatPage {
                ip: app.ip.clone(),
                port: *port,
            });
            members.push(Member::new(
                format!("cat_server_{}", port),
                HttpServer::new(self.listen_addr(*port)?, cats),
            ));
        }

        // Registration goes last so the registry only learns about
        // listeners that already accept connections.
        let poller = RegistrationPoller::new(
            self.registry_client()?,
            self.config.registry.poll_interval(),
        );
        members.push(Member::new("registration_poller", poller));

        Ok(members)
    }

    fn frontend_members(&self) -> Result<Vec<Member>> {
        let tokens = TokenProvider::new(build_client("token")?, &self.config.oauth);
        let registry = RegistryClient::new(
            self.config.registry.url.clone(),
            build_client("registry")?,
            tokens,
            Vec::new(),
        )
        .with_request_timeout(self.config.registry.request_timeout());

        let router = frontend_router(FrontendState::new(registry)?);
        Ok(vec![Member::new(
            "frontend_server",
            HttpServer::new(self.listen_addr(self.config.server.port)?, router),
        )])
    }

    fn listen_addr(&self, port: u16) -> Result<SocketAddr> {
        let raw = format!("{}:{}", self.config.server.host, port);
        raw.parse()
            .map_err(|e| BeaconError::Config(format!("invalid listen address {}: {}", raw, e)))
    }

    /// Run the members for `mode` until `shutdown` fires or a member dies.
    pub async fn run(self, mode: Mode, shutdown: CancellationToken) -> Result<()> {
        let members = self.members(mode)?;
        let group = ProcessGroup::new(
            members,
            GroupConfig {
                drain_timeout: self.config.shutdown.drain_timeout(),
            },
        );

        tracing::info!(mode = %mode, members = ?group.member_names(), "Starting process group");
        group.run(shutdown).await?;
        tracing::info!(mode = %mode, "Process group stopped");
        Ok(())
    }
}

fn build_client(purpose: &str) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .build()
        .map_err(|e| BeaconError::Internal(format!("build {} client: {}", purpose, e)))
}

/// Cancel `shutdown` on the first SIGINT or SIGTERM.
pub fn cancel_on_signal(shutdown: CancellationToken) {
    tokio::spawn(async move {
        wait_for_signal().await;
        tracing::info!("Received shutdown signal");
        shutdown.cancel();
    });
}

async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::time::Duration;

    fn free_port() -> u16 {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    fn backend_config(server: &MockServer, cat_ports: Vec<u16>) -> BeaconConfig {
        let mut config = BeaconConfig::with_endpoints(
            &server.base_url(),
            &server.url("/oauth/token"),
        );
        config.application.name = "backend".to_string();
        config.application.instance_index = 0;
        config.application.ip = "10.0.0.5".to_string();
        config.application.cat_ports = cat_ports;
        config.oauth.client_id = "client".to_string();
        config.oauth.client_secret = "secret".to_string();
        config
    }

    async fn mock_token(server: &MockServer) -> httpmock::Mock<'_> {
        server
            .mock_async(|when, then| {
                when.method(POST).path("/oauth/token");
                then.status(200)
                    .json_body(json!({ "access_token": "tok", "expires_in": 30 }));
            })
            .await
    }

    async fn mock_registration<'a>(server: &'a MockServer, host_name: &str) -> httpmock::Mock<'a> {
        let partial = json!({ "instance": { "hostName": host_name } }).to_string();
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/eureka/apps/backend")
                    .header("authorization", "bearer tok")
                    .json_body_partial(partial);
                then.status(204);
            })
            .await
    }

    #[test]
    fn test_service_instances_follow_cat_ports() {
        let server = MockServer::start();
        let beacon = Beacon::new(backend_config(&server, vec![8081, 8082]));

        let names: Vec<String> = beacon
            .service_instances()
            .iter()
            .map(|i| i.host_name())
            .collect();

        assert_eq!(names, vec!["backend-0-8081", "backend-0-8082"]);
    }

    #[test]
    fn test_backend_member_order() {
        let server = MockServer::start();
        let beacon = Beacon::new(backend_config(&server, vec![8081, 8082]));

        let members = beacon.members(Mode::Backend).unwrap();
        let names: Vec<&str> = members.iter().map(|m| m.name()).collect();

        assert_eq!(
            names,
            vec![
                "info_server",
                "cat_server_8081",
                "cat_server_8082",
                "registration_poller"
            ]
        );
    }

    #[test]
    fn test_frontend_members() {
        let server = MockServer::start();
        let beacon = Beacon::new(backend_config(&server, Vec::new()));

        let members = beacon.members(Mode::Frontend).unwrap();

        assert_eq!(members.len(), 1);
        assert_eq!(members[0].name(), "frontend_server");
    }

    #[test]
    fn test_invalid_host_is_config_error() {
        let server = MockServer::start();
        let mut config = backend_config(&server, vec![8081]);
        config.server.host = "not a host".to_string();

        let err = Beacon::new(config).members(Mode::Backend).unwrap_err();

        assert!(matches!(err, BeaconError::Config(_)));
    }

    #[tokio::test]
    async fn test_registers_each_cat_port_with_its_own_token() {
        let server = MockServer::start_async().await;
        let token = mock_token(&server).await;
        let first = mock_registration(&server, "backend-0-8081").await;
        let second = mock_registration(&server, "backend-0-8082").await;

        let beacon = Beacon::new(backend_config(&server, vec![8081, 8082]));
        beacon.registry_client().unwrap().register_all().await.unwrap();

        first.assert_async().await;
        second.assert_async().await;
        assert_eq!(token.hits_async().await, 2);
    }

    #[tokio::test]
    async fn test_backend_runs_until_shutdown() {
        let server = MockServer::start_async().await;
        mock_token(&server).await;

        let (cat_a, cat_b) = (free_port(), free_port());
        let first = mock_registration(&server, &format!("backend-0-{}", cat_a)).await;
        let second = mock_registration(&server, &format!("backend-0-{}", cat_b)).await;

        let mut config = backend_config(&server, vec![cat_a, cat_b]);
        config.server.host = "127.0.0.1".to_string();
        config.server.port = free_port();
        config.registry.poll_interval_secs = 3600;
        let info_port = config.server.port;

        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(Beacon::new(config).run(Mode::Backend, shutdown.clone()));

        tokio::time::timeout(Duration::from_secs(10), async {
            while second.hits_async().await == 0 {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await
        .expect("backend never registered");

        let info = reqwest::get(format!("http://127.0.0.1:{}/", info_port))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(info.contains("My overlay IP is: 10.0.0.5"));

        shutdown.cancel();
        let result = tokio::time::timeout(Duration::from_secs(10), handle)
            .await
            .expect("backend did not stop")
            .unwrap();
        assert!(result.is_ok());
        first.assert_async().await;
    }

    #[tokio::test]
    async fn test_backend_fails_when_first_registration_fails() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/oauth/token");
                then.status(500).body("down");
            })
            .await;

        let mut config = backend_config(&server, vec![free_port()]);
        config.server.host = "127.0.0.1".to_string();
        config.server.port = free_port();

        let result = tokio::time::timeout(
            Duration::from_secs(10),
            Beacon::new(config).run(Mode::Backend, CancellationToken::new()),
        )
        .await
        .expect("backend did not give up");

        let err = result.unwrap_err();
        assert!(matches!(err, BeaconError::GroupAborted(_)));
        assert!(err.to_string().contains("registration_poller"));
    }
}
