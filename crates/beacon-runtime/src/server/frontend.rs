use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use beacon_core::{BeaconError, Result};

use super::pages;
use crate::registry::RegistryClient;

/// Budget for fetching a page from a backend instance.
pub const DOWNSTREAM_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared state of the frontend server.
pub struct FrontendState {
    registry: RegistryClient,
    http: reqwest::Client,
}

impl FrontendState {
    /// Create frontend state with its own downstream client.
    pub fn new(registry: RegistryClient) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(DOWNSTREAM_TIMEOUT)
            .build()
            .map_err(|e| BeaconError::Internal(format!("build downstream client: {}", e)))?;
        Ok(Self::with_client(registry, http))
    }

    /// Create frontend state with an explicit downstream client.
    pub fn with_client(registry: RegistryClient, http: reqwest::Client) -> Self {
        Self { registry, http }
    }
}

#[derive(Debug, Deserialize)]
struct DemoQuery {
    app: Option<String>,
}

/// Router for the frontend server.
pub fn frontend_router(state: FrontendState) -> Router {
    Router::new()
        .route("/", get(demo_handler))
        .with_state(Arc::new(state))
}

async fn demo_handler(
    State(state): State<Arc<FrontendState>>,
    Query(query): Query<DemoQuery>,
) -> (StatusCode, Html<String>) {
    let Some(app) = query.app.filter(|a| !a.trim().is_empty()) else {
        return render_error(StatusCode::BAD_REQUEST, "missing app query parameter");
    };

    let destination = match state.registry.get_app_by_name(&app).await {
        Ok(destination) => destination,
        Err(e) => {
            tracing::warn!(app = %app, error = %e, "Failed to resolve app");
            return render_error(StatusCode::BAD_GATEWAY, &e.to_string());
        }
    };

    let response = match state.http.get(format!("http://{}", destination)).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(destination = %destination, error = %e, "Failed to reach backend");
            return render_error(StatusCode::BAD_GATEWAY, &e.to_string());
        }
    };

    match response.text().await {
        // backend pages are embedded as-is
        Ok(body) => (
            StatusCode::OK,
            Html(pages::layout("Frontend", "Frontend Sample App", &body)),
        ),
        Err(e) => render_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            &format!("read body failed: {}", e),
        ),
    }
}

fn render_error(status: StatusCode, message: &str) -> (StatusCode, Html<String>) {
    (
        status,
        Html(pages::layout(
            "Frontend",
            "Frontend Sample App",
            &pages::error_body(message),
        )),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use beacon_core::config::OAuthConfig;
    use http_body_util::BodyExt;
    use httpmock::prelude::*;
    use serde_json::json;
    use tower::ServiceExt;

    use crate::auth::TokenProvider;

    fn state(server: &MockServer) -> FrontendState {
        let tokens = TokenProvider::new(
            reqwest::Client::new(),
            &OAuthConfig {
                token_url: server.url("/oauth/token"),
                client_id: "client".to_string(),
                client_secret: "secret".to_string(),
            },
        );
        let registry =
            RegistryClient::new(server.base_url(), reqwest::Client::new(), tokens, Vec::new());
        FrontendState::new(registry).unwrap()
    }

    async fn call(router: Router, uri: &str) -> (StatusCode, String) {
        let response = router
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_proxies_backend_page() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/oauth/token");
                then.status(200).json_body(json!({ "access_token": "tok" }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/eureka/apps/backend");
                then.status(200).json_body(json!({
                    "application": {
                        "instance": [{
                            "ipAddr": "127.0.0.1",
                            "port": { "$": server.port() },
                            "status": "UP"
                        }]
                    }
                }));
            })
            .await;
        let cat = server
            .mock_async(|when, then| {
                when.method(GET).path("/");
                then.status(200).body("<p>a cat</p>");
            })
            .await;

        let (status, body) = call(frontend_router(state(&server)), "/?app=backend").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Frontend Sample App"));
        assert!(body.contains("<p>a cat</p>"));
        cat.assert_async().await;
    }

    #[tokio::test]
    async fn test_unreachable_backend_renders_error_page() {
        let server = MockServer::start_async().await;
        let closed_port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        server
            .mock_async(|when, then| {
                when.method(POST).path("/oauth/token");
                then.status(200).json_body(json!({ "access_token": "tok" }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/eureka/apps/backend");
                then.status(200).json_body(json!({
                    "application": {
                        "instance": {
                            "ipAddr": "127.0.0.1",
                            "port": { "$": closed_port.to_string() },
                            "status": "UP"
                        }
                    }
                }));
            })
            .await;

        let (status, body) = call(frontend_router(state(&server)), "/?app=backend").await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body.contains("Frontend Sample App"));
        assert!(body.contains("Request failed"));
    }

    #[tokio::test]
    async fn test_missing_app_is_bad_request() {
        let server = MockServer::start_async().await;

        let (status, body) = call(frontend_router(state(&server)), "/").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("missing app query parameter"));
    }

    #[tokio::test]
    async fn test_resolve_failure_renders_error_page() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/oauth/token");
                then.status(401).body("bad client");
            })
            .await;

        let (status, body) = call(frontend_router(state(&server)), "/?app=backend").await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body.contains("Request failed"));
        assert!(body.contains("bad client"));
    }
}
