use std::sync::Arc;

use axum::extract::State;
use axum::response::Html;
use axum::routing::get;
use axum::Router;

use super::pages;

/// Data shown by the info server.
#[derive(Debug, Clone)]
pub struct InfoPage {
    /// Instance IP address.
    pub ip: String,
    /// Instance index.
    pub instance_index: u32,
    /// Ports serving cats.
    pub cat_ports: Vec<u16>,
}

/// Data shown by one cat server.
#[derive(Debug, Clone)]
pub struct CatPage {
    /// Instance IP address.
    pub ip: String,
    /// Port this server listens on.
    pub port: u16,
}

/// Router for the info server.
pub fn info_router(page: InfoPage) -> Router {
    Router::new()
        .route("/", get(info_handler))
        .with_state(Arc::new(page))
}

/// Router for a cat server.
pub fn cat_router(page: CatPage) -> Router {
    Router::new()
        .route("/", get(cat_handler))
        .with_state(Arc::new(page))
}

async fn info_handler(State(page): State<Arc<InfoPage>>) -> Html<String> {
    let ports = page
        .cat_ports
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(",");
    Html(pages::layout(
        "Backend",
        "Backend Sample App",
        &pages::info_body(&page.ip, page.instance_index, &ports),
    ))
}

async fn cat_handler(State(page): State<Arc<CatPage>>) -> Html<String> {
    Html(pages::layout(
        "Backend",
        "Backend Sample App",
        &pages::cat_body(&page.ip, page.port),
    ))
}
