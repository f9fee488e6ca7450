mod backend;
mod frontend;
mod http;
mod pages;

pub use backend::{cat_router, info_router, CatPage, InfoPage};
pub use frontend::{frontend_router, FrontendState, DOWNSTREAM_TIMEOUT};
pub use http::HttpServer;
