//! Beacon runtime: registry client, registration poller, process group and
//! the HTTP members supervised by it.

pub mod auth;
pub mod group;
pub mod registry;
pub mod server;

pub use auth::{Credential, TokenProvider};
pub use group::{GroupConfig, ProcessGroup};
pub use registry::{PollerState, RegistrationPoller, RegistryClient};
pub use server::HttpServer;
