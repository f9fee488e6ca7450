pub mod config;
pub mod error;
pub mod group;
pub mod registry;

pub use config::BeaconConfig;
pub use error::{BeaconError, Result};
pub use group::{Member, ReadySignal, RunFuture, Runnable};
pub use registry::{RegistrationPayload, Registerable, ServiceInstance};
