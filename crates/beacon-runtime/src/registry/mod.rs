mod client;
mod poller;

pub use client::RegistryClient;
pub use poller::{PollerState, RegistrationPoller};
