//! Beacon: service instances that register themselves with a Eureka-style
//! registry and run as one supervised process group.

mod runtime;

pub use runtime::{cancel_on_signal, Beacon, Mode};

pub use beacon_core;
pub use beacon_runtime;
