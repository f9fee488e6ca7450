mod instance;
mod payload;
mod traits;

pub use instance::ServiceInstance;
pub use payload::{DataCenterInfo, InstanceInfo, InstancePort, RegistrationPayload};
pub use traits::Registerable;
