use std::future::Future;
use std::pin::Pin;

use crate::Result;

/// Capability to (re-)register every owned instance in one idempotent call.
pub trait Registerable: Send + Sync + 'static {
    /// Register all instances, failing on the first error.
    fn register_all(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

impl<T: Registerable> Registerable for std::sync::Arc<T> {
    fn register_all(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        (**self).register_all()
    }
}
