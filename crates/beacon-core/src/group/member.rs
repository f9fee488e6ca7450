use std::future::Future;
use std::pin::Pin;

use tokio_util::sync::CancellationToken;

use super::ready::ReadySignal;
use crate::Result;

/// Future returned by a running member.
pub type RunFuture = Pin<Box<dyn Future<Output = Result<()>> + Send>>;

/// A long-running task supervised by a process group.
///
/// Implementations call `ready.notify()` once they can serve, then run
/// until `shutdown` is cancelled. Returning before notifying aborts the
/// group startup.
pub trait Runnable: Send + 'static {
    /// Run the member to completion.
    fn run(self: Box<Self>, shutdown: CancellationToken, ready: ReadySignal) -> RunFuture;
}

/// A named group member.
pub struct Member {
    name: String,
    runner: Box<dyn Runnable>,
}

impl Member {
    /// Create a new member.
    pub fn new(name: impl Into<String>, runner: impl Runnable) -> Self {
        Self {
            name: name.into(),
            runner: Box::new(runner),
        }
    }

    /// Member name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Split into name and runner.
    pub fn into_parts(self) -> (String, Box<dyn Runnable>) {
        (self.name, self.runner)
    }
}

impl std::fmt::Debug for Member {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Member").field("name", &self.name).finish()
    }
}
