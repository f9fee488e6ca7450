mod member;
mod ready;

pub use member::{Member, RunFuture, Runnable};
pub use ready::ReadySignal;
