mod supervisor;

pub use supervisor::{GroupConfig, ProcessGroup};
