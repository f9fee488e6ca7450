mod token;

pub use token::{Credential, TokenProvider};
