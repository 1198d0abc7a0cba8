//! Credential handling.

mod credentials;

pub use credentials::{ModelCredentials, SecretString};
