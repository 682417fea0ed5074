//! Credential handling for the model provider and the results backend.

pub mod credentials;

pub use credentials::{AICredentials, ApiCredentials, SecretString};
