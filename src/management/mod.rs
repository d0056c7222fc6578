//! OAuth credential persistence and token lifecycle.

mod credentials;
mod token;

pub use credentials::{CredentialStore, Credentials, TokenState};
pub use token::{DEFAULT_SKEW_SECS, TokenEndpoint, TokenProvider};
