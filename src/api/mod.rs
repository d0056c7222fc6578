//! HTTP endpoints of the local server used during interactive authorization.
//!
//! - [`callback`] receives the provider redirect and records the authorization
//!   code (or the denial) in a [`CallbackState`].
//! - [`health`] reports that the server is up.

mod callback;
mod health;

pub use callback::{CallbackState, SharedCallback, callback};
pub use health::health;
