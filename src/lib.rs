//! fitplay: Strava activity export and Spotify playlist creation.
//!
//! Both providers share one core: OAuth credentials persisted in an env-style
//! file ([`management`]), automatic token refresh, and a paginated fetcher that
//! recovers from a single 401 and backs off on 429 ([`fetch`]).
//!
//! # Modules
//!
//! - `api` - HTTP handlers for the local OAuth callback server
//! - `cli` - Command implementations
//! - `clock` - Injectable time source
//! - `config` - Environment and `.env` configuration
//! - `error` - Error type shared by every module
//! - `fetch` - Authorized request execution and pagination
//! - `http` - Transport abstraction and backoff policy
//! - `management` - Credential store and token lifecycle
//! - `server` - Local HTTP server for OAuth callbacks
//! - `spotify` - Track search and playlist calls
//! - `strava` - Activity listing and CSV export
//! - `types` - Provider payloads and export rows
//! - `utils` - Small helpers

pub mod api;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod fetch;
pub mod http;
pub mod management;
pub mod server;
pub mod spotify;
pub mod strava;
pub mod types;
pub mod utils;

pub use error::{Error, Result};

/// Prints an informational message with a blue bullet point.
///
/// # Arguments
///
/// Accepts the same arguments as `println!`.
///
/// # Example
///
/// ```ignore
/// info!("Fetched {} activities", count);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits with code 1.
///
/// Only for fatal errors: code after the macro does not run. The message goes to
/// stderr so it is not mixed into redirected command output.
///
/// # Example
///
/// ```ignore
/// if let Err(e) = result {
///     error!("{}", e);
/// }
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning with a yellow exclamation mark.
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
