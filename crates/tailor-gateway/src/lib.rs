//! Authenticated request gateway for the tailor shop API
//!
//! Every screen and data store funnels its API calls through
//! `Gateway::request`. The gateway attaches the stored bearer token, and when
//! the API answers 401 it refreshes the session once (shared between all
//! concurrent callers) and retries the call exactly once.
//!
//! Request lifecycle:
//! 1. Resolve the endpoint against the configured base URL (`url`)
//! 2. Fire `on_start`, build headers with the current access token
//! 3. On 401 (outside the refresh endpoint) join or start a refresh episode
//!    (`refresh::RefreshCoordinator`), then retry once with fresh headers
//! 4. Parse the body (`body`), turn non-2xx into `Error::Api`
//! 5. Fire `on_error` on failure and `on_finish` on every exit (`hooks`)
//!
//! If the refresh token is rejected the stored session is purged and the
//! injected `Navigator` sends the app back to its sign-in entry point.

pub mod body;
pub mod client;
pub mod config;
pub mod error;
pub mod hooks;
pub mod navigator;
pub mod refresh;
pub mod url;

#[cfg(test)]
mod testing;

pub use body::{Body, ErrorBody};
pub use client::{Gateway, RequestOptions};
pub use config::GatewayConfig;
pub use error::{Error, Result};
pub use hooks::Hooks;
pub use navigator::{LogNavigator, Navigator};
pub use refresh::RefreshCoordinator;
