//! Endpoint resolution

use crate::error::{Error, Result};

/// Whether `endpoint` is an absolute `http(s)://` URL (scheme is matched
/// case-insensitively).
pub fn is_absolute(endpoint: &str) -> bool {
    let lower = endpoint.get(..8).unwrap_or(endpoint).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Join a base URL and a relative endpoint with exactly one `/` between them.
pub fn join(base: &str, endpoint: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    )
}

/// Resolve the URL a call goes to.
///
/// Absolute endpoints are used verbatim regardless of the base. Relative
/// endpoints need a base URL; without one this is a configuration error.
pub fn resolve(base: Option<&str>, endpoint: &str) -> Result<String> {
    if is_absolute(endpoint) {
        return Ok(endpoint.to_string());
    }
    match base {
        Some(base) => Ok(join(base, endpoint)),
        None => Err(Error::Config(format!(
            "API base URL is not configured (cannot resolve {endpoint})"
        ))),
    }
}

/// Whether two resolved URLs address the same endpoint, ignoring a trailing
/// slash.
pub(crate) fn same_endpoint(a: &str, b: &str) -> bool {
    a.trim_end_matches('/') == b.trim_end_matches('/')
}
