//! Token refresh call
//!
//! `POST <base>/auth/refresh-token` with `{ "refreshToken": ... }`. A success
//! status returns a fresh `{ "accessToken", "refreshToken" }` pair; any other
//! status means the refresh token is no longer accepted.

use std::fmt;

use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Token pair returned by the refresh endpoint (and by login).
#[derive(Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .finish()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

/// Exchange a refresh token for a new token pair.
///
/// `headers` carries the caller's default headers (client identification,
/// cache directives); the JSON content type is set by the body encoder.
///
/// Non-success statuses map to `Error::RefreshRejected`; transport failures
/// to `Error::Http`; an unparseable success body to `Error::InvalidResponse`.
pub async fn refresh_token(
    client: &reqwest::Client,
    url: &str,
    headers: HeaderMap,
    refresh: &str,
) -> Result<TokenPair> {
    debug!(url, "requesting token refresh");
    let response = client
        .post(url)
        .headers(headers)
        .json(&RefreshRequest {
            refresh_token: refresh,
        })
        .send()
        .await
        .map_err(|e| Error::Http(format!("token refresh request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<no body>"));
        return Err(Error::RefreshRejected {
            status: status.as_u16(),
            body,
        });
    }

    response
        .json::<TokenPair>()
        .await
        .map_err(|e| Error::InvalidResponse(e.to_string()))
}
