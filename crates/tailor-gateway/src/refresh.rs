//! Single-flight token refresh
//!
//! When many requests see a 401 at nearly the same time, only one of them may
//! call the refresh endpoint. The coordinator holds a two-state slot:
//!
//! - `Idle`: no refresh in flight. The next caller starts an episode.
//! - `Refreshing`: one episode in flight. Callers clone its shared outcome
//!   and wait on it.
//!
//! The state check and the installation of the new episode happen under one
//! synchronous lock with no `.await` in between, so two callers can never
//! both observe `Idle`. The episode itself runs as a spawned task which
//! clears the slot when it settles (success, failure, or panic), so the slot
//! is released even if every waiting caller has been dropped.
//!
//! Timeouts: none by default. A hung refresh endpoint blocks all waiters
//! until it answers; `timeout` bounds an episode when the host opts in.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt, Shared};
use reqwest::header::HeaderMap;
use tailor_auth::{KeyValueStore, credentials};
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::navigator::Navigator;

/// Shared outcome of one refresh episode. Every clone resolves to the same
/// result.
pub type RefreshHandle = Shared<BoxFuture<'static, Result<()>>>;

enum RefreshState {
    Idle,
    Refreshing { episode: u64, outcome: RefreshHandle },
}

struct Slot {
    state: RefreshState,
    /// Episodes started so far; also the id of the latest one.
    episodes: u64,
}

struct Inner {
    client: reqwest::Client,
    store: Arc<dyn KeyValueStore>,
    navigator: Arc<dyn Navigator>,
    refresh_url: Option<String>,
    headers: HeaderMap,
    timeout: Option<Duration>,
    slot: Mutex<Slot>,
}

/// Coordinates token refreshes so at most one is in flight.
///
/// Cheap to clone; clones share the same slot.
#[derive(Clone)]
pub struct RefreshCoordinator {
    inner: Arc<Inner>,
}

impl RefreshCoordinator {
    /// Create a coordinator.
    ///
    /// `refresh_url` is the resolved refresh endpoint (`None` when no base URL
    /// is configured). `headers` are sent with every refresh call.
    pub fn new(
        client: reqwest::Client,
        store: Arc<dyn KeyValueStore>,
        navigator: Arc<dyn Navigator>,
        refresh_url: Option<String>,
        headers: HeaderMap,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                client,
                store,
                navigator,
                refresh_url,
                headers,
                timeout,
                slot: Mutex::new(Slot {
                    state: RefreshState::Idle,
                    episodes: 0,
                }),
            }),
        }
    }

    /// Refresh the session, joining the in-flight episode if there is one.
    ///
    /// Resolves once the episode settles. On `Err(Error::SessionExpired)`
    /// the stored session has already been purged and the navigator called.
    pub async fn refresh(&self) -> Result<()> {
        self.acquire_or_join().await
    }

    /// Return the in-flight episode's handle, starting a new episode if idle.
    ///
    /// Must be called from within a tokio runtime.
    pub fn acquire_or_join(&self) -> RefreshHandle {
        let mut slot = self.inner.slot();
        if let RefreshState::Refreshing { episode, outcome } = &slot.state {
            debug!(episode, "joining in-flight token refresh");
            return outcome.clone();
        }

        slot.episodes += 1;
        let episode = slot.episodes;
        debug!(episode, "starting token refresh");

        let task = tokio::spawn(run_episode(Arc::clone(&self.inner), episode));
        let outcome = async move {
            match task.await {
                Ok(result) => result,
                Err(e) => Err(Error::Transport(format!("token refresh aborted: {e}"))),
            }
        }
        .boxed()
        .shared();

        slot.state = RefreshState::Refreshing {
            episode,
            outcome: outcome.clone(),
        };
        outcome
    }

    /// Whether an episode is currently in flight.
    pub fn is_refreshing(&self) -> bool {
        matches!(self.inner.slot().state, RefreshState::Refreshing { .. })
    }

    /// Number of episodes started since creation.
    pub fn episodes(&self) -> u64 {
        self.inner.slot().episodes
    }

    /// Resolved refresh endpoint, if a base URL is configured.
    pub fn refresh_url(&self) -> Option<&str> {
        self.inner.refresh_url.as_deref()
    }
}

/// Clears the slot when the episode task ends, however it ends.
struct SettleGuard {
    inner: Arc<Inner>,
    episode: u64,
}

impl Drop for SettleGuard {
    fn drop(&mut self) {
        let mut slot = self.inner.slot();
        if matches!(slot.state, RefreshState::Refreshing { episode, .. } if episode == self.episode)
        {
            slot.state = RefreshState::Idle;
            debug!(episode = self.episode, "token refresh settled");
        }
    }
}

async fn run_episode(inner: Arc<Inner>, episode: u64) -> Result<()> {
    let guard = SettleGuard {
        inner: Arc::clone(&inner),
        episode,
    };
    let result = inner.refresh_once(episode).await;

    let label = match &result {
        Ok(()) => "success",
        Err(Error::SessionExpired) => "rejected",
        Err(Error::RefreshTimeout(_)) => "timeout",
        Err(_) => "failed",
    };
    metrics::counter!("gateway_token_refresh_total", "result" => label).increment(1);

    drop(guard);
    result
}

impl Inner {
    fn slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn refresh_once(&self, episode: u64) -> Result<()> {
        let url = self.refresh_url.as_deref().ok_or_else(|| {
            Error::Config("API base URL is not configured (cannot refresh session)".into())
        })?;

        let Some(refresh) = credentials::refresh_token(self.store.as_ref()).await? else {
            warn!(episode, "no refresh token stored, ending session");
            return self.expire(episode).await;
        };

        let call =
            tailor_auth::refresh_token(&self.client, url, self.headers.clone(), refresh.expose());
        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                warn!(episode, timeout_ms = limit.as_millis() as u64, "token refresh timed out");
                Error::RefreshTimeout(limit)
            })?,
            None => call.await,
        };

        match result {
            Ok(pair) => {
                credentials::save_pair(self.store.as_ref(), &pair).await?;
                info!(episode, "token refresh succeeded");
                Ok(())
            }
            Err(tailor_auth::Error::RefreshRejected { status, .. }) => {
                warn!(episode, status, "refresh token rejected, ending session");
                self.expire(episode).await
            }
            Err(e) => {
                warn!(episode, error = %e, "token refresh failed");
                Err(e.into())
            }
        }
    }

    /// Purge the session and send the user back to sign-in.
    async fn expire(&self, episode: u64) -> Result<()> {
        if let Err(e) = credentials::purge(self.store.as_ref()).await {
            error!(episode, error = %e, "failed to purge session after refresh rejection");
        }
        self.navigator.redirect_to_entry();
        Err(Error::SessionExpired)
    }
}
