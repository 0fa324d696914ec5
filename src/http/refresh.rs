//! Usage: Single-flight token refresh shared by every backend client.

use crate::api::auth::AuthApi;
use crate::session::store::TokenStore;
use crate::shared::error::{codes, AppError, AppResult};
use crate::shared::mutex_ext::MutexExt;
use crate::shared::security::mask_token;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

/// What a caller parked on a refresh flight is handed when it settles.
#[derive(Debug, Clone)]
pub(crate) enum RefreshOutcome {
    /// A new access token. The caller re-sends its original request once with
    /// this token.
    Refreshed(String),
    /// The refresh settled without a usable session. The stored credentials
    /// are gone; the caller surfaces its 401 as session-expired.
    SessionGone,
}

#[derive(Default)]
struct FlightState {
    refreshing: bool,
    waiters: Vec<oneshot::Sender<RefreshOutcome>>,
}

enum Ticket {
    Leader,
    Waiter(oneshot::Receiver<RefreshOutcome>),
}

/// Coordinates token refresh across both backend clients: at most one refresh
/// network call is in flight per coordinator, every concurrent 401 parks until
/// that call settles, and the waiter queue is drained exactly once in FIFO
/// order.
pub struct RefreshCoordinator {
    auth: AuthApi,
    store: Arc<dyn TokenStore>,
    flight: Mutex<FlightState>,
}

impl RefreshCoordinator {
    pub fn new(auth: AuthApi, store: Arc<dyn TokenStore>) -> Self {
        Self {
            auth,
            store,
            flight: Mutex::new(FlightState::default()),
        }
    }

    /// Entry point for a request that got a 401 with its one-shot retry budget
    /// unspent. Resolves once a refresh flight settles; the first caller runs
    /// the flight, everyone else waits on its outcome.
    pub(crate) async fn recover_unauthorized(&self) -> AppResult<RefreshOutcome> {
        match self.claim() {
            Ticket::Leader => Ok(self.run_refresh().await),
            Ticket::Waiter(receiver) => receiver.await.map_err(|_| {
                AppError::new(
                    codes::INTERNAL_ERROR,
                    "refresh flight dropped without settling",
                )
            }),
        }
    }

    // Leadership is decided synchronously, before any await point, so the
    // refreshing flag is visible to every later 401 in the same tick.
    fn claim(&self) -> Ticket {
        let mut flight = self.flight.lock_or_recover();
        if flight.refreshing {
            let (sender, receiver) = oneshot::channel();
            flight.waiters.push(sender);
            return Ticket::Waiter(receiver);
        }
        flight.refreshing = true;
        Ticket::Leader
    }

    // Every path through here reaches `settle`, so a failed or rejected
    // refresh can never leave waiters parked forever.
    async fn run_refresh(&self) -> RefreshOutcome {
        let outcome = match self.store.refresh_token() {
            Some(refresh_token) => match self.auth.refresh(&refresh_token).await {
                Ok(credentials) => {
                    let token = credentials.access_token.clone();
                    if let Err(err) = self.store.save(credentials) {
                        tracing::warn!("refreshed session could not be persisted: {err}");
                    }
                    tracing::debug!(access_token = %mask_token(&token), "session refreshed");
                    RefreshOutcome::Refreshed(token)
                }
                Err(err) => {
                    tracing::warn!("token refresh failed, tearing session down: {err}");
                    self.teardown();
                    RefreshOutcome::SessionGone
                }
            },
            None => {
                tracing::debug!("401 with no stored refresh token; nothing to refresh");
                self.teardown();
                RefreshOutcome::SessionGone
            }
        };

        self.settle(outcome.clone());
        outcome
    }

    fn teardown(&self) {
        if let Err(err) = self.store.clear() {
            tracing::warn!("session store clear failed: {err}");
        }
    }

    // Flag reset and waiter snapshot happen under one lock acquisition, so the
    // drain is atomic relative to new enqueues: a 401 arriving mid-drain
    // becomes the leader of the next flight instead of being dropped.
    fn settle(&self, outcome: RefreshOutcome) {
        let waiters = {
            let mut flight = self.flight.lock_or_recover();
            flight.refreshing = false;
            std::mem::take(&mut flight.waiters)
        };

        for waiter in waiters {
            // A dropped receiver just means that caller gave up.
            let _ = waiter.send(outcome.clone());
        }
    }
}
