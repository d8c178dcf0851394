//! Bootstrap Coordinator
//!
//! Drives the store through `Uninitialized -> LocalLoaded -> SessionResolved
//! -> Ready`. Each phase only runs once its predecessor has completed; a
//! new auth signal moves a ready store back to `SessionResolved` so the
//! next sync picks up the new identity.

use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::domain::{Currency, UserId};
use crate::remote::{AuthUser, RemoteApi, RemoteError};
use crate::services::CurrencyResolver;
use crate::store::{Action, Store};

use super::bridge::{reconcile, AuthState, SessionStep};
use super::sync_gate::{RemoteSyncGate, SyncOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Uninitialized,
    LocalLoaded,
    SessionResolved,
    Ready,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Uninitialized => "uninitialized",
            Phase::LocalLoaded => "local_loaded",
            Phase::SessionResolved => "session_resolved",
            Phase::Ready => "ready",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("{operation} is not allowed while {phase}")]
    OutOfOrder { operation: &'static str, phase: Phase },
    #[error("local snapshot for {0} was rejected")]
    BootstrapRejected(UserId),
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

pub type CoordinatorResult<T> = Result<T, CoordinatorError>;

pub struct Coordinator {
    store: Arc<Store>,
    remote: Arc<dyn RemoteApi>,
    currency: CurrencyResolver,
    phase: Mutex<Phase>,
}

impl Coordinator {
    pub fn new(store: Arc<Store>, remote: Arc<dyn RemoteApi>, currency: CurrencyResolver) -> Self {
        Self {
            store,
            remote,
            currency,
            phase: Mutex::new(Phase::Uninitialized),
        }
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub async fn phase(&self) -> Phase {
        *self.phase.lock().await
    }

    /// Load the working user's local snapshot. Runs exactly once.
    pub async fn bootstrap(&self) -> CoordinatorResult<UserId> {
        let mut phase = self.phase.lock().await;
        if *phase != Phase::Uninitialized {
            return Err(CoordinatorError::OutOfOrder {
                operation: "bootstrap",
                phase: *phase,
            });
        }

        let snapshots = self.store.snapshots();
        let (user_id, minted) = match snapshots.last_active_user().await {
            Some(user_id) => (user_id, false),
            None => (UserId::new_anonymous(), true),
        };

        let mut snapshot = snapshots.load(&user_id).await.unwrap_or_default();
        if snapshot.currency.is_none() {
            let detected = self.currency.resolve().await;
            snapshot.currency = Some(detected.unwrap_or_else(Currency::usd));
        }

        let loaded = self
            .store
            .dispatch(Action::LoadSnapshot {
                user_id: user_id.clone(),
                snapshot,
            })
            .await;
        if !loaded {
            return Err(CoordinatorError::BootstrapRejected(user_id));
        }

        if minted {
            if let Err(e) = snapshots.set_last_active_user(&user_id).await {
                tracing::error!(%user_id, error = %e, "failed to record last active user");
            }
        }

        tracing::info!(%user_id, minted, "local state loaded");
        *phase = Phase::LocalLoaded;
        Ok(user_id)
    }

    /// Follow an auth signal. A signal that is still loading is accepted
    /// and ignored.
    pub async fn on_auth_changed(&self, auth: &AuthState) -> CoordinatorResult<Phase> {
        let mut phase = self.phase.lock().await;
        if *phase < Phase::LocalLoaded {
            return Err(CoordinatorError::OutOfOrder {
                operation: "on_auth_changed",
                phase: *phase,
            });
        }
        if auth.is_loading {
            return Ok(*phase);
        }

        let state = self.store.state().await;
        for step in reconcile(&state, auth) {
            match step {
                SessionStep::Dispatch(action) => {
                    self.store.dispatch(action).await;
                }
                SessionStep::RememberUser(user_id) => {
                    if let Err(e) = self.store.snapshots().set_last_active_user(&user_id).await {
                        tracing::error!(%user_id, error = %e, "failed to record last active user");
                    }
                }
            }
        }

        let current = self.store.user_id().await;
        match self.store.snapshots().prune_anonymous(&current).await {
            Ok(pruned) if !pruned.is_empty() => {
                tracing::debug!(count = pruned.len(), "pruned orphaned anonymous snapshots");
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "failed to prune anonymous snapshots"),
        }

        *phase = Phase::SessionResolved;
        Ok(*phase)
    }

    /// Keep the locally loaded identity when auth cannot be resolved
    /// (backend unreachable). Never signs anyone out.
    pub async fn assume_local_session(&self) -> CoordinatorResult<Phase> {
        let mut phase = self.phase.lock().await;
        if *phase < Phase::LocalLoaded {
            return Err(CoordinatorError::OutOfOrder {
                operation: "assume_local_session",
                phase: *phase,
            });
        }
        let user_id = self.store.user_id().await;
        tracing::warn!(%user_id, "session unresolved, continuing with local identity");
        *phase = Phase::SessionResolved;
        Ok(*phase)
    }

    /// Run the remote sync gate for the resolved session. The phase lock is
    /// released before the fetch so auth changes are never queued behind it.
    pub async fn sync(&self) -> CoordinatorResult<SyncOutcome> {
        {
            let mut phase = self.phase.lock().await;
            if *phase < Phase::SessionResolved {
                return Err(CoordinatorError::OutOfOrder {
                    operation: "sync",
                    phase: *phase,
                });
            }
            *phase = Phase::Ready;
        }

        let outcome = RemoteSyncGate::run(&self.store, self.remote.as_ref()).await;
        tracing::debug!(?outcome, "sync finished");
        Ok(outcome)
    }

    // ========================
    // Session flows
    // ========================

    /// Ask the backend who is signed in, then reconcile and sync
    pub async fn refresh_session(&self) -> CoordinatorResult<SyncOutcome> {
        let status = self.remote.session_status().await?;
        self.on_auth_changed(&AuthState::from(status)).await?;
        self.sync().await
    }

    pub async fn login(&self, email: &str, password: &str) -> CoordinatorResult<AuthUser> {
        let user = self.remote.login(email, password).await?;
        self.enter_session(user).await
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> CoordinatorResult<AuthUser> {
        let user = self.remote.register(name, email, password).await?;
        self.enter_session(user).await
    }

    async fn enter_session(&self, user: AuthUser) -> CoordinatorResult<AuthUser> {
        self.on_auth_changed(&AuthState::signed_in(user.clone())).await?;
        self.sync().await?;
        Ok(user)
    }

    /// Sign out remotely (best effort) and switch to a fresh anonymous user
    pub async fn logout(&self) -> CoordinatorResult<UserId> {
        if let Err(e) = self.remote.logout().await {
            tracing::warn!(error = %e, "remote logout failed");
        }
        self.on_auth_changed(&AuthState::signed_out()).await?;
        self.sync().await?;
        Ok(self.store.user_id().await)
    }

    /// Change currency locally and mirror it to the backend for
    /// authenticated users. Returns `false` if the backend refused.
    pub async fn set_currency(&self, currency: Currency) -> bool {
        let code = currency.code.clone();
        self.store.dispatch(Action::SetCurrency(currency)).await;

        let user_id = self.store.user_id().await;
        if !user_id.is_authenticated() {
            return true;
        }
        match self.remote.update_preferences(&user_id, &code).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(%user_id, error = %e, "failed to save currency preference");
                false
            }
        }
    }
}
