//! Session Bridge
//!
//! Maps an observed authentication signal onto store actions. The mapping
//! is pure; the coordinator applies the steps.

use crate::domain::UserId;
use crate::remote::{AuthUser, SessionStatus};
use crate::store::{Action, AppState};

/// Authentication signal as seen by the app
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AuthState {
    pub is_authenticated: bool,
    pub user: Option<AuthUser>,
    /// Auth is still being resolved; nothing may be decided yet
    pub is_loading: bool,
}

impl AuthState {
    pub fn loading() -> Self {
        Self {
            is_loading: true,
            ..Default::default()
        }
    }

    pub fn signed_out() -> Self {
        Self::default()
    }

    pub fn signed_in(user: AuthUser) -> Self {
        Self {
            is_authenticated: true,
            user: Some(user),
            is_loading: false,
        }
    }

    /// Authenticated user, if the signal carries a usable one
    pub fn authenticated_user(&self) -> Option<&AuthUser> {
        if !self.is_authenticated {
            return None;
        }
        self.user.as_ref().filter(|u| !u.id.trim().is_empty())
    }
}

impl From<SessionStatus> for AuthState {
    fn from(status: SessionStatus) -> Self {
        Self {
            is_authenticated: status.is_authenticated,
            user: status.user,
            is_loading: false,
        }
    }
}

/// One thing the coordinator must do to follow the session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionStep {
    Dispatch(Action),
    /// Point the next cold start at this user
    RememberUser(UserId),
}

/// Steps that bring `state` in line with `auth`.
///
/// An authenticated signal without a user is treated as signed out.
pub fn reconcile(state: &AppState, auth: &AuthState) -> Vec<SessionStep> {
    if auth.is_loading {
        return Vec::new();
    }

    if let Some(user) = auth.authenticated_user() {
        let user_id = user.user_id();
        if state.user_id == user_id && state.is_premium == user.is_premium {
            return Vec::new();
        }
        return vec![
            SessionStep::Dispatch(Action::SetUserContext {
                user_id: user_id.clone(),
                is_premium: user.is_premium,
            }),
            SessionStep::RememberUser(user_id),
        ];
    }

    if state.user_id.is_authenticated() {
        return vec![SessionStep::Dispatch(Action::ResetForLogout {
            new_user_id: UserId::new_anonymous(),
        })];
    }

    if state.user_id.is_absent() {
        let user_id = UserId::new_anonymous();
        return vec![
            SessionStep::Dispatch(Action::SetUserContext {
                user_id: user_id.clone(),
                is_premium: false,
            }),
            SessionStep::RememberUser(user_id),
        ];
    }

    if state.is_premium {
        return vec![SessionStep::Dispatch(Action::SetUserContext {
            user_id: state.user_id.clone(),
            is_premium: false,
        })];
    }

    Vec::new()
}
