//! Per-session navigation state
//!
//! A session is in one of three views. `LoggedOut` is the initial view;
//! logging in moves to `PredictAqi`, the two authenticated views can be
//! switched freely, and logging out from either returns to `LoggedOut`.
//! Every other move is an `IllegalTransition`.

mod auth;
mod store;

pub use auth::{AcceptAll, Authenticator, Credentials};
pub use store::{SessionStore, DEFAULT_IDLE_TIMEOUT};

use crate::error::{AqiError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The view a session is currently showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionView {
    LoggedOut,
    PredictAqi,
    Description,
}

impl SessionView {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionView::LoggedOut => "logged_out",
            SessionView::PredictAqi => "predict_aqi",
            SessionView::Description => "description",
        }
    }

    pub fn is_authenticated(&self) -> bool {
        !matches!(self, SessionView::LoggedOut)
    }
}

impl fmt::Display for SessionView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inputs that move a session between views
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Login,
    Navigate(SessionView),
    Logout,
}

impl SessionEvent {
    fn describe(&self) -> String {
        match self {
            SessionEvent::Login => "log in".to_string(),
            SessionEvent::Navigate(to) => format!("navigate to {}", to),
            SessionEvent::Logout => "log out".to_string(),
        }
    }
}

/// Transition table. `None` means the move is illegal.
pub fn next_view(from: SessionView, event: SessionEvent) -> Option<SessionView> {
    use SessionEvent::*;
    use SessionView::*;

    match (from, event) {
        (LoggedOut, Login) => Some(PredictAqi),
        (PredictAqi | Description, Navigate(to @ (PredictAqi | Description))) => Some(to),
        (PredictAqi | Description, Logout) => Some(LoggedOut),
        _ => None,
    }
}

/// A completed view change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub from: SessionView,
    pub to: SessionView,
}

/// Navigation state owned by exactly one session
#[derive(Debug, Clone)]
pub struct SessionStateMachine {
    view: SessionView,
    user: Option<String>,
}

impl Default for SessionStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStateMachine {
    pub fn new() -> Self {
        Self {
            view: SessionView::LoggedOut,
            user: None,
        }
    }

    pub fn view(&self) -> SessionView {
        self.view
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    fn apply(&mut self, event: SessionEvent) -> Result<Transition> {
        let from = self.view;
        let to = next_view(from, event)
            .ok_or_else(|| AqiError::illegal_transition(from, event.describe()))?;
        self.view = to;
        Ok(Transition { from, to })
    }

    /// Log in through `authenticator`. Only legal from `LoggedOut`.
    pub fn login(
        &mut self,
        authenticator: &dyn Authenticator,
        credentials: &Credentials,
    ) -> Result<Transition> {
        if next_view(self.view, SessionEvent::Login).is_none() {
            return Err(AqiError::illegal_transition(
                self.view,
                SessionEvent::Login.describe(),
            ));
        }
        if !authenticator.authenticate(credentials) {
            return Err(AqiError::CredentialsRejected(credentials.username.clone()));
        }
        let transition = self.apply(SessionEvent::Login)?;
        self.user = Some(credentials.username.clone());
        Ok(transition)
    }

    pub fn navigate(&mut self, to: SessionView) -> Result<Transition> {
        self.apply(SessionEvent::Navigate(to))
    }

    pub fn logout(&mut self) -> Result<Transition> {
        let transition = self.apply(SessionEvent::Logout)?;
        self.user = None;
        Ok(transition)
    }

    /// Gate for operations that need a logged-in session, e.g. `predict`
    pub fn require_authenticated(&self, action: &str) -> Result<()> {
        if self.view.is_authenticated() {
            Ok(())
        } else {
            Err(AqiError::illegal_transition(self.view, action))
        }
    }

    /// Back to `LoggedOut`, as when a new session begins
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
