//! Error taxonomy for the prediction core
//!
//! Every failure the pipeline or the session state machine can produce is
//! one of these variants. Nothing in the core swallows them; the boundary
//! (HTTP API, terminal client) decides how to present them.

use crate::session::SessionView;
use thiserror::Error;

/// Result type for AQI core operations
pub type Result<T> = std::result::Result<T, AqiError>;

#[derive(Debug, Error)]
pub enum AqiError {
    /// Model artifact missing, unreadable or corrupt. Fatal at startup.
    #[error("failed to initialize model from {path}: {reason}")]
    Initialization { path: String, reason: String },

    /// A request field is missing, non-numeric or negative.
    #[error("invalid value for {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    /// The model raised while scoring a well-formed input.
    #[error("model scoring failed: {0}")]
    Scoring(String),

    /// A navigation or operation that the current view does not allow.
    #[error("cannot {action} while {from}{}", login_hint(.from))]
    IllegalTransition { from: SessionView, action: String },

    /// The authenticator refused the supplied credentials.
    #[error("credentials rejected for user {0:?}")]
    CredentialsRejected(String),

    /// No session exists with this id.
    #[error("unknown session {0}")]
    UnknownSession(String),

    /// The range table used by the classifier is not a partition.
    #[error("invalid category table: {0}")]
    CategoryTable(String),
}

fn login_hint(from: &SessionView) -> &'static str {
    if from.is_authenticated() {
        ""
    } else {
        ": please log in"
    }
}

impl AqiError {
    pub fn initialization(path: impl Into<String>, reason: impl ToString) -> Self {
        AqiError::Initialization {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        AqiError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn scoring(reason: impl ToString) -> Self {
        AqiError::Scoring(reason.to_string())
    }

    pub fn illegal_transition(from: SessionView, action: impl Into<String>) -> Self {
        AqiError::IllegalTransition {
            from,
            action: action.into(),
        }
    }

    /// Short machine-readable kind, used for metric labels and API bodies
    pub fn kind(&self) -> &'static str {
        match self {
            AqiError::Initialization { .. } => "initialization",
            AqiError::InvalidInput { .. } => "invalid_input",
            AqiError::Scoring(_) => "scoring",
            AqiError::IllegalTransition { .. } => "illegal_transition",
            AqiError::CredentialsRejected(_) => "credentials_rejected",
            AqiError::UnknownSession(_) => "unknown_session",
            AqiError::CategoryTable(_) => "category_table",
        }
    }

    /// Whether the caller can carry on after reporting this error
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            AqiError::Initialization { .. } | AqiError::CategoryTable(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_names_field() {
        let err = AqiError::invalid_input("no2_aqi", "must be >= 0");
        assert_eq!(err.to_string(), "invalid value for no2_aqi: must be >= 0");
        assert_eq!(err.kind(), "invalid_input");
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_illegal_transition_asks_for_login() {
        let err = AqiError::illegal_transition(SessionView::LoggedOut, "predict");
        assert_eq!(err.to_string(), "cannot predict while logged_out: please log in");

        let err = AqiError::illegal_transition(SessionView::PredictAqi, "log in");
        assert!(!err.to_string().contains("please log in"));
    }

    #[test]
    fn test_initialization_is_fatal() {
        let err = AqiError::initialization("model.onnx", "file not found");
        assert!(!err.is_recoverable());
    }
}
