use std::fmt;

use thiserror::Error;

use crate::pipeline::CandidateId;
use crate::service::ServiceError;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("Invariant violation: {0}")]
    Invariant(String),

    #[error("An advance for candidate {0} is already in flight")]
    AdvanceInFlight(CandidateId),

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;

/// The class of a failure, which decides what the user is told to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// No credential present; sign in.
    Unauthenticated,
    /// Credential rejected or expired; sign in again.
    Unauthorized,
    /// The referenced record does not exist. Not retryable.
    NotFound,
    /// Network or service failure. Retryable by the caller.
    Transient,
    /// A local invariant was broken; the request was not sent.
    Invariant,
    /// The service refused the request as invalid.
    Rejected,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorClass::Unauthenticated => write!(f, "unauthenticated"),
            ErrorClass::Unauthorized => write!(f, "unauthorized"),
            ErrorClass::NotFound => write!(f, "not_found"),
            ErrorClass::Transient => write!(f, "transient"),
            ErrorClass::Invariant => write!(f, "invariant"),
            ErrorClass::Rejected => write!(f, "rejected"),
        }
    }
}

impl PipelineError {
    pub fn class(&self) -> ErrorClass {
        match self {
            PipelineError::Service(err) => match err {
                ServiceError::Unauthenticated => ErrorClass::Unauthenticated,
                ServiceError::Unauthorized { .. } => ErrorClass::Unauthorized,
                ServiceError::NotFound { .. } => ErrorClass::NotFound,
                ServiceError::Transient { .. }
                | ServiceError::Network(_)
                | ServiceError::Malformed(_) => ErrorClass::Transient,
                ServiceError::Rejected { .. } => ErrorClass::Rejected,
            },
            PipelineError::Invariant(_) | PipelineError::Config(_) => ErrorClass::Invariant,
            // The first call is still running; trying again once it settles is fine.
            PipelineError::AdvanceInFlight(_) => ErrorClass::Transient,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.class() == ErrorClass::Transient
    }

    /// Whether the presentation layer should send the user to sign in.
    pub fn needs_sign_in(&self) -> bool {
        matches!(
            self.class(),
            ErrorClass::Unauthenticated | ErrorClass::Unauthorized
        )
    }

    /// Short, classed copy for the user. Never the raw transport error.
    pub fn user_message(&self) -> String {
        match self.class() {
            ErrorClass::Unauthenticated | ErrorClass::Unauthorized => {
                "Your session has ended. Please sign in again.".to_string()
            }
            ErrorClass::NotFound => "We couldn't find that record.".to_string(),
            ErrorClass::Transient => match self {
                PipelineError::AdvanceInFlight(_) => {
                    "This candidate is already being moved. Please wait.".to_string()
                }
                _ => "Something went wrong. Please try again.".to_string(),
            },
            ErrorClass::Invariant => match self {
                PipelineError::Invariant(msg) | PipelineError::Config(msg) => msg.clone(),
                _ => "That change isn't allowed.".to_string(),
            },
            ErrorClass::Rejected => "The request was rejected by the server.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classes_follow_service_errors() {
        let err: PipelineError = ServiceError::Unauthenticated.into();
        assert_eq!(err.class(), ErrorClass::Unauthenticated);
        assert!(err.needs_sign_in());
        assert!(!err.is_retryable());

        let err: PipelineError = ServiceError::Unauthorized {
            status: 401,
            message: "expired".into(),
        }
        .into();
        assert_eq!(err.class(), ErrorClass::Unauthorized);
        assert!(err.needs_sign_in());

        let err: PipelineError = ServiceError::NotFound {
            message: "gone".into(),
        }
        .into();
        assert_eq!(err.class(), ErrorClass::NotFound);
        assert!(!err.is_retryable());

        let err: PipelineError = ServiceError::Transient {
            status: 503,
            message: "down".into(),
        }
        .into();
        assert!(err.is_retryable());
    }

    #[test]
    fn auth_classes_share_copy() {
        let a: PipelineError = ServiceError::Unauthenticated.into();
        let b: PipelineError = ServiceError::Unauthorized {
            status: 403,
            message: String::new(),
        }
        .into();
        assert_eq!(a.user_message(), b.user_message());
        assert_ne!(a.class(), b.class());
    }

    #[test]
    fn invariant_message_is_passed_through() {
        let err = PipelineError::Invariant("Offer Stage cannot be removed".into());
        assert_eq!(err.user_message(), "Offer Stage cannot be removed");
        assert_eq!(err.to_string(), "Invariant violation: Offer Stage cannot be removed");
    }

    #[test]
    fn in_flight_is_retryable() {
        let err = PipelineError::AdvanceInFlight(CandidateId::from("c-1"));
        assert!(err.is_retryable());
        assert_eq!(
            err.to_string(),
            "An advance for candidate c-1 is already in flight"
        );
    }

    #[test]
    fn class_display() {
        assert_eq!(ErrorClass::NotFound.to_string(), "not_found");
        assert_eq!(ErrorClass::Transient.to_string(), "transient");
    }
}
