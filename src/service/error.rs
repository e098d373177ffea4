//! Errors raised while talking to the remote hiring-data service.
//!
//! [`ServiceError`] keeps the status code and body of every rejected call so
//! that callers can classify it without re-reading the response. The HTTP
//! status mapping lives in [`ServiceError::from_status`].

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// No bearer credential is available; the request was never sent.
    #[error("not signed in")]
    Unauthenticated,

    /// The service rejected the credential (expired or revoked session).
    #[error("credential rejected (status {status}): {message}")]
    Unauthorized { status: u16, message: String },

    /// The candidate, job or workflow does not exist.
    #[error("not found: {message}")]
    NotFound { message: String },

    /// The service failed or is overloaded; the call may be retried.
    #[error("service unavailable (status {status}): {message}")]
    Transient { status: u16, message: String },

    /// The service refused the request as invalid.
    #[error("request rejected (status {status}): {message}")]
    Rejected { status: u16, message: String },

    /// Transport-level failure (DNS, connection refused, timeout).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The response body did not have the expected shape.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl ServiceError {
    /// Map a non-success HTTP status and its body to an error.
    pub fn from_status(status: StatusCode, message: String) -> Self {
        let code = status.as_u16();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ServiceError::Unauthorized {
                status: code,
                message,
            },
            StatusCode::NOT_FOUND => ServiceError::NotFound { message },
            StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
                ServiceError::Transient {
                    status: code,
                    message,
                }
            }
            s if s.is_server_error() => ServiceError::Transient {
                status: code,
                message,
            },
            _ => ServiceError::Rejected {
                status: code,
                message,
            },
        }
    }

    /// True for both a missing and a rejected credential.
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            ServiceError::Unauthenticated | ServiceError::Unauthorized { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert!(matches!(
            ServiceError::from_status(StatusCode::UNAUTHORIZED, "expired".into()),
            ServiceError::Unauthorized { status: 401, .. }
        ));
        assert!(matches!(
            ServiceError::from_status(StatusCode::FORBIDDEN, "nope".into()),
            ServiceError::Unauthorized { status: 403, .. }
        ));
        assert!(matches!(
            ServiceError::from_status(StatusCode::NOT_FOUND, "no candidate".into()),
            ServiceError::NotFound { .. }
        ));
        assert!(matches!(
            ServiceError::from_status(StatusCode::BAD_GATEWAY, "down".into()),
            ServiceError::Transient { status: 502, .. }
        ));
        assert!(matches!(
            ServiceError::from_status(StatusCode::TOO_MANY_REQUESTS, "slow down".into()),
            ServiceError::Transient { status: 429, .. }
        ));
        assert!(matches!(
            ServiceError::from_status(StatusCode::UNPROCESSABLE_ENTITY, "bad body".into()),
            ServiceError::Rejected { status: 422, .. }
        ));
    }

    #[test]
    fn display_messages() {
        let err = ServiceError::NotFound {
            message: "candidate c-9".into(),
        };
        assert_eq!(err.to_string(), "not found: candidate c-9");
        assert_eq!(ServiceError::Unauthenticated.to_string(), "not signed in");
    }

    #[test]
    fn auth_errors() {
        assert!(ServiceError::Unauthenticated.is_auth());
        assert!(
            ServiceError::Unauthorized {
                status: 401,
                message: String::new()
            }
            .is_auth()
        );
        assert!(!ServiceError::Malformed("x".into()).is_auth());
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ServiceError>();
    }
}
