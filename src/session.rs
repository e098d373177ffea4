//! Explicit session handed to the hiring-service client.
//!
//! The credential is issued by the identity provider and is never read from
//! ambient state; a [`Session`] without one refuses to authorize requests.

use std::fmt;

use crate::service::ServiceError;

#[derive(Clone, Default)]
pub struct Session {
    token: Option<String>,
}

impl Session {
    pub fn with_token(token: impl Into<String>) -> Self {
        let token = token.into();
        Self {
            token: (!token.trim().is_empty()).then_some(token),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_signed_in(&self) -> bool {
        self.token.is_some()
    }

    /// The bearer credential, or `Unauthenticated` when there is none.
    pub fn bearer(&self) -> Result<&str, ServiceError> {
        self.token.as_deref().ok_or(ServiceError::Unauthenticated)
    }

    pub fn sign_out(&mut self) {
        self.token = None;
    }
}

// Keep the token out of logs.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("signed_in", &self.is_signed_in())
            .finish()
    }
}
