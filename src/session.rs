//! Explicit session context handed to the service client.
//!
//! Credentials are injected here by the host application; nothing in this
//! crate reads tokens or cached user state from ambient globals.

use std::fmt;

#[derive(Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    auth_token: Option<String>,
    staff_id: Option<String>,
}

impl SessionContext {
    /// Unauthenticated session (local development, tests)
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn with_staff_id(mut self, staff_id: impl Into<String>) -> Self {
        self.staff_id = Some(staff_id.into());
        self
    }

    pub fn auth_token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }

    pub fn staff_id(&self) -> Option<&str> {
        self.staff_id.as_deref()
    }
}

// Keep the token out of logs.
impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .field("staff_id", &self.staff_id)
            .finish()
    }
}
