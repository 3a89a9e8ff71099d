//! Result of a reauthentication attempt.

use std::fmt;

/// What the authentication collaborator reported after a refresh.
#[derive(Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A fresh bearer credential was obtained.
    Renewed {
        /// Access token to replay queued requests with.
        credential: String,
    },
    /// The authentication service refused to issue a new credential.
    Denied,
}

impl RefreshOutcome {
    /// Convenience constructor for [`RefreshOutcome::Renewed`].
    pub fn renewed(credential: impl Into<String>) -> Self {
        Self::Renewed { credential: credential.into() }
    }

    /// `true` for [`RefreshOutcome::Renewed`].
    pub fn is_renewed(&self) -> bool {
        matches!(self, Self::Renewed { .. })
    }
}

// Credentials never reach logs through `{:?}`.
impl fmt::Debug for RefreshOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Renewed { .. } => f.write_str("Renewed { credential: <redacted> }"),
            Self::Denied => f.write_str("Denied"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_redacts_credential() {
        let outcome = RefreshOutcome::renewed("secret-token");
        let rendered = format!("{outcome:?}");
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("redacted"));
        assert!(outcome.is_renewed());
        assert!(!RefreshOutcome::Denied.is_renewed());
    }
}
