//! Authenticated user identity.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`UserId`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum IdentityError {
    /// The input string is empty or whitespace-only.
    #[error("user id cannot be empty")]
    Empty,
}

/// An opaque authenticated user id.
///
/// Supplied by the authentication collaborator on sign-in; this subsystem
/// never mints one itself. The id scopes all favorites storage: every
/// namespace key is derived from it.
///
/// ## Examples
///
/// ```
/// use bloom_core::UserId;
///
/// assert!(UserId::parse("u_8f2c").is_ok());
/// assert!(UserId::parse("   ").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Parse a `UserId` from a string.
    ///
    /// Surrounding whitespace is trimmed; the stored id is the trimmed form.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::Empty`] if the input is empty after trimming.
    pub fn parse(s: &str) -> Result<Self, IdentityError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(IdentityError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the user id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `UserId` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for UserId {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
