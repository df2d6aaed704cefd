use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::enums::Role;
use super::profile::UserProfile;

// ═══════════════════════════════════════════════════════════
// AuthToken
// ═══════════════════════════════════════════════════════════

/// Bearer token issued at login. Zeroed on drop, never printed.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(transparent)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw token, for the storage layer and the `Authorization` header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(<redacted>)")
    }
}

// ═══════════════════════════════════════════════════════════
// Credentials
// ═══════════════════════════════════════════════════════════

/// Sign-in form contents. The password is zeroed when dropped.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub role: Role,
    pub identifier: String,
    pub password: String,
}

impl Credentials {
    pub fn new(role: Role, identifier: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            role,
            identifier: identifier.into(),
            password: password.into(),
        }
    }

    /// Identifier must be non-blank and password non-empty.
    /// Everything else about their shape is the backend's call.
    pub fn is_complete(&self) -> bool {
        !self.identifier.trim().is_empty() && !self.password.is_empty()
    }
}

impl Drop for Credentials {
    fn drop(&mut self) {
        self.password.zeroize();
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("role", &self.role)
            .field("identifier", &self.identifier)
            .field("password", &"<redacted>")
            .finish()
    }
}

// ═══════════════════════════════════════════════════════════
// Session
// ═══════════════════════════════════════════════════════════

/// An authenticated tab: the stored token plus the profile it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: AuthToken,
    pub user: UserProfile,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_debug_is_redacted() {
        let token = AuthToken::new("eyJhbGciOi.secret");
        let printed = format!("{token:?}");
        assert!(!printed.contains("secret"));
        assert_eq!(token.expose(), "eyJhbGciOi.secret");
    }

    #[test]
    fn token_serializes_as_plain_string() {
        let token: AuthToken = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(token.expose(), "abc");
        assert_eq!(serde_json::to_string(&token).unwrap(), "\"abc\"");
    }

    #[test]
    fn credentials_debug_hides_password() {
        let creds = Credentials::new(Role::Lab, "lab@clinic.eg", "hunter2");
        let printed = format!("{creds:?}");
        assert!(printed.contains("lab@clinic.eg"));
        assert!(!printed.contains("hunter2"));
    }

    #[test]
    fn blank_credentials_are_incomplete() {
        assert!(Credentials::new(Role::Patient, "a@b.c", "pw").is_complete());
        assert!(!Credentials::new(Role::Patient, "", "pw").is_complete());
        assert!(!Credentials::new(Role::Patient, "   ", "pw").is_complete());
        assert!(!Credentials::new(Role::Patient, "a@b.c", "").is_complete());
        // Whitespace passwords are the backend's to judge
        assert!(Credentials::new(Role::Patient, "a@b.c", "   ").is_complete());
    }
}
