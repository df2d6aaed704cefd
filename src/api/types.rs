//! Wire types for the health backend.

use serde::{Deserialize, Serialize};

use crate::models::{AuthToken, UserProfile};

/// Successful `POST /auth/login` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: AuthToken,
    pub user: UserProfile,
}
