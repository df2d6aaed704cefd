use async_trait::async_trait;

use super::error::ApiError;
use super::types::LoginResponse;
use crate::models::{Credentials, MedicalRecord, UserProfile};

/// Backend operations the session layer consumes.
///
/// Requests after login authenticate with whatever token the tab currently
/// has stored; implementations never cache identities of their own.
#[async_trait]
pub trait HealthApi: Send + Sync {
    /// Exchange credentials for a token and the signed-in user.
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError>;

    /// Canonical "current user" record for the stored token.
    async fn get_profile(&self) -> Result<UserProfile, ApiError>;

    /// Requests assigned to the signed-in provider.
    async fn get_assigned_requests(&self) -> Result<Vec<MedicalRecord>, ApiError>;
}
