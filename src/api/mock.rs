use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::client::HealthApi;
use super::error::ApiError;
use super::types::LoginResponse;
use crate::models::{AuthToken, Credentials, MedicalRecord, UserProfile};
use crate::tab_storage::{TabStorage, AUTH_TOKEN_KEY};

struct MockAccount {
    password: String,
    login: LoginResponse,
    /// What `/auth/me` returns; defaults to the login user.
    canonical: Option<UserProfile>,
    assigned: Vec<MedicalRecord>,
}

/// In-memory backend for tests, with accounts keyed by identifier.
///
/// Like the HTTP client, it resolves the current user from the token in the
/// tab's storage, so it observes exactly what the session layer persisted.
pub struct MockHealthApi {
    storage: Arc<dyn TabStorage>,
    accounts: HashMap<String, MockAccount>,
    login_delay: Option<Duration>,
    query_delay: Option<Duration>,
    login_failure: Mutex<Option<ApiError>>,
    profile_failure: Mutex<Option<ApiError>>,
    login_calls: AtomicUsize,
    profile_calls: AtomicUsize,
    assigned_calls: AtomicUsize,
}

impl MockHealthApi {
    pub fn new(storage: Arc<dyn TabStorage>) -> Self {
        Self {
            storage,
            accounts: HashMap::new(),
            login_delay: None,
            query_delay: None,
            login_failure: Mutex::new(None),
            profile_failure: Mutex::new(None),
            login_calls: AtomicUsize::new(0),
            profile_calls: AtomicUsize::new(0),
            assigned_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_account(
        mut self,
        identifier: &str,
        password: &str,
        token: &str,
        user: UserProfile,
    ) -> Self {
        self.accounts.insert(
            identifier.to_string(),
            MockAccount {
                password: password.to_string(),
                login: LoginResponse {
                    token: AuthToken::new(token),
                    user,
                },
                canonical: None,
                assigned: Vec::new(),
            },
        );
        self
    }

    /// Make `/auth/me` return a richer record than the login response.
    pub fn with_canonical_profile(mut self, identifier: &str, profile: UserProfile) -> Self {
        if let Some(account) = self.accounts.get_mut(identifier) {
            account.canonical = Some(profile);
        }
        self
    }

    pub fn with_assigned_requests(mut self, identifier: &str, records: Vec<MedicalRecord>) -> Self {
        if let Some(account) = self.accounts.get_mut(identifier) {
            account.assigned = records;
        }
        self
    }

    pub fn with_login_delay(mut self, delay: Duration) -> Self {
        self.login_delay = Some(delay);
        self
    }

    /// Delay authenticated calls after the caller's account is resolved.
    pub fn with_query_delay(mut self, delay: Duration) -> Self {
        self.query_delay = Some(delay);
        self
    }

    /// Every subsequent login fails with `error` until cleared.
    pub fn set_login_failure(&self, error: Option<ApiError>) {
        if let Ok(mut slot) = self.login_failure.lock() {
            *slot = error;
        }
    }

    /// Every subsequent authenticated call fails with `error` until cleared.
    pub fn set_profile_failure(&self, error: Option<ApiError>) {
        if let Ok(mut slot) = self.profile_failure.lock() {
            *slot = error;
        }
    }

    pub fn login_calls(&self) -> usize {
        self.login_calls.load(Ordering::SeqCst)
    }

    pub fn profile_calls(&self) -> usize {
        self.profile_calls.load(Ordering::SeqCst)
    }

    pub fn assigned_calls(&self) -> usize {
        self.assigned_calls.load(Ordering::SeqCst)
    }

    async fn query_pause(&self) {
        if let Some(delay) = self.query_delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn current_account(&self) -> Result<&MockAccount, ApiError> {
        if let Some(err) = self.profile_failure.lock().ok().and_then(|s| s.clone()) {
            return Err(err);
        }
        let token = self
            .storage
            .get(AUTH_TOKEN_KEY)
            .ok()
            .flatten()
            .ok_or(ApiError::Unauthorized)?;
        self.accounts
            .values()
            .find(|a| a.login.token.expose() == token)
            .ok_or(ApiError::Rejected {
                status: 401,
                message: Some("Token expired".into()),
            })
    }
}

#[async_trait]
impl HealthApi for MockHealthApi {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.login_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = self.login_failure.lock().ok().and_then(|s| s.clone()) {
            return Err(err);
        }

        match self.accounts.get(&credentials.identifier) {
            Some(account)
                if account.password == credentials.password
                    && account.login.user.role == credentials.role =>
            {
                Ok(account.login.clone())
            }
            _ => Err(ApiError::Rejected {
                status: 401,
                message: Some("Invalid email or password".into()),
            }),
        }
    }

    async fn get_profile(&self) -> Result<UserProfile, ApiError> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        let account = self.current_account()?;
        let profile = account
            .canonical
            .clone()
            .unwrap_or_else(|| account.login.user.clone());
        self.query_pause().await;
        Ok(profile)
    }

    async fn get_assigned_requests(&self) -> Result<Vec<MedicalRecord>, ApiError> {
        self.assigned_calls.fetch_add(1, Ordering::SeqCst);
        let records = self.current_account()?.assigned.clone();
        self.query_pause().await;
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::tab_storage::MemoryTabStorage;

    fn mock(storage: Arc<MemoryTabStorage>) -> MockHealthApi {
        MockHealthApi::new(storage).with_account(
            "nour@example.com",
            "pw",
            "tok-nour",
            UserProfile::new("p-1", Role::Patient),
        )
    }

    #[tokio::test]
    async fn login_checks_password_and_role() {
        let api = mock(Arc::new(MemoryTabStorage::new()));

        let ok = api
            .login(&Credentials::new(Role::Patient, "nour@example.com", "pw"))
            .await
            .unwrap();
        assert_eq!(ok.token.expose(), "tok-nour");

        let wrong_pw = api
            .login(&Credentials::new(Role::Patient, "nour@example.com", "nope"))
            .await;
        assert!(wrong_pw.is_err());

        let wrong_role = api
            .login(&Credentials::new(Role::Doctor, "nour@example.com", "pw"))
            .await;
        assert!(wrong_role.is_err());
        assert_eq!(api.login_calls(), 3);
    }

    #[tokio::test]
    async fn profile_follows_stored_token() {
        let storage = Arc::new(MemoryTabStorage::new());
        let api = mock(storage.clone());

        assert_eq!(api.get_profile().await.unwrap_err(), ApiError::Unauthorized);

        storage.set(AUTH_TOKEN_KEY, "tok-nour").unwrap();
        assert_eq!(api.get_profile().await.unwrap().id, "p-1");

        storage.set(AUTH_TOKEN_KEY, "tok-unknown").unwrap();
        assert!(api.get_profile().await.unwrap_err().is_auth_failure());
    }

    #[tokio::test]
    async fn injected_failures_apply_until_cleared() {
        let storage = Arc::new(MemoryTabStorage::new());
        storage.set(AUTH_TOKEN_KEY, "tok-nour").unwrap();
        let api = mock(storage);

        api.set_profile_failure(Some(ApiError::Transport("down".into())));
        assert!(matches!(api.get_profile().await, Err(ApiError::Transport(_))));

        api.set_profile_failure(None);
        assert!(api.get_profile().await.is_ok());
        assert_eq!(api.profile_calls(), 2);
    }
}
